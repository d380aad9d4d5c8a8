pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::library_service::LibraryService;
use crate::services::photo_service::PhotoService;
use crate::services::storage::LocalStorage;
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::libraries::create_library,
        api::handlers::libraries::list_libraries,
        api::handlers::libraries::get_library,
        api::handlers::libraries::update_library,
        api::handlers::libraries::delete_library,
        api::handlers::libraries::get_library_stats,
        api::handlers::albums::create_album,
        api::handlers::albums::list_albums,
        api::handlers::albums::get_album,
        api::handlers::albums::update_album,
        api::handlers::albums::delete_album,
        api::handlers::albums::add_photo_to_album,
        api::handlers::albums::remove_photo_from_album,
        api::handlers::albums::update_photo_order,
        api::handlers::photos::upload_photo,
        api::handlers::photos::list_photos,
        api::handlers::photos::get_photo,
        api::handlers::photos::update_photo,
        api::handlers::photos::delete_photo,
        api::handlers::photos::serve_photo_file,
        api::handlers::photos::copy_photo,
        api::handlers::tags::create_tag,
        api::handlers::tags::list_tags,
        api::handlers::tags::get_tag,
        api::handlers::tags::update_tag,
        api::handlers::tags::delete_tag,
        api::handlers::tags::add_tag_to_photo,
        api::handlers::tags::remove_tag_from_photo,
        api::handlers::tags::get_tag_stats,
    ),
    components(
        schemas(
            api::handlers::MessageResponse,
            api::handlers::health::HealthResponse,
            api::handlers::libraries::CreateLibraryRequest,
            api::handlers::libraries::UpdateLibraryRequest,
            api::handlers::libraries::LibraryResponse,
            api::handlers::albums::CreateAlbumRequest,
            api::handlers::albums::UpdateAlbumRequest,
            api::handlers::albums::AlbumResponse,
            api::handlers::albums::AddPhotoRequest,
            api::handlers::albums::PhotoOrderRequest,
            api::handlers::photos::PhotoResponse,
            api::handlers::photos::PhotoListResponse,
            api::handlers::photos::Pagination,
            api::handlers::photos::UpdatePhotoRequest,
            api::handlers::photos::CopyPhotoRequest,
            api::handlers::tags::CreateTagRequest,
            api::handlers::tags::UpdateTagRequest,
            api::handlers::tags::TagResponse,
            api::handlers::tags::TagPhotoRequest,
            api::handlers::tags::TagStats,
            api::handlers::tags::TagLibraryCount,
            services::library_service::LibraryStats,
            entities::libraries::Model,
            entities::albums::Model,
            entities::photos::Model,
            entities::tags::Model,
            entities::album_photos::Model,
            entities::photo_tags::Model,
        )
    ),
    tags(
        (name = "libraries", description = "Library management"),
        (name = "albums", description = "Album management"),
        (name = "photos", description = "Photo upload, metadata, and files"),
        (name = "tags", description = "Tag management"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<LocalStorage>,
    pub libraries: Arc<LibraryService>,
    pub photos: Arc<PhotoService>,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let storage = Arc::new(LocalStorage::new());
        let libraries = Arc::new(LibraryService::new(db.clone(), storage.clone()));
        let photos = Arc::new(PhotoService::new(
            db.clone(),
            storage.clone(),
            config.clone(),
        ));

        Self {
            db,
            storage,
            libraries,
            photos,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/libraries",
            post(api::handlers::libraries::create_library)
                .get(api::handlers::libraries::list_libraries),
        )
        .route(
            "/libraries/:id",
            get(api::handlers::libraries::get_library)
                .put(api::handlers::libraries::update_library)
                .delete(api::handlers::libraries::delete_library),
        )
        .route(
            "/libraries/:id/stats",
            get(api::handlers::libraries::get_library_stats),
        )
        .route(
            "/albums",
            post(api::handlers::albums::create_album).get(api::handlers::albums::list_albums),
        )
        .route(
            "/albums/:id",
            get(api::handlers::albums::get_album)
                .put(api::handlers::albums::update_album)
                .delete(api::handlers::albums::delete_album),
        )
        .route(
            "/albums/:id/photos",
            post(api::handlers::albums::add_photo_to_album),
        )
        .route(
            "/albums/:id/photos/:photo_id",
            axum::routing::delete(api::handlers::albums::remove_photo_from_album),
        )
        .route(
            "/albums/:id/photos/:photo_id/order",
            axum::routing::put(api::handlers::albums::update_photo_order),
        )
        .route(
            "/photos/upload",
            post(api::handlers::photos::upload_photo).layer(
                axum::extract::DefaultBodyLimit::max(
                    state.config.max_file_size + 10 * 1024 * 1024, // multipart overhead
                ),
            ),
        )
        .route("/photos", get(api::handlers::photos::list_photos))
        .route(
            "/photos/:id",
            get(api::handlers::photos::get_photo)
                .put(api::handlers::photos::update_photo)
                .delete(api::handlers::photos::delete_photo),
        )
        .route(
            "/photos/:id/file",
            get(api::handlers::photos::serve_photo_file),
        )
        .route("/photos/:id/copy", post(api::handlers::photos::copy_photo))
        .route(
            "/tags",
            post(api::handlers::tags::create_tag).get(api::handlers::tags::list_tags),
        )
        .route(
            "/tags/:id",
            get(api::handlers::tags::get_tag)
                .put(api::handlers::tags::update_tag)
                .delete(api::handlers::tags::delete_tag),
        )
        .route(
            "/tags/:id/photos",
            post(api::handlers::tags::add_tag_to_photo),
        )
        .route(
            "/tags/:id/photos/:photo_id",
            axum::routing::delete(api::handlers::tags::remove_tag_from_photo),
        )
        .route("/tags/:id/stats", get(api::handlers::tags::get_tag_stats));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .nest("/api/v1", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
