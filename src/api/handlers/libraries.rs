use crate::api::error::AppError;
use crate::api::handlers::{MessageResponse, parse_id};
use crate::entities::{prelude::*, *};
use crate::services::library_service::{LibraryChanges, LibraryStats, NewLibrary};
use crate::utils::validation::{
    MAX_NAME_LEN, validate_description, validate_name, validate_storage_path,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLibraryRequest {
    pub name: String,
    pub description: Option<String>,
    pub storage_path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLibraryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub storage_path: Option<String>,
}

#[derive(Deserialize)]
pub struct LibraryQuery {
    pub include_albums: Option<bool>,
    pub include_photos: Option<bool>,
    pub include_counts: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct LibraryResponse {
    #[serde(flatten)]
    pub library: libraries::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub albums: Option<Vec<albums::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<photos::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_count: Option<u64>,
}

async fn build_library_response(
    state: &crate::AppState,
    library: libraries::Model,
    query: &LibraryQuery,
) -> Result<LibraryResponse, AppError> {
    let albums = if query.include_albums.unwrap_or(false) {
        Some(library.find_related(Albums).all(&state.db).await?)
    } else {
        None
    };
    let photos = if query.include_photos.unwrap_or(false) {
        Some(library.find_related(Photos).all(&state.db).await?)
    } else {
        None
    };
    let (photo_count, album_count) = if query.include_counts.unwrap_or(false) {
        let photo_count = Photos::find()
            .filter(photos::Column::LibraryId.eq(library.id))
            .count(&state.db)
            .await?;
        let album_count = Albums::find()
            .filter(albums::Column::LibraryId.eq(library.id))
            .count(&state.db)
            .await?;
        (Some(photo_count), Some(album_count))
    } else {
        (None, None)
    };

    Ok(LibraryResponse {
        library,
        albums,
        photos,
        photo_count,
        album_count,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/libraries",
    request_body = CreateLibraryRequest,
    responses(
        (status = 201, description = "Library created", body = libraries::Model),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Name or storage path already in use")
    ),
    tag = "libraries"
)]
pub async fn create_library(
    State(state): State<crate::AppState>,
    Json(req): Json<CreateLibraryRequest>,
) -> Result<(StatusCode, Json<libraries::Model>), AppError> {
    validate_name("name", &req.name, MAX_NAME_LEN)?;
    let description = req.description.unwrap_or_default();
    validate_description(&description)?;
    validate_storage_path(&req.storage_path)?;

    let library = state
        .libraries
        .create(NewLibrary {
            name: req.name,
            description,
            storage_path: req.storage_path,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(library)))
}

#[utoipa::path(
    get,
    path = "/api/v1/libraries",
    params(
        ("include_albums" = Option<bool>, Query, description = "Embed each library's albums"),
        ("include_photos" = Option<bool>, Query, description = "Embed each library's photos"),
        ("include_counts" = Option<bool>, Query, description = "Embed photo/album counts")
    ),
    responses(
        (status = 200, description = "All libraries", body = [LibraryResponse])
    ),
    tag = "libraries"
)]
pub async fn list_libraries(
    State(state): State<crate::AppState>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Vec<LibraryResponse>>, AppError> {
    let libraries = Libraries::find()
        .order_by_asc(libraries::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut out = Vec::with_capacity(libraries.len());
    for library in libraries {
        out.push(build_library_response(&state, library, &query).await?);
    }
    Ok(Json(out))
}

#[utoipa::path(
    get,
    path = "/api/v1/libraries/{id}",
    params(("id" = String, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library", body = LibraryResponse),
        (status = 404, description = "Library not found")
    ),
    tag = "libraries"
)]
pub async fn get_library(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<LibraryResponse>, AppError> {
    let id = parse_id(&id, "library")?;
    let library = Libraries::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

    Ok(Json(build_library_response(&state, library, &query).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/libraries/{id}",
    params(("id" = String, Path, description = "Library ID")),
    request_body = UpdateLibraryRequest,
    responses(
        (status = 200, description = "Updated library", body = libraries::Model),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Name or storage path already in use")
    ),
    tag = "libraries"
)]
pub async fn update_library(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLibraryRequest>,
) -> Result<Json<libraries::Model>, AppError> {
    let id = parse_id(&id, "library")?;

    if let Some(ref name) = req.name {
        validate_name("name", name, MAX_NAME_LEN)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    if let Some(ref path) = req.storage_path {
        validate_storage_path(path)?;
    }

    let library = state
        .libraries
        .update(
            id,
            LibraryChanges {
                name: req.name,
                description: req.description,
                storage_path: req.storage_path,
            },
        )
        .await?;

    Ok(Json(library))
}

#[utoipa::path(
    delete,
    path = "/api/v1/libraries/{id}",
    params(("id" = String, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library deleted", body = MessageResponse),
        (status = 404, description = "Library not found")
    ),
    tag = "libraries"
)]
pub async fn delete_library(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "library")?;
    let warning = state.libraries.delete(id).await?;

    Ok(Json(MessageResponse::with_warning(
        "Library deleted successfully",
        warning,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/libraries/{id}/stats",
    params(("id" = String, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library statistics", body = LibraryStats),
        (status = 404, description = "Library not found")
    ),
    tag = "libraries"
)]
pub async fn get_library_stats(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<LibraryStats>, AppError> {
    let id = parse_id(&id, "library")?;
    Ok(Json(state.libraries.stats(id).await?))
}
