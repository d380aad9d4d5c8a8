use crate::api::error::AppError;
use crate::api::handlers::photos::PhotoResponse;
use crate::api::handlers::{MessageResponse, parse_id};
use crate::entities::{prelude::*, *};
use crate::utils::validation::{MAX_NAME_LEN, validate_description, validate_name};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateAlbumRequest {
    pub name: String,
    pub description: Option<String>,
    pub library_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAlbumRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AlbumListQuery {
    pub library_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AlbumQuery {
    pub include_photos: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddPhotoRequest {
    pub photo_id: String,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct PhotoOrderRequest {
    #[serde(rename = "order")]
    pub sort_order: i32,
}

#[derive(Serialize, ToSchema)]
pub struct AlbumResponse {
    #[serde(flatten)]
    pub album: albums::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<PhotoResponse>>,
}

#[utoipa::path(
    post,
    path = "/api/v1/albums",
    request_body = CreateAlbumRequest,
    responses(
        (status = 201, description = "Album created", body = albums::Model),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Library not found")
    ),
    tag = "albums"
)]
pub async fn create_album(
    State(state): State<crate::AppState>,
    Json(req): Json<CreateAlbumRequest>,
) -> Result<(StatusCode, Json<albums::Model>), AppError> {
    validate_name("name", &req.name, MAX_NAME_LEN)?;
    let description = req.description.unwrap_or_default();
    validate_description(&description)?;
    let library_id = parse_id(&req.library_id, "library")?;

    Libraries::find_by_id(library_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

    let now = Utc::now();
    let album = albums::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        description: Set(description),
        library_id: Set(library_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(album)))
}

#[utoipa::path(
    get,
    path = "/api/v1/albums",
    params(
        ("library_id" = Option<String>, Query, description = "Restrict to one library")
    ),
    responses(
        (status = 200, description = "Albums", body = [albums::Model])
    ),
    tag = "albums"
)]
pub async fn list_albums(
    State(state): State<crate::AppState>,
    Query(query): Query<AlbumListQuery>,
) -> Result<Json<Vec<albums::Model>>, AppError> {
    let mut select = Albums::find().order_by_asc(albums::Column::CreatedAt);
    if let Some(ref raw) = query.library_id {
        let library_id = parse_id(raw, "library")?;
        select = select.filter(albums::Column::LibraryId.eq(library_id));
    }

    Ok(Json(select.all(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 200, description = "Album", body = AlbumResponse),
        (status = 404, description = "Album not found")
    ),
    tag = "albums"
)]
pub async fn get_album(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Query(query): Query<AlbumQuery>,
) -> Result<Json<AlbumResponse>, AppError> {
    let id = parse_id(&id, "album")?;
    let album = Albums::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;

    let photos = if query.include_photos.unwrap_or(false) {
        // Album ordering, then each photo with its tags.
        let members = album
            .find_related(Photos)
            .order_by_asc(album_photos::Column::SortOrder)
            .all(&state.db)
            .await?;
        let mut out = Vec::with_capacity(members.len());
        for photo in members {
            let tags = photo.find_related(Tags).all(&state.db).await?;
            out.push(PhotoResponse {
                photo,
                library: None,
                tags: Some(tags),
                albums: None,
            });
        }
        Some(out)
    } else {
        None
    };

    Ok(Json(AlbumResponse { album, photos }))
}

#[utoipa::path(
    put,
    path = "/api/v1/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    request_body = UpdateAlbumRequest,
    responses(
        (status = 200, description = "Updated album", body = albums::Model),
        (status = 404, description = "Album not found")
    ),
    tag = "albums"
)]
pub async fn update_album(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAlbumRequest>,
) -> Result<Json<albums::Model>, AppError> {
    let id = parse_id(&id, "album")?;
    let album = Albums::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;

    if let Some(ref name) = req.name {
        validate_name("name", name, MAX_NAME_LEN)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }

    let mut active: albums::ActiveModel = album.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/albums/{id}",
    params(("id" = String, Path, description = "Album ID")),
    responses(
        (status = 200, description = "Album deleted", body = MessageResponse),
        (status = 404, description = "Album not found")
    ),
    tag = "albums"
)]
pub async fn delete_album(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "album")?;
    Albums::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;

    // Join rows first, then the album; photos themselves are untouched.
    let txn = state.db.begin().await?;
    AlbumPhotos::delete_many()
        .filter(album_photos::Column::AlbumId.eq(id))
        .exec(&txn)
        .await?;
    Albums::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(MessageResponse::new("Album deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/albums/{id}/photos",
    params(("id" = String, Path, description = "Album ID")),
    request_body = AddPhotoRequest,
    responses(
        (status = 200, description = "Photo added", body = MessageResponse),
        (status = 400, description = "Photo and album belong to different libraries"),
        (status = 404, description = "Album or photo not found"),
        (status = 409, description = "Photo already in the album")
    ),
    tag = "albums"
)]
pub async fn add_photo_to_album(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddPhotoRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let album_id = parse_id(&id, "album")?;
    let photo_id = parse_id(&req.photo_id, "photo")?;

    let album = Albums::find_by_id(album_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))?;
    let photo = Photos::find_by_id(photo_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    if photo.library_id != album.library_id {
        return Err(AppError::CrossScope(
            "Photo and album must belong to the same library".to_string(),
        ));
    }

    if AlbumPhotos::find_by_id((album_id, photo_id))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Photo is already in this album".to_string(),
        ));
    }

    album_photos::ActiveModel {
        album_id: Set(album_id),
        photo_id: Set(photo_id),
        sort_order: Set(req.sort_order.unwrap_or(0)),
    }
    .insert(&state.db)
    .await?;

    Ok(Json(MessageResponse::new(
        "Photo added to album successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/albums/{id}/photos/{photo_id}",
    params(
        ("id" = String, Path, description = "Album ID"),
        ("photo_id" = String, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Photo removed", body = MessageResponse),
        (status = 404, description = "Pair not found")
    ),
    tag = "albums"
)]
pub async fn remove_photo_from_album(
    State(state): State<crate::AppState>,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let album_id = parse_id(&id, "album")?;
    let photo_id = parse_id(&photo_id, "photo")?;

    let membership = AlbumPhotos::find_by_id((album_id, photo_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found in this album".to_string()))?;

    membership.delete(&state.db).await?;

    Ok(Json(MessageResponse::new(
        "Photo removed from album successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/albums/{id}/photos/{photo_id}/order",
    params(
        ("id" = String, Path, description = "Album ID"),
        ("photo_id" = String, Path, description = "Photo ID")
    ),
    request_body = PhotoOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = MessageResponse),
        (status = 404, description = "Pair not found")
    ),
    tag = "albums"
)]
pub async fn update_photo_order(
    State(state): State<crate::AppState>,
    Path((id, photo_id)): Path<(String, String)>,
    Json(req): Json<PhotoOrderRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let album_id = parse_id(&id, "album")?;
    let photo_id = parse_id(&photo_id, "photo")?;

    let membership = AlbumPhotos::find_by_id((album_id, photo_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found in this album".to_string()))?;

    let mut active: album_photos::ActiveModel = membership.into();
    active.sort_order = Set(req.sort_order);
    active.update(&state.db).await?;

    Ok(Json(MessageResponse::new(
        "Photo order updated successfully",
    )))
}
