use crate::api::error::AppError;
use crate::api::handlers::{MessageResponse, parse_id};
use crate::entities::{prelude::*, *};
use crate::services::photo_service::NewUpload;
use crate::utils::validation::{parse_tag_list, validate_rating};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, ModelTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Serialize, ToSchema)]
pub struct PhotoResponse {
    #[serde(flatten)]
    pub photo: photos::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<libraries::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<tags::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub albums: Option<Vec<albums::Model>>,
}

#[derive(Serialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

#[derive(Serialize, ToSchema)]
pub struct PhotoListResponse {
    pub photos: Vec<PhotoResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
pub struct PhotoListQuery {
    pub library_id: Option<String>,
    pub rating: Option<i32>,
    pub tag: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub include_library: Option<bool>,
    pub include_tags: Option<bool>,
    pub include_albums: Option<bool>,
}

#[derive(Deserialize)]
pub struct PhotoQuery {
    pub include_library: Option<bool>,
    pub include_tags: Option<bool>,
    pub include_albums: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePhotoRequest {
    pub rating: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CopyPhotoRequest {
    pub library_id: String,
}

async fn build_photo_response(
    state: &crate::AppState,
    photo: photos::Model,
    include_library: bool,
    include_tags: bool,
    include_albums: bool,
) -> Result<PhotoResponse, AppError> {
    let library = if include_library {
        photo.find_related(Libraries).one(&state.db).await?
    } else {
        None
    };
    let tags = if include_tags {
        Some(photo.find_related(Tags).all(&state.db).await?)
    } else {
        None
    };
    let albums = if include_albums {
        Some(photo.find_related(Albums).all(&state.db).await?)
    } else {
        None
    };

    Ok(PhotoResponse {
        photo,
        library,
        tags,
        albums,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/photos/upload",
    request_body(content = Multipart, description = "Fields: library_id, photo (file), optional rating and comma-delimited tags"),
    responses(
        (status = 201, description = "Photo uploaded", body = photos::Model),
        (status = 400, description = "Missing field, bad type, oversize, or undecodable image"),
        (status = 404, description = "Library not found")
    ),
    tag = "photos"
)]
pub async fn upload_photo(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<photos::Model>), AppError> {
    let mut library_id: Option<String> = None;
    let mut rating: Option<i32> = None;
    let mut tag_names: Vec<String> = Vec::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "photo" => {
                let original_name = field.file_name().unwrap_or("photo").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((original_name, content_type, bytes.to_vec()));
            }
            "library_id" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    library_id = Some(text);
                }
            }
            "rating" => {
                let text = field.text().await.unwrap_or_default();
                // A non-numeric or out-of-range rating on upload is dropped,
                // not rejected.
                rating = text
                    .parse::<i32>()
                    .ok()
                    .filter(|r| validate_rating(*r).is_ok());
            }
            "tags" => {
                let text = field.text().await.unwrap_or_default();
                tag_names = parse_tag_list(&text);
            }
            _ => {}
        }
    }

    let library_id =
        library_id.ok_or_else(|| AppError::BadRequest("library_id is required".to_string()))?;
    let library_id = parse_id(&library_id, "library")?;
    let (original_name, content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("No photo file provided".to_string()))?;

    let library = Libraries::find_by_id(library_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

    let photo = state
        .photos
        .upload(
            &library,
            NewUpload {
                original_name,
                content_type,
                bytes,
                rating,
                tag_names,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

#[utoipa::path(
    get,
    path = "/api/v1/photos",
    params(
        ("library_id" = Option<String>, Query, description = "Restrict to one library"),
        ("rating" = Option<i32>, Query, description = "Exact rating filter"),
        ("tag" = Option<String>, Query, description = "Only photos carrying this tag name"),
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size, capped at 100"),
        ("sort_by" = Option<String>, Query, description = "uploaded_at, created_at, rating, filename or file_size"),
        ("sort_order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Photo page", body = PhotoListResponse)
    ),
    tag = "photos"
)]
pub async fn list_photos(
    State(state): State<crate::AppState>,
    Query(query): Query<PhotoListQuery>,
) -> Result<Json<PhotoListResponse>, AppError> {
    let mut select = Photos::find();

    if let Some(ref raw) = query.library_id {
        let library_id = parse_id(raw, "library")?;
        select = select.filter(photos::Column::LibraryId.eq(library_id));
    }
    if let Some(rating) = query.rating {
        select = select.filter(photos::Column::Rating.eq(rating));
    }
    if let Some(ref tag) = query.tag {
        select = select
            .join(JoinType::InnerJoin, photos::Relation::PhotoTags.def())
            .join(JoinType::InnerJoin, photo_tags::Relation::Tags.def())
            .filter(tags::Column::Name.eq(tag));
    }

    // Unknown sort fields and orders silently fall back to the default.
    let sort_column = match query.sort_by.as_deref() {
        Some("created_at") => Some(photos::Column::CreatedAt),
        Some("rating") => Some(photos::Column::Rating),
        Some("filename") => Some(photos::Column::Filename),
        Some("file_size") => Some(photos::Column::FileSize),
        Some("uploaded_at") => Some(photos::Column::UploadedAt),
        _ => None,
    };
    let sort_order = match query.sort_order.as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    };
    select = match sort_column {
        Some(column) => select.order_by(column, sort_order),
        None => select.order_by_desc(photos::Column::UploadedAt),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let paginator = select.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let page_items = paginator.fetch_page(page - 1).await?;

    let include_library = query.include_library.unwrap_or(false);
    let include_tags = query.include_tags.unwrap_or(false);
    let include_albums = query.include_albums.unwrap_or(false);

    let mut photos_out = Vec::with_capacity(page_items.len());
    for photo in page_items {
        photos_out.push(
            build_photo_response(&state, photo, include_library, include_tags, include_albums)
                .await?,
        );
    }

    Ok(Json(PhotoListResponse {
        photos: photos_out,
        pagination: Pagination { page, limit, total },
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/photos/{id}",
    params(("id" = String, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo", body = PhotoResponse),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn get_photo(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Query(query): Query<PhotoQuery>,
) -> Result<Json<PhotoResponse>, AppError> {
    let id = parse_id(&id, "photo")?;
    let photo = Photos::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    Ok(Json(
        build_photo_response(
            &state,
            photo,
            query.include_library.unwrap_or(false),
            query.include_tags.unwrap_or(false),
            query.include_albums.unwrap_or(false),
        )
        .await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/photos/{id}",
    params(("id" = String, Path, description = "Photo ID")),
    request_body = UpdatePhotoRequest,
    responses(
        (status = 200, description = "Updated photo", body = photos::Model),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn update_photo(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePhotoRequest>,
) -> Result<Json<photos::Model>, AppError> {
    let id = parse_id(&id, "photo")?;
    let photo = Photos::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    // Unlike upload, an explicit bad rating here is rejected.
    if let Some(rating) = req.rating {
        validate_rating(rating)?;
    }

    let mut active: photos::ActiveModel = photo.into();
    if let Some(rating) = req.rating {
        active.rating = Set(Some(rating));
    }
    active.updated_at = Set(chrono::Utc::now());

    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/photos/{id}",
    params(("id" = String, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo deleted", body = MessageResponse),
        (status = 404, description = "Photo not found")
    ),
    tag = "photos"
)]
pub async fn delete_photo(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "photo")?;
    let photo = Photos::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    let warning = state.photos.delete(photo).await?;

    Ok(Json(MessageResponse::with_warning(
        "Photo deleted successfully",
        warning,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/photos/{id}/file",
    params(("id" = String, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 404, description = "Photo row or file not found")
    ),
    tag = "photos"
)]
pub async fn serve_photo_file(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "photo")?;
    let photo = Photos::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    let path = std::path::Path::new(&photo.file_path);
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("Photo file not found".to_string()));
        }
        Err(e) => {
            return Err(AppError::Io(format!(
                "Failed to open {}: {}",
                photo.file_path, e
            )));
        }
    };

    let content_disposition = inline_disposition(&photo.original_name);

    // Length comes from the transport framing the stream: the row's
    // file_size can disagree with what is on disk.
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, photo.mime_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[utoipa::path(
    post,
    path = "/api/v1/photos/{id}/copy",
    params(("id" = String, Path, description = "Source photo ID")),
    request_body = CopyPhotoRequest,
    responses(
        (status = 201, description = "Copied photo", body = photos::Model),
        (status = 404, description = "Photo, target library, or source file not found")
    ),
    tag = "photos"
)]
pub async fn copy_photo(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<CopyPhotoRequest>,
) -> Result<(StatusCode, Json<photos::Model>), AppError> {
    let id = parse_id(&id, "photo")?;
    let source = Photos::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    let target_id = parse_id(&req.library_id, "library")?;
    let target = Libraries::find_by_id(target_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Target library not found".to_string()))?;

    let copy = state.photos.copy(&source, &target).await?;

    Ok((StatusCode::CREATED, Json(copy)))
}

/// Inline disposition with an ASCII fallback name plus the RFC 5987 encoded
/// original, so non-ASCII filenames survive every client.
fn inline_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback = if ascii_filename.is_empty() {
        "photo"
    } else {
        &ascii_filename
    };

    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_disposition_ascii() {
        let d = inline_disposition("beach.jpg");
        assert!(d.starts_with("inline; filename=\"beach.jpg\""));
    }

    #[test]
    fn test_inline_disposition_sanitizes_quotes() {
        let d = inline_disposition("we\"ird.png");
        assert!(d.contains("filename=\"weird.png\""));
    }

    #[test]
    fn test_inline_disposition_non_ascii_fallback() {
        let d = inline_disposition("фото.jpg");
        assert!(d.contains("filename=\".jpg\"") || d.contains("filename=\"photo\""));
        assert!(d.contains("filename*=UTF-8''"));
    }
}
