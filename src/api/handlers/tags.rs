use crate::api::error::AppError;
use crate::api::handlers::{MessageResponse, parse_id};
use crate::entities::{prelude::*, *};
use crate::utils::validation::{MAX_TAG_NAME_LEN, validate_color, validate_name};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct TagListQuery {
    pub include_count: Option<bool>,
    pub include_photos: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct TagPhotoRequest {
    pub photo_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct TagResponse {
    #[serde(flatten)]
    pub tag: tags::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<photos::Model>>,
}

#[derive(Serialize, ToSchema)]
pub struct TagLibraryCount {
    pub library_id: Uuid,
    pub library_name: String,
    pub photo_count: u64,
}

#[derive(Serialize, ToSchema)]
pub struct TagStats {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub photo_count: u64,
    pub libraries: Vec<TagLibraryCount>,
}

#[utoipa::path(
    post,
    path = "/api/v1/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = tags::Model),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Tag name already in use")
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<crate::AppState>,
    Json(req): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<tags::Model>), AppError> {
    validate_name("name", &req.name, MAX_TAG_NAME_LEN)?;
    if let Some(ref color) = req.color {
        validate_color(color)?;
    }

    if Tags::find()
        .filter(tags::Column::Name.eq(&req.name))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Tag with this name already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let tag = tags::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        color: Set(req.color),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    params(
        ("include_count" = Option<bool>, Query, description = "Embed per-tag photo counts"),
        ("include_photos" = Option<bool>, Query, description = "Embed each tag's photos")
    ),
    responses(
        (status = 200, description = "All tags", body = [TagResponse])
    ),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<crate::AppState>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = Tags::find()
        .order_by_asc(tags::Column::Name)
        .all(&state.db)
        .await?;

    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        out.push(build_tag_response(&state, tag, &query).await?);
    }
    Ok(Json(out))
}

async fn build_tag_response(
    state: &crate::AppState,
    tag: tags::Model,
    query: &TagListQuery,
) -> Result<TagResponse, AppError> {
    let photo_count = if query.include_count.unwrap_or(false) {
        Some(
            PhotoTags::find()
                .filter(photo_tags::Column::TagId.eq(tag.id))
                .count(&state.db)
                .await?,
        )
    } else {
        None
    };
    let photos = if query.include_photos.unwrap_or(false) {
        Some(tag.find_related(Photos).all(&state.db).await?)
    } else {
        None
    };

    Ok(TagResponse {
        tag,
        photo_count,
        photos,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn get_tag(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<TagResponse>, AppError> {
    let id = parse_id(&id, "tag")?;
    let tag = Tags::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    Ok(Json(build_tag_response(&state, tag, &query).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/tags/{id}",
    params(("id" = String, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Updated tag", body = tags::Model),
        (status = 404, description = "Tag not found"),
        (status = 409, description = "Tag name already in use")
    ),
    tag = "tags"
)]
pub async fn update_tag(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<tags::Model>, AppError> {
    let id = parse_id(&id, "tag")?;
    let tag = Tags::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    if let Some(ref name) = req.name {
        validate_name("name", name, MAX_TAG_NAME_LEN)?;
        if Tags::find()
            .filter(tags::Column::Name.eq(name))
            .filter(tags::Column::Id.ne(id))
            .one(&state.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Tag with this name already exists".to_string(),
            ));
        }
    }
    if let Some(ref color) = req.color {
        validate_color(color)?;
    }

    let mut active: tags::ActiveModel = tag.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(color) = req.color {
        active.color = Set(Some(color));
    }
    active.updated_at = Set(Utc::now());

    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag deleted", body = MessageResponse),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn delete_tag(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, "tag")?;
    Tags::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    let txn = state.db.begin().await?;
    PhotoTags::delete_many()
        .filter(photo_tags::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    Tags::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(MessageResponse::new("Tag deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/tags/{id}/photos",
    params(("id" = String, Path, description = "Tag ID")),
    request_body = TagPhotoRequest,
    responses(
        (status = 200, description = "Tag applied", body = MessageResponse),
        (status = 404, description = "Tag or photo not found"),
        (status = 409, description = "Tag already applied")
    ),
    tag = "tags"
)]
pub async fn add_tag_to_photo(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<TagPhotoRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let tag_id = parse_id(&id, "tag")?;
    let photo_id = parse_id(&req.photo_id, "photo")?;

    Tags::find_by_id(tag_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;
    Photos::find_by_id(photo_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".to_string()))?;

    if PhotoTags::find_by_id((photo_id, tag_id))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Tag is already applied to this photo".to_string(),
        ));
    }

    photo_tags::ActiveModel {
        photo_id: Set(photo_id),
        tag_id: Set(tag_id),
    }
    .insert(&state.db)
    .await?;

    Ok(Json(MessageResponse::new("Tag added to photo successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}/photos/{photo_id}",
    params(
        ("id" = String, Path, description = "Tag ID"),
        ("photo_id" = String, Path, description = "Photo ID")
    ),
    responses(
        (status = 200, description = "Tag removed", body = MessageResponse),
        (status = 404, description = "Pair not found")
    ),
    tag = "tags"
)]
pub async fn remove_tag_from_photo(
    State(state): State<crate::AppState>,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let tag_id = parse_id(&id, "tag")?;
    let photo_id = parse_id(&photo_id, "photo")?;

    let link = PhotoTags::find_by_id((photo_id, tag_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found on this photo".to_string()))?;

    link.delete(&state.db).await?;

    Ok(Json(MessageResponse::new(
        "Tag removed from photo successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}/stats",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag statistics", body = TagStats),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn get_tag_stats(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<TagStats>, AppError> {
    let id = parse_id(&id, "tag")?;
    let tag = Tags::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    let photo_count = PhotoTags::find()
        .filter(photo_tags::Column::TagId.eq(id))
        .count(&state.db)
        .await?;

    // Per-library breakdown; libraries with no tagged photos are absent.
    let rows: Vec<(Uuid, String, i64)> = PhotoTags::find()
        .join(JoinType::InnerJoin, photo_tags::Relation::Photos.def())
        .join(JoinType::InnerJoin, photos::Relation::Libraries.def())
        .filter(photo_tags::Column::TagId.eq(id))
        .select_only()
        .column(libraries::Column::Id)
        .column(libraries::Column::Name)
        .column_as(photo_tags::Column::PhotoId.count(), "photo_count")
        .group_by(libraries::Column::Id)
        .group_by(libraries::Column::Name)
        .into_tuple()
        .all(&state.db)
        .await?;

    let libraries = rows
        .into_iter()
        .map(|(library_id, library_name, count)| TagLibraryCount {
            library_id,
            library_name,
            photo_count: count as u64,
        })
        .collect();

    Ok(Json(TagStats {
        tag_id: tag.id,
        tag_name: tag.name,
        photo_count,
        libraries,
    }))
}
