use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A photo belongs to exactly one library for its lifetime; moving between
/// libraries happens only through copy, which mints a new row and file.
/// `file_path` is the absolute on-disk location and is globally unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Photo)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    #[sea_orm(unique)]
    pub file_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub rating: Option<i32>,
    #[sea_orm(indexed)]
    pub library_id: Uuid,
    pub uploaded_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::libraries::Entity",
        from = "Column::LibraryId",
        to = "super::libraries::Column::Id"
    )]
    Libraries,
    #[sea_orm(has_many = "super::photo_tags::Entity")]
    PhotoTags,
    #[sea_orm(has_many = "super::album_photos::Entity")]
    AlbumPhotos,
}

impl Related<super::libraries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Libraries.def()
    }
}

impl Related<super::photo_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhotoTags.def()
    }
}

impl Related<super::album_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumPhotos.def()
    }
}

impl Related<super::albums::Entity> for Entity {
    fn to() -> RelationDef {
        super::album_photos::Relation::Albums.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::album_photos::Relation::Photos.def().rev())
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::photo_tags::Relation::Tags.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::photo_tags::Relation::Photos.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
