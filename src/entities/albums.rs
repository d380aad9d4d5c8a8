use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An album is an ordered collection of photos within a single library.
/// `library_id` is immutable after creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Album)]
#[sea_orm(table_name = "albums")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[sea_orm(indexed)]
    pub library_id: Uuid,
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
    #[sea_orm(has_many = "super::album_photos::Entity")]
    AlbumPhotos,
}

impl Related<super::libraries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Libraries.def()
    }
}

impl Related<super::album_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumPhotos.def()
    }
}

impl Related<super::photos::Entity> for Entity {
    fn to() -> RelationDef {
        super::album_photos::Relation::Photos.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::album_photos::Relation::Albums.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
