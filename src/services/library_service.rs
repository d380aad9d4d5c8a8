use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::storage::LocalStorage;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

pub struct NewLibrary {
    pub name: String,
    pub description: String,
    pub storage_path: String,
}

#[derive(Default)]
pub struct LibraryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub storage_path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryStats {
    pub library_id: Uuid,
    pub library_name: String,
    pub photo_count: u64,
    pub album_count: u64,
    pub tag_count: u64,
    pub total_size_bytes: i64,
}

/// Coordinates library mutations across the database and the file area.
/// Ordering per use case: directory before row on create (an orphaned empty
/// directory is harmless, a row without a directory breaks every upload),
/// row before directory on delete (the database is authoritative).
pub struct LibraryService {
    db: DatabaseConnection,
    storage: Arc<LocalStorage>,
}

impl LibraryService {
    pub fn new(db: DatabaseConnection, storage: Arc<LocalStorage>) -> Self {
        Self { db, storage }
    }

    /// Uniqueness checks → directory → row. A failed insert compensates by
    /// removing the directory, but only if this call created it.
    pub async fn create(&self, new: NewLibrary) -> Result<libraries::Model, AppError> {
        if Libraries::find()
            .filter(libraries::Column::Name.eq(&new.name))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Library with this name already exists".to_string(),
            ));
        }

        if Libraries::find()
            .filter(libraries::Column::StoragePath.eq(&new.storage_path))
            .one(&self.db)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Library with this storage path already exists".to_string(),
            ));
        }

        let created_dir = self
            .storage
            .ensure_directory(Path::new(&new.storage_path))
            .await
            .map_err(|e| AppError::Io(format!("Failed to create storage directory: {}", e)))?;

        let now = Utc::now();
        let library = libraries::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name),
            description: Set(new.description),
            storage_path: Set(new.storage_path.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match library.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) => {
                if created_dir
                    && let Err(cleanup) = self
                        .storage
                        .remove_directory_if_exists(Path::new(&new.storage_path))
                        .await
                {
                    // Secondary failure; logged so the primary error stays visible.
                    tracing::warn!(
                        "Failed to clean up directory {} after insert failure: {}",
                        new.storage_path,
                        cleanup
                    );
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// Partial update. A storage path change creates the new directory before
    /// the row is saved and compensates on save failure. Files under the old
    /// path are not migrated; that is a documented limitation of the API.
    pub async fn update(
        &self,
        id: Uuid,
        changes: LibraryChanges,
    ) -> Result<libraries::Model, AppError> {
        let library = Libraries::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

        if let Some(ref name) = changes.name
            && Libraries::find()
                .filter(libraries::Column::Name.eq(name))
                .filter(libraries::Column::Id.ne(id))
                .one(&self.db)
                .await?
                .is_some()
        {
            return Err(AppError::Conflict(
                "Library with this name already exists".to_string(),
            ));
        }

        let path_change = match changes.storage_path {
            Some(ref path) if *path != library.storage_path => {
                if Libraries::find()
                    .filter(libraries::Column::StoragePath.eq(path))
                    .filter(libraries::Column::Id.ne(id))
                    .one(&self.db)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(
                        "Library with this storage path already exists".to_string(),
                    ));
                }
                Some(path.clone())
            }
            _ => None,
        };

        let created_dir = if let Some(ref path) = path_change {
            self.storage
                .ensure_directory(Path::new(path))
                .await
                .map_err(|e| AppError::Io(format!("Failed to create storage directory: {}", e)))?
        } else {
            false
        };

        let mut active: libraries::ActiveModel = library.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(ref path) = path_change {
            active.storage_path = Set(path.clone());
        }
        active.updated_at = Set(Utc::now());

        match active.update(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) => {
                if created_dir
                    && let Some(ref path) = path_change
                    && let Err(cleanup) = self
                        .storage
                        .remove_directory_if_exists(Path::new(path))
                        .await
                {
                    tracing::warn!(
                        "Failed to clean up directory {} after update failure: {}",
                        path,
                        cleanup
                    );
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// One transaction deletes everything beneath the library (join rows,
    /// photos, albums, the row itself); only after commit is the storage
    /// directory removed. A directory removal failure is downgraded to a
    /// warning: the authoritative state is already consistent.
    pub async fn delete(&self, id: Uuid) -> Result<Option<String>, AppError> {
        let library = Libraries::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

        let txn = self.db.begin().await?;

        let photo_ids: Vec<Uuid> = Photos::find()
            .filter(photos::Column::LibraryId.eq(id))
            .select_only()
            .column(photos::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        let album_ids: Vec<Uuid> = Albums::find()
            .filter(albums::Column::LibraryId.eq(id))
            .select_only()
            .column(albums::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if !photo_ids.is_empty() {
            PhotoTags::delete_many()
                .filter(photo_tags::Column::PhotoId.is_in(photo_ids.clone()))
                .exec(&txn)
                .await?;
            AlbumPhotos::delete_many()
                .filter(album_photos::Column::PhotoId.is_in(photo_ids))
                .exec(&txn)
                .await?;
        }
        if !album_ids.is_empty() {
            AlbumPhotos::delete_many()
                .filter(album_photos::Column::AlbumId.is_in(album_ids))
                .exec(&txn)
                .await?;
        }

        Photos::delete_many()
            .filter(photos::Column::LibraryId.eq(id))
            .exec(&txn)
            .await?;
        Albums::delete_many()
            .filter(albums::Column::LibraryId.eq(id))
            .exec(&txn)
            .await?;
        Libraries::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        match self
            .storage
            .remove_directory_if_exists(Path::new(&library.storage_path))
            .await
        {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    "Library {} deleted but directory {} could not be removed: {}",
                    id,
                    library.storage_path,
                    e
                );
                Ok(Some(
                    "Failed to remove some image files, manual cleanup may be required"
                        .to_string(),
                ))
            }
        }
    }

    pub async fn stats(&self, id: Uuid) -> Result<LibraryStats, AppError> {
        let library = Libraries::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Library not found".to_string()))?;

        let photo_count = Photos::find()
            .filter(photos::Column::LibraryId.eq(id))
            .count(&self.db)
            .await?;
        let album_count = Albums::find()
            .filter(albums::Column::LibraryId.eq(id))
            .count(&self.db)
            .await?;

        // Distinct tags appearing on any photo in this library.
        let tag_ids: Vec<Uuid> = PhotoTags::find()
            .join(
                sea_orm::JoinType::InnerJoin,
                photo_tags::Relation::Photos.def(),
            )
            .filter(photos::Column::LibraryId.eq(id))
            .select_only()
            .column(photo_tags::Column::TagId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        let total_size: Option<i64> = Photos::find()
            .filter(photos::Column::LibraryId.eq(id))
            .select_only()
            .column_as(photos::Column::FileSize.sum(), "total")
            .into_tuple()
            .one(&self.db)
            .await?
            .flatten();

        Ok(LibraryStats {
            library_id: library.id,
            library_name: library.name,
            photo_count,
            album_count,
            tag_count: tag_ids.len() as u64,
            total_size_bytes: total_size.unwrap_or(0),
        })
    }
}
