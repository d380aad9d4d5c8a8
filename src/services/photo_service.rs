use crate::api::error::AppError;
use crate::config::Config;
use crate::entities::{prelude::*, *};
use crate::services::storage::LocalStorage;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub struct NewUpload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Already range-checked by the handler; an out-of-range form value is
    /// silently dropped before it gets here.
    pub rating: Option<i32>,
    pub tag_names: Vec<String>,
}

/// Coordinates photo mutations across the database and the file area. Each
/// use case is a linear pipeline with one compensation point: undo the most
/// recent externally visible side effect when the next step fails.
pub struct PhotoService {
    db: DatabaseConnection,
    storage: Arc<LocalStorage>,
    config: Config,
}

impl PhotoService {
    pub fn new(db: DatabaseConnection, storage: Arc<LocalStorage>, config: Config) -> Self {
        Self { db, storage, config }
    }

    /// Upload pipeline: validate type and size, probe dimensions (aborting
    /// before any write if the bytes are not a decodable image), write the
    /// file durably, insert the row. Row-insert failure deletes the file just
    /// written. Tag association happens after the row exists and is
    /// best-effort: a failed tag never rolls back the photo.
    pub async fn upload(
        &self,
        library: &libraries::Model,
        upload: NewUpload,
    ) -> Result<photos::Model, AppError> {
        if !self.config.is_allowed_type(&upload.content_type) {
            return Err(AppError::BadRequest(
                "Invalid image type. Supported types: JPEG, PNG, GIF, WebP, TIFF, BMP".to_string(),
            ));
        }
        if upload.bytes.len() > self.config.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        let (width, height) = probe_dimensions(&upload.bytes)
            .ok_or_else(|| AppError::BadRequest("Invalid image file".to_string()))?;

        let dir = Path::new(&library.storage_path);
        self.storage
            .ensure_directory(dir)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create library storage directory: {}", e)))?;

        let (filename, file_path) = self
            .storage
            .write_new_file(dir, &upload.original_name, &upload.bytes)
            .await
            .map_err(|e| AppError::Io(format!("Failed to save file: {}", e)))?;

        let now = Utc::now();
        let photo = photos::ActiveModel {
            id: Set(Uuid::new_v4()),
            filename: Set(filename),
            original_name: Set(upload.original_name),
            file_path: Set(file_path.to_string_lossy().into_owned()),
            mime_type: Set(upload.content_type),
            file_size: Set(upload.bytes.len() as i64),
            width: Set(width),
            height: Set(height),
            rating: Set(upload.rating),
            library_id: Set(library.id),
            uploaded_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let photo = match photo.insert(&self.db).await {
            Ok(model) => model,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_file(&file_path).await {
                    tracing::warn!(
                        "Failed to remove {} after insert failure: {}",
                        file_path.display(),
                        cleanup
                    );
                }
                return Err(AppError::Database(e));
            }
        };

        for name in &upload.tag_names {
            if let Err(e) = self.attach_tag(photo.id, name).await {
                tracing::warn!("Failed to attach tag '{}' to photo {}: {}", name, photo.id, e);
            }
        }

        Ok(photo)
    }

    /// Copy pipeline: check the source file still exists, copy it into the
    /// target library's directory, then insert the new row and duplicated tag
    /// associations in one transaction. Transaction failure deletes the
    /// copied file. The source photo and file are never touched.
    pub async fn copy(
        &self,
        source: &photos::Model,
        target: &libraries::Model,
    ) -> Result<photos::Model, AppError> {
        let source_path = Path::new(&source.file_path);
        if !self.storage.file_exists(source_path).await {
            return Err(AppError::NotFound(
                "Source photo file not found".to_string(),
            ));
        }

        let source_tags: Vec<tags::Model> = source.find_related(Tags).all(&self.db).await?;

        let dir = Path::new(&target.storage_path);
        self.storage
            .ensure_directory(dir)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create target storage directory: {}", e)))?;

        let (filename, file_path) = self
            .storage
            .copy_file(source_path, dir, &source.original_name)
            .await
            .map_err(|e| AppError::Io(format!("Failed to copy photo file: {}", e)))?;

        let now = Utc::now();
        let new_id = Uuid::new_v4();
        let copy = photos::ActiveModel {
            id: Set(new_id),
            filename: Set(filename),
            original_name: Set(source.original_name.clone()),
            file_path: Set(file_path.to_string_lossy().into_owned()),
            mime_type: Set(source.mime_type.clone()),
            file_size: Set(source.file_size),
            width: Set(source.width),
            height: Set(source.height),
            rating: Set(source.rating),
            library_id: Set(target.id),
            uploaded_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result: Result<(), sea_orm::DbErr> = async {
            let txn = self.db.begin().await?;
            copy.insert(&txn).await?;
            for tag in &source_tags {
                photo_tags::ActiveModel {
                    photo_id: Set(new_id),
                    tag_id: Set(tag.id),
                }
                .insert(&txn)
                .await?;
            }
            txn.commit().await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = self.storage.delete_file(&file_path).await {
                tracing::warn!(
                    "Failed to remove {} after copy failure: {}",
                    file_path.display(),
                    cleanup
                );
            }
            return Err(AppError::Database(e));
        }

        let copied = Photos::find_by_id(new_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal("Copied photo row vanished".to_string()))?;
        Ok(copied)
    }

    /// One transaction removes the join rows and the photo row; only then is
    /// the physical file deleted. Absence of the file is success (the
    /// database is the source of truth); a real I/O failure is downgraded to
    /// a warning on an otherwise successful delete.
    pub async fn delete(&self, photo: photos::Model) -> Result<Option<String>, AppError> {
        let txn = self.db.begin().await?;

        PhotoTags::delete_many()
            .filter(photo_tags::Column::PhotoId.eq(photo.id))
            .exec(&txn)
            .await?;
        AlbumPhotos::delete_many()
            .filter(album_photos::Column::PhotoId.eq(photo.id))
            .exec(&txn)
            .await?;
        Photos::delete_by_id(photo.id).exec(&txn).await?;

        txn.commit().await?;

        match self.storage.delete_file(Path::new(&photo.file_path)).await {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    "Photo {} deleted but file {} could not be removed: {}",
                    photo.id,
                    photo.file_path,
                    e
                );
                Ok(Some(
                    "Failed to delete the photo file, manual cleanup may be required".to_string(),
                ))
            }
        }
    }

    /// Resolve-or-create the tag, then link it. Races between the lookup and
    /// the insert surface as a store error on the composite primary key and
    /// are treated as best-effort by callers.
    async fn attach_tag(&self, photo_id: Uuid, name: &str) -> Result<(), AppError> {
        let tag = match Tags::find()
            .filter(tags::Column::Name.eq(name))
            .one(&self.db)
            .await?
        {
            Some(tag) => tag,
            None => {
                let now = Utc::now();
                tags::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    color: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await?
            }
        };

        photo_tags::ActiveModel {
            photo_id: Set(photo_id),
            tag_id: Set(tag.id),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }
}

/// Reads only the header needed for dimensions; a failure here means the
/// bytes are not a decodable image.
fn probe_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some((width as i32, height as i32))
}
