use anyhow::{Context, anyhow};
use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Filesystem side of the dual-resource model: per-library directories and
/// photo files. The database stays authoritative; everything here is written
/// durably (fsync before success) and partial artifacts are cleaned up on
/// failure so coordinators only ever have one side effect to compensate.
///
/// No locking is provided. Concurrent writers into the same directory rely on
/// the collision-free naming scheme.
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    /// Create `path` (and parents) if absent. Returns whether this call
    /// created the directory, so callers can compensate precisely: an
    /// already-existing directory is never ours to remove.
    pub async fn ensure_directory(&self, path: &Path) -> anyhow::Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => {
                return Err(anyhow!(
                    "path {} exists and is not a directory",
                    path.display()
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).context(format!("failed to stat {}", path.display())),
        }

        tokio::fs::create_dir_all(path)
            .await
            .context(format!("failed to create directory {}", path.display()))?;
        Ok(true)
    }

    /// Recursively remove `path`. Absence is success: the database already
    /// decided the directory should not exist.
    pub async fn remove_directory_if_exists(&self, path: &Path) -> anyhow::Result<()> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path)
                .await
                .context(format!("failed to remove directory {}", path.display())),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!("failed to stat {}", path.display())),
        }
    }

    /// Write `bytes` to a freshly named file under `dir` and flush it to
    /// disk before reporting success. A partially written file is removed
    /// before the error propagates.
    pub async fn write_new_file(
        &self,
        dir: &Path,
        original_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<(String, PathBuf)> {
        let filename = Self::unique_filename(original_name);
        let path = dir.join(&filename);

        if let Err(e) = self.write_durably(&path, bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e).context(format!("failed to write {}", path.display()));
        }

        Ok((filename, path))
    }

    /// Copy `src` into `dst_dir` under a new collision-free name derived from
    /// `original_name`. Cleans up the partial destination on failure.
    pub async fn copy_file(
        &self,
        src: &Path,
        dst_dir: &Path,
        original_name: &str,
    ) -> anyhow::Result<(String, PathBuf)> {
        let bytes = tokio::fs::read(src)
            .await
            .context(format!("failed to read {}", src.display()))?;
        self.write_new_file(dst_dir, original_name, &bytes).await
    }

    /// Tolerant delete: the file may already be gone, and that is fine.
    pub async fn delete_file(&self, path: &Path) -> anyhow::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!("failed to delete {}", path.display())),
        }
    }

    pub async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn write_durably(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// `{stem}_{unix_ts}_{rand8}{ext}` — probabilistic uniqueness within a
    /// directory; 8 alphanumeric chars on top of the timestamp make a
    /// collision between concurrent uploads of the same name astronomically
    /// unlikely.
    pub fn unique_filename(original_name: &str) -> String {
        let base = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo");
        let (stem, ext) = match base.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
            _ => (base, String::new()),
        };

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();

        format!("{}_{}_{}{}", stem, Utc::now().timestamp(), suffix, ext)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_filename_keeps_stem_and_extension() {
        let name = LocalStorage::unique_filename("beach.jpg");
        assert!(name.starts_with("beach_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_unique_filename_strips_path_components() {
        let name = LocalStorage::unique_filename("../../evil.png");
        assert!(name.starts_with("evil_"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_unique_filename_without_extension() {
        let name = LocalStorage::unique_filename("raw");
        assert!(name.starts_with("raw_"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_unique_filenames_differ() {
        let a = LocalStorage::unique_filename("x.png");
        let b = LocalStorage::unique_filename("x.png");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_ensure_directory_reports_creation() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let target = dir.path().join("lib");

        assert!(storage.ensure_directory(&target).await.unwrap());
        assert!(!storage.ensure_directory(&target).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_directory_rejects_file_collision() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        let target = dir.path().join("occupied");
        tokio::fs::write(&target, b"x").await.unwrap();

        assert!(storage.ensure_directory(&target).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_file_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        storage.delete_file(&dir.path().join("gone.jpg")).await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();

        let res = storage
            .copy_file(&dir.path().join("missing.jpg"), dir.path(), "missing.jpg")
            .await;
        assert!(res.is_err());
    }
}
