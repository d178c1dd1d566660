//! Local filesystem storage implementation.
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a crash mid-write leaves the previous file intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::CatalogStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStorage for LocalStorage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Io(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("acts/catalog.json", b"[]").await.unwrap();
        let data = storage.read_bytes("acts/catalog.json").await.unwrap();
        assert_eq!(data, Some(b"[]".to_vec()));
        assert!(!tmp.path().join("acts/catalog.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.json").await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_write_if_changed_skips_identical_bytes() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.write_if_changed("a/latest.json", b"{\"count\":1}").await.unwrap());
        let path = tmp.path().join("a/latest.json");
        let first = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!storage.write_if_changed("a/latest.json", b"{\"count\":1}").await.unwrap());
        let second = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(first, second);

        assert!(storage.write_if_changed("a/latest.json", b"{\"count\":2}").await.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"count\":2}");
    }

    #[tokio::test]
    async fn test_read_catalog() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .write_bytes(
                "all/latest.json",
                br#"{"updated_at":"2025-01-02T03:04:05Z","count":0,"documents":[]}"#,
            )
            .await
            .unwrap();

        let catalog = storage.read_catalog("all/latest.json").await.unwrap().unwrap();
        assert_eq!(catalog.count, 0);
        assert!(storage.read_catalog("none/latest.json").await.unwrap().is_none());

        storage.write_bytes("bad/latest.json", b"{").await.unwrap();
        let err = storage.read_catalog("bad/latest.json").await;
        assert!(matches!(err, Err(AppError::Json(_))));
    }
}
