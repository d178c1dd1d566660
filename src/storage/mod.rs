//! Storage abstractions for catalog persistence.
//!
//! Keys are `/`-separated paths relative to the storage root:
//!
//! ```text
//! {root}/
//! ├── gazettes/
//! │   ├── catalog.json      # Full deduplicated catalog
//! │   └── latest.json       # First N entries of catalog.json
//! ├── acts/
//! │   └── ...
//! └── all/
//!     ├── catalog.json      # Merged feed
//!     └── latest.json
//! ```

pub mod local;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::Catalog;

pub use local::LocalStorage;

/// SHA-256 of a byte string, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Trait for catalog storage backends.
#[async_trait]
pub trait CatalogStorage: Send + Sync {
    /// Read bytes, returning `None` if the key does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the content of `key` atomically. Readers see either the old
    /// or the new bytes, never a partial file.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Write only when the content hash differs from what is stored.
    ///
    /// Returns whether a write happened.
    async fn write_if_changed(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        if let Some(existing) = self.read_bytes(key).await? {
            if content_hash(&existing) == content_hash(bytes) {
                log::debug!("{} unchanged, skipping write", key);
                return Ok(false);
            }
        }
        self.write_bytes(key, bytes).await?;
        Ok(true)
    }

    /// Read a catalog file, `None` if the key does not exist.
    async fn read_catalog(&self, key: &str) -> Result<Option<Catalog>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash(b"[1]"), content_hash(b"[1] "));
    }
}
