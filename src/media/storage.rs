//! Blob storage for product image files.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Key/value store for image blobs. Keys are relative, slash-separated paths
/// such as `product_images/<uuid>.jpg`.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous blob.
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Removes the blob under `key`. Missing blobs are not an error.
    async fn delete(&self, key: &str) -> io::Result<()>;

    /// Removes every blob in the store.
    async fn reset(&self) -> io::Result<()>;
}

/// Filesystem-backed store rooted at the configured media directory.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a key to a path under the root, rejecting keys that would escape it.
    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !clean {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid media key: {key}"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never observe a partially written blob.
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        if let Err(err) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }

        debug!(key, size = bytes.len(), "stored media blob");
        Ok(())
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "removed media blob");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn reset(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        tokio::fs::create_dir_all(&self.root).await
    }
}
