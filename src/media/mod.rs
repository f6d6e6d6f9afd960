//! Product image handling: rendition derivation and blob storage.

pub mod deriver;
pub mod storage;

pub use deriver::{derive, fit_within, Renditions, JPEG_QUALITY, MEDIUM_BOX, SMALL_BOX};
pub use storage::{FsMediaStore, MediaStore};

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

/// Directory (key prefix) holding every product image blob.
pub const IMAGE_PREFIX: &str = "product_images";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("image could not be decoded: {0}")]
    Decode(String),
    #[error("image could not be encoded: {0}")]
    Encode(String),
    #[error("image task failed: {0}")]
    Task(String),
}

/// A source image as received from an upload or a legacy media directory.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Text after the last `.` of the filename, or the whole name when it has
    /// no dot.
    pub fn extension(&self) -> &str {
        self.filename.rsplit('.').next().unwrap_or_default()
    }
}

/// One blob ready to be written to a [`MediaStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// The three blobs of a product image, derived but not yet stored.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub large: StoredBlob,
    pub medium: StoredBlob,
    pub small: StoredBlob,
}

impl PreparedImage {
    pub fn blobs(&self) -> [&StoredBlob; 3] {
        [&self.large, &self.medium, &self.small]
    }

    pub fn keys(&self) -> [String; 3] {
        [
            self.large.key.clone(),
            self.medium.key.clone(),
            self.small.key.clone(),
        ]
    }
}

/// Fresh storage key for an image with the given extension. Every call yields
/// a distinct key.
pub fn new_image_key(extension: &str) -> String {
    format!("{IMAGE_PREFIX}/{}.{extension}", Uuid::new_v4())
}

/// Derives both renditions of `upload` and assigns storage keys to all three
/// blobs. Decoding runs on the blocking pool.
#[instrument(skip(upload), fields(filename = %upload.filename, size = upload.bytes.len()))]
pub async fn prepare_image(upload: ImageUpload) -> Result<PreparedImage, MediaError> {
    let extension = upload.extension().to_string();
    let source = upload.bytes;

    let (source, renditions) = tokio::task::spawn_blocking(move || {
        let renditions = deriver::derive(&source);
        (source, renditions)
    })
    .await
    .map_err(|e| MediaError::Task(e.to_string()))?;
    let renditions = renditions?;

    Ok(PreparedImage {
        large: StoredBlob {
            key: new_image_key(&extension),
            bytes: source,
        },
        medium: StoredBlob {
            key: new_image_key(&extension),
            bytes: renditions.medium,
        },
        small: StoredBlob {
            key: new_image_key(&extension),
            bytes: renditions.small,
        },
    })
}

/// Writes all blobs of `image`. If any write fails, blobs already written are
/// removed before the error is returned.
pub async fn store_prepared(
    store: &dyn MediaStore,
    image: &PreparedImage,
) -> std::io::Result<()> {
    let mut written: Vec<&str> = Vec::with_capacity(3);
    for blob in image.blobs() {
        if let Err(err) = store.put(&blob.key, &blob.bytes).await {
            remove_blobs(store, written).await;
            return Err(err);
        }
        written.push(&blob.key);
    }
    Ok(())
}

/// Best-effort removal of blobs; failures are logged, not returned.
pub async fn remove_blobs<I, S>(store: &dyn MediaStore, keys: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for key in keys {
        if let Err(err) = store.delete(key.as_ref()).await {
            tracing::warn!(key = key.as_ref(), error = %err, "failed to remove media blob");
        }
    }
}
