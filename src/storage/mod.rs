//! Blob storage for product images.

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

pub mod local;

#[cfg(test)]
pub mod mock;

pub use local::LocalImageStorage;

/// Folder every product image is stored under.
pub const PRODUCT_IMAGE_PREFIX: &str = "products";

const RANDOM_SUFFIX_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage path `{0}`")]
    InvalidPath(String),
}

/// Upload target for product images.
pub trait ImageStorage {
    /// Store `bytes` at `path`, relative to the storage root.
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    /// URL the object stored at `path` is publicly reachable under.
    fn public_url(&self, path: &str) -> String;
}

/// Collision-resistant object path: `products/{millis}_{random}.{ext}`.
pub fn generate_image_path(file_name: &str, timestamp_millis: i64) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();

    format!(
        "{PRODUCT_IMAGE_PREFIX}/{timestamp_millis}_{suffix}.{}",
        file_extension(file_name)
    )
}

/// Lowercased extension of `file_name`, `jpg` when it has none usable.
fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|ch| ch.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string())
}

/// A local image file chosen in the editor. `uploaded_url` is set once the
/// file reached storage so retries do not upload it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub uploaded_url: Option<String>,
}

impl PendingImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            uploaded_url: None,
        }
    }

    /// A file an earlier attempt already stored at `url`.
    pub fn already_uploaded(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            file_name: url.rsplit('/').next().unwrap_or_default().to_string(),
            bytes: Vec::new(),
            uploaded_url: Some(url),
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.uploaded_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_paths_follow_layout() {
        let path = generate_image_path("Bangle Photo.PNG", 1700000000000);

        let rest = path
            .strip_prefix("products/1700000000000_")
            .expect("prefix and timestamp");
        let (random, ext) = rest.split_once('.').expect("extension");
        assert_eq!(ext, "png");
        assert_eq!(random.len(), RANDOM_SUFFIX_LEN);
        assert!(
            random
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        );
    }

    #[test]
    fn generated_paths_differ() {
        let first = generate_image_path("a.jpg", 1);
        let second = generate_image_path("a.jpg", 1);
        assert_ne!(first, second);
    }

    #[test]
    fn already_uploaded_images_keep_their_url() {
        let image = PendingImage::already_uploaded("/uploads/products/17_abc.png");
        assert!(image.is_uploaded());
        assert_eq!(image.file_name, "17_abc.png");
        assert!(image.bytes.is_empty());
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        assert_eq!(file_extension("photo"), "jpg");
        assert_eq!(file_extension("photo."), "jpg");
        assert_eq!(file_extension("x.we/ird"), "jpg");
        assert_eq!(file_extension("a.b.WEBP"), "webp");
    }
}
