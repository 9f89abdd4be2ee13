use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::storage::{ImageStorage, StorageError};

/// Stores images on the local filesystem under `root`, served by the web
/// server under `public_base`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into();
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ImageStorage for LocalImageStorage {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        log::info!("Stored image {} ({} bytes)", target.display(), bytes.len());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_writes_file_under_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = LocalImageStorage::new(dir.path(), "/uploads/");

        storage
            .upload("products/1_abc.jpg", b"image-bytes")
            .expect("upload succeeds");

        let written = fs::read(dir.path().join("products/1_abc.jpg")).expect("file exists");
        assert_eq!(written, b"image-bytes");
        assert_eq!(
            storage.public_url("products/1_abc.jpg"),
            "/uploads/products/1_abc.jpg"
        );
    }

    #[test]
    fn upload_rejects_escaping_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let storage = LocalImageStorage::new(dir.path(), "/uploads");

        for path in ["../evil.jpg", "/etc/passwd", "products/../../x", ""] {
            let result = storage.upload(path, b"x");
            assert!(matches!(result, Err(StorageError::InvalidPath(_))), "{path}");
        }
    }
}
