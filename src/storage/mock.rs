use mockall::mock;

use super::{ImageStorage, StorageError};

mock! {
    pub ImageStorage {}

    impl ImageStorage for ImageStorage {
        fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
        fn public_url(&self, path: &str) -> String;
    }
}
