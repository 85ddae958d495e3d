pub mod fs;
pub mod memory;
pub mod s3;

use crate::config::{AppConfig, ObjectStoreKind};
use crate::error::AppError;
use crate::storage::ObjectStore;
use std::sync::Arc;

/// Object store selected by `object_store` in the configuration.
pub async fn from_config(config: &AppConfig) -> Result<Arc<dyn ObjectStore>, AppError> {
    let store: Arc<dyn ObjectStore> = match config.object_store {
        ObjectStoreKind::S3 => Arc::new(s3::S3ObjectStore::new(config).await?),
        ObjectStoreKind::Fs => {
            log::debug!("Using filesystem object store at {}", config.fs_store_root);
            Arc::new(fs::FsObjectStore::new(&config.fs_store_root))
        }
    };
    Ok(store)
}
