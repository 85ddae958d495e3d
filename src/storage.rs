use crate::error::AppError;
use async_trait::async_trait;

/// Outcome of a batched delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatus {
    /// HTTP-style status of the call itself; 200 when the store accepted it.
    pub status_code: u16,
    pub deleted: usize,
    pub failed: Vec<String>,
}

/// Blob storage addressed by object path (`"{bucket}/{key}"`).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, AppError>;
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError>;
    /// Fails with `AppError::NotFound` when nothing is stored under `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError>;
    async fn delete(&self, paths: &[String]) -> Result<DeleteStatus, AppError>;
}

/// Splits an object path into bucket and key.
pub fn split_object_path(path: &str) -> Result<(&str, &str), AppError> {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(AppError::ObjectStore(format!(
            "object path {:?} has no bucket/key form",
            path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bucket_from_key() {
        assert_eq!(
            split_object_path("bucket/run_1/20200205/3").unwrap(),
            ("bucket", "run_1/20200205/3")
        );
        assert!(split_object_path("bucket").is_err());
        assert!(split_object_path("bucket/").is_err());
    }
}
