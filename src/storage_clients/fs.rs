use crate::error::AppError;
use crate::storage::{DeleteStatus, ObjectStore};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Object store rooted in a local directory; the object path is the relative file path.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::ObjectStore(format!("invalid object path {:?}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, AppError> {
        let file = self.file_path(path)?;
        Ok(tokio::fs::metadata(&file)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write next to the target then rename so readers never see a partial blob.
        let tmp = file.with_extension(format!("tmp.{}", std::process::id()));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &file).await?;
        log::trace!("Stored {} bytes at {:?}", bytes.len(), file);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let file = self.file_path(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(path.to_string()))
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteStatus, AppError> {
        let mut status = DeleteStatus {
            status_code: 200,
            deleted: 0,
            failed: Vec::new(),
        };
        for path in paths {
            let file = self.file_path(path)?;
            match tokio::fs::remove_file(&file).await {
                Ok(()) => status.deleted += 1,
                // Deleting a missing key is a success on S3 as well.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => status.deleted += 1,
                Err(e) => {
                    log::warn!("Could not delete {:?}: {}", file, e);
                    status.failed.push(path.clone());
                }
            }
        }
        Ok(status)
    }
}
