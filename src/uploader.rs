use crate::error::AppError;
use crate::key_prefix::{generate_key_prefix, normalize_location, object_path};
use crate::label::{Label, LabelBatch};
use crate::metadata::CatalogDocument;
use crate::search::SearchIndex;
use crate::storage::{DeleteStatus, ObjectStore};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub bucket: String,
    pub index_name: String,
    /// Explicit key prefix; `None` derives one from the batch (event and upload date).
    pub key_prefix: Option<String>,
    pub overwrite: bool,
    /// Where picture files are read from; defaults to the label file's directory.
    pub picture_root: Option<PathBuf>,
}

/// Per-batch result of an upload. A record adds to at most one counter per store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadCounts {
    pub blob_success: usize,
    pub index_success: usize,
    pub failed: usize,
}

impl UploadCounts {
    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.blob_success, self.index_success, self.failed)
    }
}

enum BlobWrite {
    Written,
    /// Already stored and overwrite disabled. Counts as a failure, but the
    /// location is valid so the record still goes to the index.
    AlreadyPresent,
    Failed,
}

/// Writes each label's picture to the object store, then its catalog document
/// to the search index. Blob first: a crash in between leaves an orphan blob,
/// never a document pointing at nothing.
pub struct CatalogUploader<'a> {
    store: &'a dyn ObjectStore,
    index: &'a dyn SearchIndex,
}

impl<'a> CatalogUploader<'a> {
    pub fn new(store: &'a dyn ObjectStore, index: &'a dyn SearchIndex) -> Self {
        Self { store, index }
    }

    pub async fn upload_file(
        &self,
        label_file: impl AsRef<Path>,
        options: &UploadOptions,
    ) -> Result<UploadCounts, AppError> {
        let batch = LabelBatch::load(label_file)?;
        Ok(self.upload(batch, options).await)
    }

    pub async fn upload(&self, mut batch: LabelBatch, options: &UploadOptions) -> UploadCounts {
        let key_prefix = match &options.key_prefix {
            Some(prefix) => prefix.clone(),
            None => generate_key_prefix(batch.labels()).unwrap_or_else(|| {
                log::warn!(
                    "Could not derive a key prefix for {:?} (mixed or invalid event names); uploading without prefix",
                    batch.source()
                );
                String::new()
            }),
        };
        let location = normalize_location(&options.bucket, &key_prefix);
        let picture_root = options
            .picture_root
            .clone()
            .unwrap_or_else(|| batch.default_picture_root());

        log::info!(
            "Uploading {} picture(s) to '{}' and index '{}' (overwrite: {})",
            batch.len(),
            location,
            options.index_name,
            options.overwrite
        );

        let mut counts = UploadCounts::default();
        for label in batch.labels_mut() {
            label.location = location.clone();
            let path = object_path(&location, &label.img_id);

            let indexable = match self.write_blob(label, &path, &picture_root, options.overwrite).await {
                BlobWrite::Written => {
                    counts.blob_success += 1;
                    true
                }
                BlobWrite::AlreadyPresent => {
                    counts.failed += 1;
                    true
                }
                BlobWrite::Failed => {
                    counts.failed += 1;
                    false
                }
            };
            if !indexable {
                continue;
            }

            let doc = CatalogDocument::from(&*label);
            match self
                .index
                .index_document(&options.index_name, &doc, options.overwrite)
                .await
            {
                Ok(()) => {
                    counts.index_success += 1;
                    log::debug!("Indexed img_id {} in '{}'", label.img_id, options.index_name);
                }
                Err(e) if e.is_conflict() => {
                    counts.failed += 1;
                    log::info!("img_id {} is already indexed, not overwriting", label.img_id);
                }
                Err(e) => {
                    counts.failed += 1;
                    log::warn!("Could not index img_id {}: {}", label.img_id, e);
                }
            }
        }

        if counts.blob_success == 0 && counts.index_success == 0 && counts.failed >= batch.len() {
            log::error!(
                "Nothing was written for {:?}: {} failure(s) for {} label(s)",
                batch.source(),
                counts.failed,
                batch.len()
            );
        } else {
            log::info!(
                "Upload finished: {} blob(s) stored, {} document(s) indexed, {} failure(s)",
                counts.blob_success,
                counts.index_success,
                counts.failed
            );
        }
        counts
    }

    async fn write_blob(
        &self,
        label: &Label,
        path: &str,
        picture_root: &Path,
        overwrite: bool,
    ) -> BlobWrite {
        if !overwrite {
            match self.store.exists(path).await {
                Ok(true) => {
                    log::info!("{} already exists, not overwriting", path);
                    return BlobWrite::AlreadyPresent;
                }
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Could not check {} in the object store: {}", path, e);
                    return BlobWrite::Failed;
                }
            }
        }

        let picture = picture_root.join(&label.file_name);
        let bytes = match tokio::fs::read(&picture).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(
                    "Could not read picture {:?} for img_id {}: {}",
                    picture,
                    label.img_id,
                    e
                );
                return BlobWrite::Failed;
            }
        };

        match self.store.put(path, bytes).await {
            Ok(()) => {
                log::debug!("Stored {:?} as {}", picture, path);
                BlobWrite::Written
            }
            Err(e) => {
                log::warn!("Could not store {:?} as {}: {}", picture, path, e);
                BlobWrite::Failed
            }
        }
    }

}

/// Removes the blobs of every label of the batch stored under `bucket/key_prefix`.
pub async fn delete_blobs(
    store: &dyn ObjectStore,
    batch: &LabelBatch,
    bucket: &str,
    key_prefix: &str,
) -> Result<DeleteStatus, AppError> {
    let location = normalize_location(bucket, key_prefix);
    let paths: Vec<String> = batch
        .labels()
        .iter()
        .map(|label| object_path(&location, &label.img_id))
        .collect();
    log::info!("Deleting {} blob(s) under '{}'", paths.len(), location);
    let status = store.delete(&paths).await?;
    if !status.failed.is_empty() {
        log::warn!("{} blob(s) could not be deleted", status.failed.len());
    }
    Ok(status)
}
