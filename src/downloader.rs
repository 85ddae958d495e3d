use crate::error::AppError;
use crate::finder::CatalogQueryEngine;
use crate::metadata::PictureRef;
use crate::query::QueryDescription;
use crate::storage::ObjectStore;
use crate::walker::local_picture_set;
use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};

/// Asks whether `missing` pictures should be downloaded.
pub trait ConfirmDownload {
    fn confirm(&self, missing: usize) -> bool;
}

impl<F> ConfirmDownload for F
where
    F: Fn(usize) -> bool,
{
    fn confirm(&self, missing: usize) -> bool {
        self(missing)
    }
}

/// Prompts on the terminal until the answer is `y` or `n`. End of input means no.
pub struct StdinConfirm;

impl ConfirmDownload for StdinConfirm {
    fn confirm(&self, missing: usize) -> bool {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        loop {
            print!(
                "Do you want to proceed and download the {} missing picture(s) (y/n)? ",
                missing
            );
            if let Err(e) = std::io::stdout().flush() {
                log::debug!("Could not flush the confirmation prompt: {}", e);
            }

            let mut answer = String::new();
            match input.read_line(&mut answer) {
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }
            match answer.trim() {
                "y" => return true,
                "n" => return false,
                _ => continue,
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DownloadReport {
    /// Pictures matching the query.
    pub matched: usize,
    /// Pictures written to the picture directory.
    pub downloaded: Vec<PictureRef>,
    /// Pictures whose fetch or write failed, with the reason.
    pub failed: Vec<(PictureRef, String)>,
    /// True when the confirmation was refused and nothing was fetched.
    pub declined: bool,
}

/// Pictures of `wanted` with no file of the same name under `picture_dir`.
/// Presence is by name only; a truncated local file counts as present.
pub fn missing_pictures(picture_dir: &Path, wanted: Vec<PictureRef>) -> Vec<PictureRef> {
    let present = local_picture_set(picture_dir);
    wanted
        .into_iter()
        .filter(|picture| !present.contains(picture.file_name.trim_start_matches('/')))
        .collect()
}

/// Local file for a catalog `file_name`; names that would leave `picture_dir`
/// (`..`, absolute paths, prefixes) are refused.
pub fn local_path(picture_dir: &Path, file_name: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(file_name);
    let normal = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if file_name.is_empty() || !normal {
        return Err(AppError::InvalidLabel(format!(
            "file name {:?} points outside the picture directory",
            file_name
        )));
    }
    Ok(picture_dir.join(relative))
}

/// Fetches the catalog pictures matching a query that are absent from a local directory.
pub struct ReconciliationDownloader<'a> {
    engine: CatalogQueryEngine<'a>,
    store: &'a dyn ObjectStore,
}

impl<'a> ReconciliationDownloader<'a> {
    pub fn new(engine: CatalogQueryEngine<'a>, store: &'a dyn ObjectStore) -> Self {
        Self { engine, store }
    }

    /// Query, diff against `picture_dir`, confirm unless `force`, then fetch one
    /// by one. A failing query is an `Err`; a failing fetch only lands in
    /// `DownloadReport::failed`.
    pub async fn search_and_download(
        &self,
        query: &QueryDescription,
        index_name: &str,
        picture_dir: &Path,
        force: bool,
        confirm: &dyn ConfirmDownload,
    ) -> Result<DownloadReport, AppError> {
        log::info!("Searching for pictures in '{}' index", index_name);
        let pictures = self.engine.find_pictures(query, index_name, None).await?;
        let matched = pictures.len();

        let missing = missing_pictures(picture_dir, pictures);
        log::info!("{} picture(s) found matching the query", matched);
        log::info!(
            "{} picture(s) missing in {:?} shall be downloaded",
            missing.len(),
            picture_dir
        );

        let mut report = DownloadReport {
            matched,
            ..DownloadReport::default()
        };
        if missing.is_empty() {
            return Ok(report);
        }
        if !force && !confirm.confirm(missing.len()) {
            log::info!("Download declined");
            report.declined = true;
            return Ok(report);
        }

        tokio::fs::create_dir_all(picture_dir).await?;
        log::info!("Downloading...");
        for picture in missing {
            match self.fetch(&picture, picture_dir).await {
                Ok(()) => {
                    log::debug!("Downloaded img_id {} to {}", picture.img_id, picture.file_name);
                    report.downloaded.push(picture);
                }
                Err(e) => {
                    log::warn!("Could not download img_id {}: {}", picture.img_id, e);
                    report.failed.push((picture, e.to_string()));
                }
            }
        }

        log::info!(
            "{} picture(s) downloaded to {:?}, {} failure(s)",
            report.downloaded.len(),
            picture_dir,
            report.failed.len()
        );
        Ok(report)
    }

    async fn fetch(&self, picture: &PictureRef, picture_dir: &Path) -> Result<(), AppError> {
        let output = local_path(picture_dir, &picture.file_name)?;
        let bytes = self.store.get(&picture.object_path()).await?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&output, bytes).await?;
        Ok(())
    }
}
