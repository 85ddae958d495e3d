use crate::error::AppError;
use crate::metadata::PictureRef;
use crate::query::QueryDescription;
use crate::search::{SearchIndex, TotalRelation};
use std::path::Path;

/// Runs query descriptions against the catalog and returns picture references.
pub struct CatalogQueryEngine<'a> {
    index: &'a dyn SearchIndex,
    default_size: usize,
}

impl<'a> CatalogQueryEngine<'a> {
    pub fn new(index: &'a dyn SearchIndex, default_size: usize) -> Self {
        Self {
            index,
            default_size,
        }
    }

    /// Matching pictures in index order. An unreachable index is an `Err`, zero
    /// matches is an empty list. When the backend only gives a lower bound for
    /// the total, a warning is logged and the truncated page is returned as is.
    pub async fn find_pictures(
        &self,
        query: &QueryDescription,
        index_name: &str,
        output: Option<&Path>,
    ) -> Result<Vec<PictureRef>, AppError> {
        let response = self.index.search(index_name, query, self.default_size).await?;
        log::info!(
            "Query on '{}' returned {} picture(s)",
            index_name,
            response.documents.len()
        );

        if response.relation != TotalRelation::Eq
            || (response.total as usize) > response.documents.len()
        {
            log::warn!(
                "Hit the maximum number of results ({} returned, {} total{}): the picture list might not be complete",
                response.documents.len(),
                response.total,
                if response.relation == TotalRelation::Eq { "" } else { " or more" }
            );
        }

        let pictures: Vec<PictureRef> = response
            .documents
            .iter()
            .map(|doc| doc.picture_ref())
            .collect();

        if let Some(output) = output {
            let json = serde_json::to_string_pretty(&pictures)?;
            tokio::fs::write(output, json).await?;
            log::info!("Result written to {:?}", output);
        }

        Ok(pictures)
    }
}
