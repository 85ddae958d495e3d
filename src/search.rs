use crate::error::AppError;
use crate::metadata::CatalogDocument;
use crate::query::QueryDescription;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How far `SearchResponse::total` can be trusted.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    /// Exact count.
    Eq,
    /// Lower bound: the backend stopped counting.
    Gte,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub total: u64,
    pub relation: TotalRelation,
    pub documents: Vec<CatalogDocument>,
}

/// Parameters for creating a dated catalog index behind an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub alias: Option<String>,
    pub is_write_index: bool,
    /// Index currently receiving writes through `alias`; demoted to read-only membership.
    pub current_write_index: Option<String>,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Stores `doc` under its img_id. Without `overwrite` an existing id fails with
    /// `AppError::Conflict`.
    async fn index_document(
        &self,
        index: &str,
        doc: &CatalogDocument,
        overwrite: bool,
    ) -> Result<(), AppError>;
    async fn create_index(&self, spec: &IndexSpec) -> Result<(), AppError>;
    /// Returns the backend's acknowledgement flag.
    async fn delete_index(&self, name: &str) -> Result<bool, AppError>;
    async fn search(
        &self,
        index: &str,
        query: &QueryDescription,
        default_size: usize,
    ) -> Result<SearchResponse, AppError>;
}
