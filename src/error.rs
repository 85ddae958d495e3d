use elasticsearch::http::transport::BuildError;
use elasticsearch::Error as ElasticsearchError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("Elasticsearch error: {0}")]
    Elasticsearch(#[from] ElasticsearchError),

    #[error("Elasticsearch client build error: {0}")]
    ElasticsearchBuild(#[from] BuildError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Search backend returned {status}: {reason}")]
    SearchBackend { status: u16, reason: String },

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl AppError {
    /// True when the error means "the thing is already there", as opposed to a
    /// failed write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
