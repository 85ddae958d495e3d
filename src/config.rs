use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreKind {
    S3,
    Fs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub elasticsearch_url: String,
    /// Base index name; also the alias every dated catalog index is bound to.
    pub index_name: String,
    pub bucket: String,
    pub object_store: ObjectStoreKind,
    pub fs_store_root: String,
    pub s3_endpoint_url: Option<String>,
    pub s3_force_path_style: bool,
    pub max_results: usize,
    pub log_level: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("elasticsearch_url", "http://localhost:9200")?
            .set_default("index_name", "patate-db")?
            .set_default("bucket", "patate-pictures")?
            .set_default("object_store", "s3")?
            .set_default("fs_store_root", "./object_store")?
            .set_default("s3_force_path_style", false)?
            .set_default("max_results", 10_000_i64)?
            .set_default("log_level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("CATALOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
