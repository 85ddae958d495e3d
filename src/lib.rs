pub mod config;
pub mod downloader;
pub mod error;
pub mod finder;
pub mod index_admin;
pub mod key_prefix;
pub mod label;
pub mod label_fix;
pub mod metadata;
pub mod query;
pub mod search;
pub mod search_clients;
pub mod storage;
pub mod storage_clients;
pub mod uploader;
pub mod walker;
