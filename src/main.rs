use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use picture_catalog::config::AppConfig;
use picture_catalog::downloader::{ReconciliationDownloader, StdinConfirm};
use picture_catalog::finder::CatalogQueryEngine;
use picture_catalog::index_admin;
use picture_catalog::label::LabelBatch;
use picture_catalog::label_fix;
use picture_catalog::query::QueryDescription;
use picture_catalog::search_clients::elasticsearch::ElasticsearchSearchIndex;
use picture_catalog::storage_clients;
use picture_catalog::uploader::{self, CatalogUploader, UploadOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "picture-catalog", about = "Keep labeled pictures in sync between the object store and the search index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload the pictures of a label file and index their metadata.
    Upload {
        label_file: PathBuf,
        /// Key prefix under the bucket. By default: "{event}/{YYYYMMDD}/".
        #[arg(long)]
        key_prefix: Option<String>,
        #[arg(long)]
        overwrite: bool,
        /// Directory holding the pictures. By default: the label file's directory.
        #[arg(long)]
        pictures: Option<PathBuf>,
        /// Index or alias to write to. By default: the configured index.
        #[arg(long)]
        index: Option<String>,
    },
    /// Search the catalog with a query description file.
    Search {
        query_file: PathBuf,
        /// Write the matching pictures to this JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        index: Option<String>,
    },
    /// Download the pictures matching a query that are missing from a directory.
    Download {
        query_file: PathBuf,
        picture_dir: PathBuf,
        /// Do not ask for confirmation.
        #[arg(short, long)]
        force: bool,
        #[arg(long)]
        index: Option<String>,
    },
    /// Create a new index and make it the write index of the configured alias.
    CreateIndex {
        /// Name of the new index. By default: "{index_name}-{YYMMDD}".
        #[arg(short, long)]
        index: Option<String>,
        /// Index currently receiving writes through the alias.
        #[arg(long)]
        current_write_index: Option<String>,
    },
    /// Delete an index.
    DeleteIndex { index: String },
    /// Delete the blobs of a label file from the object store.
    DeleteBlobs {
        label_file: PathBuf,
        #[arg(long, default_value = "")]
        key_prefix: String,
    },
    /// Substitute characters in fields of a label file, in place.
    FixLabels {
        file: PathBuf,
        /// Characters to replace.
        #[arg(short, long)]
        r#match: String,
        /// Replacement.
        #[arg(short, long)]
        substitute: String,
        /// Fields where the substitution happens.
        #[arg(short, long, num_args = 1.., required = true)]
        field: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting picture-catalog");

    match cli.command {
        Command::Upload {
            label_file,
            key_prefix,
            overwrite,
            pictures,
            index,
        } => {
            let store = storage_clients::from_config(&config).await?;
            let search = ElasticsearchSearchIndex::new(&config)?;
            let options = UploadOptions {
                bucket: config.bucket.clone(),
                index_name: index.unwrap_or_else(|| config.index_name.clone()),
                key_prefix,
                overwrite,
                picture_root: pictures,
            };
            let counts = CatalogUploader::new(store.as_ref(), &search)
                .upload_file(&label_file, &options)
                .await?;
            println!(
                "{} blob(s) stored, {} document(s) indexed, {} failure(s)",
                counts.blob_success, counts.index_success, counts.failed
            );
        }
        Command::Search {
            query_file,
            output,
            index,
        } => {
            let search = ElasticsearchSearchIndex::new(&config)?;
            let query = QueryDescription::from_file(&query_file)?;
            let index_name = index.unwrap_or_else(|| config.index_name.clone());
            let pictures = CatalogQueryEngine::new(&search, config.max_results)
                .find_pictures(&query, &index_name, output.as_deref())
                .await?;
            if output.is_none() {
                println!("{}", serde_json::to_string_pretty(&pictures)?);
            }
        }
        Command::Download {
            query_file,
            picture_dir,
            force,
            index,
        } => {
            let store = storage_clients::from_config(&config).await?;
            let search = ElasticsearchSearchIndex::new(&config)?;
            let query = QueryDescription::from_file(&query_file)?;
            let index_name = index.unwrap_or_else(|| config.index_name.clone());
            let engine = CatalogQueryEngine::new(&search, config.max_results);
            let report = ReconciliationDownloader::new(engine, store.as_ref())
                .search_and_download(&query, &index_name, &picture_dir, force, &StdinConfirm)
                .await?;
            println!(
                "{} picture(s) matched, {} downloaded to {:?}, {} failed",
                report.matched,
                report.downloaded.len(),
                picture_dir,
                report.failed.len()
            );
        }
        Command::CreateIndex {
            index,
            current_write_index,
        } => {
            let search = ElasticsearchSearchIndex::new(&config)?;
            let name = index_admin::create_catalog_index(
                &search,
                &config.index_name,
                index.as_deref(),
                current_write_index.as_deref(),
            )
            .await?;
            println!(
                "Index \"{}\" created and defined as the new write index for alias \"{}\"",
                name, config.index_name
            );
        }
        Command::DeleteIndex { index } => {
            let search = ElasticsearchSearchIndex::new(&config)?;
            let acknowledged = index_admin::delete_index(&search, &index).await?;
            println!("Index \"{}\" deleted (acknowledged: {})", index, acknowledged);
        }
        Command::DeleteBlobs {
            label_file,
            key_prefix,
        } => {
            let store = storage_clients::from_config(&config).await?;
            let batch = LabelBatch::load(&label_file)?;
            let status =
                uploader::delete_blobs(store.as_ref(), &batch, &config.bucket, &key_prefix).await?;
            println!(
                "Delete returned {}: {} deleted, {} failed",
                status.status_code,
                status.deleted,
                status.failed.len()
            );
        }
        Command::FixLabels {
            file,
            r#match,
            substitute,
            field,
        } => {
            let count = label_fix::fix_label_file(&file, &r#match, &substitute, &field)?;
            println!("{} substitution made", count);
        }
    }

    info!("picture-catalog finished");

    Ok(())
}
