mod common;

use chrono::Local;
use common::{session, standard_session, BUCKET, INDEX};
use picture_catalog::label::LabelBatch;
use picture_catalog::query::QueryDescription;
use picture_catalog::search::SearchIndex;
use picture_catalog::search_clients::memory::MemorySearchIndex;
use picture_catalog::storage_clients::memory::MemoryObjectStore;
use picture_catalog::uploader::{delete_blobs, CatalogUploader, UploadOptions};
use std::path::Path;

fn options(key_prefix: Option<&str>, overwrite: bool) -> UploadOptions {
    UploadOptions {
        bucket: BUCKET.to_string(),
        index_name: INDEX.to_string(),
        key_prefix: key_prefix.map(str::to_string),
        overwrite,
        picture_root: None,
    }
}

async fn upload(
    store: &MemoryObjectStore,
    index: &MemorySearchIndex,
    label_file: &Path,
    options: &UploadOptions,
) -> (usize, usize, usize) {
    CatalogUploader::new(store, index)
        .upload_file(label_file, options)
        .await
        .unwrap()
        .as_tuple()
}

#[tokio::test]
async fn fresh_batch_counts_missing_picture_once() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    let counts = upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert_eq!(counts, (5, 5, 1));
    assert_eq!(store.len(), 5);
    assert!(store.contains("patate-pictures/1"));
    assert!(!store.contains("patate-pictures/6"));
    assert_eq!(index.document_count(INDEX), 5);
}

#[tokio::test]
async fn overwrite_rewrites_everything() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    let counts = upload(&store, &index, &session.label_file, &options(Some(""), true)).await;
    assert_eq!(counts, (5, 5, 1));
}

#[tokio::test]
async fn existing_blobs_still_reach_a_wiped_index() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert!(index.delete_index(INDEX).await.unwrap());

    let counts = upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert_eq!(counts, (0, 5, 6));
    assert_eq!(index.document_count(INDEX), 5);
}

#[tokio::test]
async fn rerun_without_overwrite_fails_in_both_stores() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    let counts = upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert_eq!(counts, (0, 0, 11));
}

#[tokio::test]
async fn irregular_key_prefix_is_normalized() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    upload(&store, &index, &session.label_file, &options(Some(""), false)).await;

    let mut weird = options(Some("/weird/path//"), false);
    weird.bucket = format!("{}/", BUCKET);
    let counts = upload(&store, &index, &session.label_file, &weird).await;
    // New blob keys, but the documents are already indexed under the same ids.
    assert_eq!(counts, (5, 0, 6));
    assert!(store.contains("patate-pictures/weird/path/1"));
    assert!(!store.contains("patate-pictures//weird/path/1"));
}

#[tokio::test]
async fn single_label_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("solo.jpg"), b"jpeg").unwrap();
    let label_file = dir.path().join("single_label.json");
    std::fs::write(
        &label_file,
        r#"{"event": "event_test", "img_id": "solo", "file_name": "solo.jpg"}"#,
    )
    .unwrap();

    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();
    let counts = upload(&store, &index, &label_file, &options(Some(""), true)).await;
    assert_eq!(counts, (1, 1, 0));
}

#[tokio::test]
async fn unreachable_object_store_indexes_nothing() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    store.set_unavailable(true);
    let index = MemorySearchIndex::new();

    let counts = upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert_eq!(counts, (0, 0, 6));
    assert_eq!(index.document_count(INDEX), 0);
}

#[tokio::test]
async fn unreachable_index_leaves_orphan_blobs() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();
    index.set_unavailable(true);

    let counts = upload(&store, &index, &session.label_file, &options(Some(""), false)).await;
    assert_eq!(counts, (5, 0, 6));
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn derived_prefix_groups_batch_under_event_and_date() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    let counts = upload(&store, &index, &session.label_file, &options(None, false)).await;
    assert_eq!(counts, (5, 5, 1));

    let location = format!("{}/event_test/{}", BUCKET, Local::now().format("%Y%m%d"));
    assert!(store.contains(&format!("{}/3", location)));

    let found = index
        .search(INDEX, &QueryDescription::default(), 100)
        .await
        .unwrap();
    assert!(found.documents.iter().all(|doc| doc.location == location));
}

#[tokio::test]
async fn invalid_event_falls_back_to_bucket_root() {
    let session = session("event test", &[1, 2], &[]);
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();

    let counts = upload(&store, &index, &session.label_file, &options(None, false)).await;
    assert_eq!(counts, (2, 2, 0));
    assert!(store.contains("patate-pictures/1"));
}

#[tokio::test]
async fn delete_blobs_of_a_batch() {
    let session = standard_session();
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();
    upload(&store, &index, &session.label_file, &options(Some("/weird/path//"), false)).await;
    assert_eq!(store.len(), 5);

    let batch = LabelBatch::load(&session.label_file).unwrap();
    let status = delete_blobs(&store, &batch, BUCKET, "/weird/path//")
        .await
        .unwrap();
    assert_eq!(status.status_code, 200);
    assert!(store.is_empty());
}

#[tokio::test]
async fn unreadable_label_file_is_an_error() {
    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();
    let result = CatalogUploader::new(&store, &index)
        .upload_file("/nonexistent/labels.json", &options(Some(""), false))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn mixed_events_fall_back_to_bucket_root() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.jpg", "b.jpg"] {
        std::fs::write(dir.path().join(name), b"jpeg").unwrap();
    }
    let label_file = dir.path().join("labels.json");
    std::fs::write(
        &label_file,
        r#"[{"event": "event_test", "img_id": 1, "file_name": "a.jpg"},
            {"event": "event_test_2", "img_id": 2, "file_name": "b.jpg"}]"#,
    )
    .unwrap();

    let store = MemoryObjectStore::new();
    let index = MemorySearchIndex::new();
    let counts = upload(&store, &index, &label_file, &options(None, false)).await;
    assert_eq!(counts, (2, 2, 0));
    assert!(store.contains("patate-pictures/2"));
}
