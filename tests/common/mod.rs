#![allow(dead_code)]

use picture_catalog::label::ImgId;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BUCKET: &str = "patate-pictures";
pub const INDEX: &str = "test_index";

/// A labeling session on disk: `labels.json` plus picture files next to it.
pub struct Session {
    pub dir: TempDir,
    pub label_file: PathBuf,
}

impl Session {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Writes `labels.json` for `ids`, with a picture file for each id except those in `without_picture`.
pub fn session(event: &str, ids: &[i64], without_picture: &[i64]) -> Session {
    let dir = tempfile::tempdir().unwrap();
    let labels: Vec<_> = ids
        .iter()
        .map(|id| {
            json!({
                "event": event,
                "img_id": id,
                "timestamp": format!("20200205T10-00-0{}-000000", id % 10),
                "file_name": format!("{}_{}.jpg", event, id),
                "direction": 3
            })
        })
        .collect();
    for id in ids.iter().filter(|id| !without_picture.contains(id)) {
        std::fs::write(
            dir.path().join(format!("{}_{}.jpg", event, id)),
            format!("jpeg bytes of {}", id),
        )
        .unwrap();
    }
    let label_file = dir.path().join("labels.json");
    std::fs::write(&label_file, serde_json::to_string_pretty(&labels).unwrap()).unwrap();
    Session { dir, label_file }
}

/// Five good labels and one whose picture file is missing.
pub fn standard_session() -> Session {
    session("event_test", &[1, 2, 3, 4, 5, 6], &[6])
}

pub fn img_ids(ids: &[i64]) -> Vec<ImgId> {
    ids.iter().map(|id| ImgId::Int(*id)).collect()
}
