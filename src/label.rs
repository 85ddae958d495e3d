use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Picture identifier as written by the labeling tools: either a number or a string.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum ImgId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ImgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImgId::Int(id) => write!(f, "{}", id),
            ImgId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ImgId {
    fn from(id: i64) -> Self {
        ImgId::Int(id)
    }
}

impl From<&str> for ImgId {
    fn from(id: &str) -> Self {
        ImgId::Text(id.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Label {
    pub event: String,
    pub img_id: ImgId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub file_name: String,
    /// Object-store location of the blob, assigned by the uploader.
    #[serde(default)]
    pub location: String,
}

impl Label {
    fn validate(&self, position: usize) -> Result<(), AppError> {
        if self.event.trim().is_empty() {
            return Err(AppError::InvalidLabel(format!("record {}: empty event", position)));
        }
        if self.file_name.trim().is_empty() {
            return Err(AppError::InvalidLabel(format!(
                "record {} (img_id {}): empty file_name",
                position, self.img_id
            )));
        }
        if let ImgId::Text(id) = &self.img_id {
            if id.trim().is_empty() {
                return Err(AppError::InvalidLabel(format!("record {}: empty img_id", position)));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Label>),
    One(Box<Label>),
}

/// A batch of labels loaded from one file.
#[derive(Debug, Clone)]
pub struct LabelBatch {
    labels: Vec<Label>,
    source: PathBuf,
}

impl LabelBatch {
    /// Reads a label file holding either a single label object or an array of them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        log::debug!("Loading labels from {:?}", path);
        let raw = std::fs::read_to_string(path)?;
        let labels = Self::parse(&raw)?;
        log::info!("Loaded {} label(s) from {:?}", labels.len(), path);
        Ok(Self {
            labels,
            source: path.to_path_buf(),
        })
    }

    pub fn from_labels(labels: Vec<Label>, source: impl Into<PathBuf>) -> Result<Self, AppError> {
        if labels.is_empty() {
            return Err(AppError::InvalidLabel("label batch is empty".into()));
        }
        for (position, label) in labels.iter().enumerate() {
            label.validate(position)?;
        }
        Ok(Self {
            labels,
            source: source.into(),
        })
    }

    fn parse(raw: &str) -> Result<Vec<Label>, AppError> {
        let labels = match serde_json::from_str::<OneOrMany>(raw) {
            Ok(OneOrMany::Many(labels)) => labels,
            Ok(OneOrMany::One(label)) => vec![*label],
            // Untagged errors are opaque; reparse with the shape the input has.
            Err(_) if raw.trim_start().starts_with('[') => {
                serde_json::from_str::<Vec<Label>>(raw)
                    .map_err(|e| AppError::InvalidLabel(e.to_string()))?
            }
            Err(_) => serde_json::from_str::<Label>(raw)
                .map(|label| vec![label])
                .map_err(|e| AppError::InvalidLabel(e.to_string()))?,
        };
        if labels.is_empty() {
            return Err(AppError::InvalidLabel("label file holds no record".into()));
        }
        for (position, label) in labels.iter().enumerate() {
            label.validate(position)?;
        }
        Ok(labels)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Directory the pictures of this batch are read from when no other root is given.
    pub fn default_picture_root(&self) -> PathBuf {
        self.source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_array_of_labels() {
        let file = write_temp(
            r#"[
                {"event": "run_1", "img_id": 1, "file_name": "1.jpg", "timestamp": "20200101T10-00-00-000000"},
                {"event": "run_1", "img_id": "b2", "file_name": "b2.jpg", "direction": 3}
            ]"#,
        );
        let batch = LabelBatch::load(file.path()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.labels()[0].img_id, ImgId::Int(1));
        assert_eq!(batch.labels()[1].img_id, ImgId::Text("b2".into()));
        assert_eq!(batch.labels()[1].timestamp, None);
        assert!(batch.labels()[0].location.is_empty());
    }

    #[test]
    fn loads_single_object() {
        let file = write_temp(r#"{"event": "run_1", "img_id": 7, "file_name": "7.jpg"}"#);
        let batch = LabelBatch::load(file.path()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.labels()[0].img_id.to_string(), "7");
    }

    #[test]
    fn rejects_missing_required_field() {
        let file = write_temp(r#"[{"event": "run_1", "img_id": 7}]"#);
        let err = LabelBatch::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::InvalidLabel(_)));
    }

    #[test]
    fn malformed_array_reports_the_record_error() {
        let file = write_temp(
            r#"[
                {"event": "run_1", "img_id": 1, "file_name": "1.jpg"},
                {"event": "run_1", "img_id": 2}
            ]"#,
        );
        match LabelBatch::load(file.path()) {
            Err(AppError::InvalidLabel(message)) => {
                assert!(message.contains("file_name"), "{}", message);
                assert!(!message.contains("expected struct"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn malformed_object_reports_the_record_error() {
        let file = write_temp(r#"{"event": "run_1", "file_name": "1.jpg"}"#);
        match LabelBatch::load(file.path()) {
            Err(AppError::InvalidLabel(message)) => {
                assert!(message.contains("img_id"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_array() {
        let file = write_temp("[]");
        assert!(matches!(
            LabelBatch::load(file.path()),
            Err(AppError::InvalidLabel(_))
        ));
    }

    #[test]
    fn rejects_blank_file_name() {
        let file = write_temp(r#"[{"event": "run_1", "img_id": 7, "file_name": "  "}]"#);
        assert!(matches!(
            LabelBatch::load(file.path()),
            Err(AppError::InvalidLabel(_))
        ));
    }

    #[test]
    fn picture_root_is_label_file_directory() {
        let batch = LabelBatch::from_labels(
            vec![Label {
                event: "e".into(),
                img_id: ImgId::Int(1),
                timestamp: None,
                file_name: "1.jpg".into(),
                location: String::new(),
            }],
            "/data/session/labels.json",
        )
        .unwrap();
        assert_eq!(batch.default_picture_root(), PathBuf::from("/data/session"));
    }
}
