// src/metadata.rs

use crate::label::{ImgId, Label};
use serde::{Deserialize, Serialize};

/// What the search index holds for one picture.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogDocument {
    pub img_id: ImgId,
    pub file_name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl CatalogDocument {
    pub fn doc_id(&self) -> String {
        self.img_id.to_string()
    }

    pub fn picture_ref(&self) -> PictureRef {
        PictureRef {
            img_id: self.img_id.clone(),
            file_name: self.file_name.clone(),
            location: self.location.clone(),
        }
    }
}

impl From<&Label> for CatalogDocument {
    fn from(label: &Label) -> Self {
        Self {
            img_id: label.img_id.clone(),
            file_name: label.file_name.clone(),
            location: label.location.clone(),
            event: Some(label.event.clone()),
            timestamp: label.timestamp.clone(),
        }
    }
}

/// A query hit: enough to find the blob and name the local file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureRef {
    pub img_id: ImgId,
    pub file_name: String,
    pub location: String,
}

impl PictureRef {
    pub fn object_path(&self) -> String {
        crate::key_prefix::object_path(&self.location, &self.img_id)
    }
}
