use crate::error::AppError;
use crate::metadata::CatalogDocument;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

pub const QUERYABLE_FIELDS: &[&str] = &["img_id", "event", "file_name", "location", "timestamp"];

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
}

/// Declarative filter over catalog documents. Clauses are AND-ed; an empty
/// description matches everything.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QueryDescription {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub term: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terms: BTreeMap<String, Vec<Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prefix: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub range: BTreeMap<String, RangeBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl QueryDescription {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        log::debug!("Reading query description from {:?}", path);
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let query: Self =
            serde_json::from_str(raw).map_err(|e| AppError::InvalidQuery(e.to_string()))?;
        query.validate()?;
        Ok(query)
    }

    /// Matches any of the given ids.
    pub fn for_img_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let ids = ids
            .into_iter()
            .map(|id| serde_json::to_value(id).unwrap_or(Value::Null))
            .collect();
        let mut query = Self::default();
        query.terms.insert("img_id".into(), ids);
        query
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let fields = self
            .term
            .keys()
            .chain(self.terms.keys())
            .chain(self.prefix.keys())
            .chain(self.range.keys());
        for field in fields {
            if !QUERYABLE_FIELDS.contains(&field.as_str()) {
                return Err(AppError::InvalidQuery(format!(
                    "unknown field {:?}, expected one of {:?}",
                    field, QUERYABLE_FIELDS
                )));
            }
        }
        for (field, bounds) in &self.range {
            if bounds.gte.is_none() && bounds.gt.is_none() && bounds.lte.is_none() && bounds.lt.is_none()
            {
                return Err(AppError::InvalidQuery(format!("range on {:?} has no bound", field)));
            }
        }
        if self.size == Some(0) {
            return Err(AppError::InvalidQuery("size must be positive".into()));
        }
        Ok(())
    }

    pub fn is_match_all(&self) -> bool {
        self.term.is_empty() && self.terms.is_empty() && self.prefix.is_empty() && self.range.is_empty()
    }

    pub fn page_size(&self, default_size: usize) -> usize {
        self.size.unwrap_or(default_size)
    }

    /// Search request body for Elasticsearch.
    pub fn to_elasticsearch(&self, default_size: usize) -> Value {
        let size = self.page_size(default_size);
        if self.is_match_all() {
            return json!({ "query": { "match_all": {} }, "size": size });
        }

        let mut filters = Vec::new();
        for (field, value) in &self.term {
            filters.push(json!({ "term": { field: value } }));
        }
        for (field, values) in &self.terms {
            filters.push(json!({ "terms": { field: values } }));
        }
        for (field, prefix) in &self.prefix {
            filters.push(json!({ "prefix": { field: prefix } }));
        }
        for (field, bounds) in &self.range {
            filters.push(json!({ "range": { field: bounds } }));
        }

        json!({
            "query": { "bool": { "filter": filters } },
            "size": size
        })
    }

    /// Evaluates the description against one document, with keyword semantics.
    pub fn matches(&self, doc: &CatalogDocument) -> bool {
        let field = |name: &str| field_text(doc, name);

        self.term
            .iter()
            .all(|(name, value)| field(name.as_str()).as_deref() == Some(value_text(value).as_str()))
            && self.terms.iter().all(|(name, values)| {
                field(name.as_str()).map_or(false, |text| values.iter().any(|v| value_text(v) == text))
            })
            && self
                .prefix
                .iter()
                .all(|(name, prefix)| field(name.as_str()).map_or(false, |text| text.starts_with(prefix.as_str())))
            && self
                .range
                .iter()
                .all(|(name, bounds)| field(name.as_str()).map_or(false, |text| in_range(&text, bounds)))
    }
}

fn field_text(doc: &CatalogDocument, name: &str) -> Option<String> {
    match name {
        "img_id" => Some(doc.img_id.to_string()),
        "event" => doc.event.clone(),
        "file_name" => Some(doc.file_name.clone()),
        "location" => Some(doc.location.clone()),
        "timestamp" => doc.timestamp.clone(),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(text: &str, bound: &Value) -> Ordering {
    let bound_text = value_text(bound);
    match (text.parse::<f64>(), bound_text.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => text.cmp(bound_text.as_str()),
    }
}

fn in_range(text: &str, bounds: &RangeBounds) -> bool {
    bounds.gte.as_ref().map_or(true, |b| compare(text, b) != Ordering::Less)
        && bounds.gt.as_ref().map_or(true, |b| compare(text, b) == Ordering::Greater)
        && bounds.lte.as_ref().map_or(true, |b| compare(text, b) != Ordering::Greater)
        && bounds.lt.as_ref().map_or(true, |b| compare(text, b) == Ordering::Less)
}
