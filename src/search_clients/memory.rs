use crate::error::AppError;
use crate::metadata::CatalogDocument;
use crate::query::QueryDescription;
use crate::search::{IndexSpec, SearchIndex, SearchResponse, TotalRelation};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Default `track_total_hits` limit of Elasticsearch.
pub const DEFAULT_TOTAL_HITS_CAP: u64 = 10_000;

#[derive(Debug, Default)]
struct Alias {
    members: BTreeSet<String>,
    write_index: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, BTreeMap<String, CatalogDocument>>,
    aliases: BTreeMap<String, Alias>,
}

impl State {
    fn write_target(&mut self, name: &str) -> Result<String, AppError> {
        if let Some(alias) = self.aliases.get(name) {
            return match (&alias.write_index, alias.members.len()) {
                (Some(index), _) => Ok(index.clone()),
                (None, 1) => Ok(alias.members.iter().next().cloned().unwrap_or_default()),
                _ => Err(AppError::SearchBackend {
                    status: 400,
                    reason: format!("no write index is defined for alias [{}]", name),
                }),
            };
        }
        // Writing to an unknown concrete index creates it.
        self.indices.entry(name.to_string()).or_default();
        Ok(name.to_string())
    }

    fn read_targets(&self, name: &str) -> Result<Vec<String>, AppError> {
        if let Some(alias) = self.aliases.get(name) {
            return Ok(alias.members.iter().cloned().collect());
        }
        if self.indices.contains_key(name) {
            return Ok(vec![name.to_string()]);
        }
        Err(AppError::NotFound(format!("no such index [{}]", name)))
    }
}

/// In-process search index with alias and write-index semantics close to
/// Elasticsearch. Results come back ordered by index name, then document id.
#[derive(Debug)]
pub struct MemorySearchIndex {
    state: Mutex<State>,
    unavailable: AtomicBool,
    total_hits_cap: u64,
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::with_total_hits_cap(DEFAULT_TOTAL_HITS_CAP)
    }

    pub fn with_total_hits_cap(total_hits_cap: u64) -> Self {
        Self {
            state: Mutex::new(State::default()),
            unavailable: AtomicBool::new(false),
            total_hits_cap,
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn document_count(&self, index: &str) -> usize {
        let state = self.lock();
        state
            .read_targets(index)
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|t| state.indices.get(t))
                    .map(BTreeMap::len)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn write_index_of(&self, alias: &str) -> Option<String> {
        self.lock().aliases.get(alias).and_then(|a| a.write_index.clone())
    }

    pub fn alias_members(&self, alias: &str) -> Vec<String> {
        self.lock()
            .aliases
            .get(alias)
            .map(|a| a.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("memory search index is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index_document(
        &self,
        index: &str,
        doc: &CatalogDocument,
        overwrite: bool,
    ) -> Result<(), AppError> {
        self.check_available()?;
        let mut state = self.lock();
        let target = state.write_target(index)?;
        let docs = state.indices.entry(target.clone()).or_default();
        let doc_id = doc.doc_id();
        if !overwrite && docs.contains_key(&doc_id) {
            return Err(AppError::Conflict(format!(
                "[{}]: version conflict, document already exists in [{}]",
                doc_id, target
            )));
        }
        docs.insert(doc_id, doc.clone());
        Ok(())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), AppError> {
        self.check_available()?;
        let mut state = self.lock();
        if state.indices.contains_key(&spec.name) || state.aliases.contains_key(&spec.name) {
            return Err(AppError::Conflict(format!("index [{}] already exists", spec.name)));
        }
        if let Some(alias) = &spec.alias {
            if state.indices.contains_key(alias) {
                return Err(AppError::SearchBackend {
                    status: 400,
                    reason: format!("an index exists with the same name as the alias [{}]", alias),
                });
            }
            if let Some(current) = &spec.current_write_index {
                if !state.indices.contains_key(current) {
                    return Err(AppError::NotFound(format!("no such index [{}]", current)));
                }
            }
        }

        state.indices.insert(spec.name.clone(), BTreeMap::new());
        if let Some(alias_name) = &spec.alias {
            let alias = state.aliases.entry(alias_name.clone()).or_default();
            if let Some(current) = &spec.current_write_index {
                alias.members.insert(current.clone());
                if alias.write_index.as_deref() == Some(current.as_str()) {
                    alias.write_index = None;
                }
            }
            alias.members.insert(spec.name.clone());
            if spec.is_write_index {
                alias.write_index = Some(spec.name.clone());
            }
        }
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<bool, AppError> {
        self.check_available()?;
        let mut state = self.lock();
        if state.indices.remove(name).is_none() {
            return Err(AppError::NotFound(format!("no such index [{}]", name)));
        }
        for alias in state.aliases.values_mut() {
            alias.members.remove(name);
            if alias.write_index.as_deref() == Some(name) {
                alias.write_index = None;
            }
        }
        state.aliases.retain(|_, alias| !alias.members.is_empty());
        Ok(true)
    }

    async fn search(
        &self,
        index: &str,
        query: &QueryDescription,
        default_size: usize,
    ) -> Result<SearchResponse, AppError> {
        self.check_available()?;
        let state = self.lock();
        let targets = state.read_targets(index)?;

        let matching: Vec<&CatalogDocument> = targets
            .iter()
            .filter_map(|t| state.indices.get(t))
            .flat_map(|docs| docs.values())
            .filter(|doc| query.matches(doc))
            .collect();

        let found = matching.len() as u64;
        let (total, relation) = if found > self.total_hits_cap {
            (self.total_hits_cap, TotalRelation::Gte)
        } else {
            (found, TotalRelation::Eq)
        };
        let documents = matching
            .into_iter()
            .take(query.page_size(default_size))
            .cloned()
            .collect();

        Ok(SearchResponse {
            total,
            relation,
            documents,
        })
    }
}
