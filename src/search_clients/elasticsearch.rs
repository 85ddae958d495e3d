use crate::config::AppConfig;
use crate::error::AppError;
use crate::metadata::CatalogDocument;
use crate::query::QueryDescription;
use crate::search::{IndexSpec, SearchIndex, SearchResponse, TotalRelation};
use async_trait::async_trait;
use elasticsearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts},
    CreateParts, Elasticsearch, IndexParts, SearchParts,
};
use serde_json::{json, Value};
use url::Url;

pub struct ElasticsearchSearchIndex {
    client: Elasticsearch,
}

impl ElasticsearchSearchIndex {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        log::debug!("Creating Elasticsearch client for URL: {}", config.elasticsearch_url);
        let url = Url::parse(&config.elasticsearch_url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;
        let client = Elasticsearch::new(transport);
        log::trace!("Elasticsearch client created successfully.");
        Ok(Self { client })
    }
}

/// Mapping shared by every catalog index: everything is an exact-match keyword.
pub fn catalog_mappings() -> Value {
    json!({
        "properties": {
            "img_id": { "type": "keyword" },
            "file_name": { "type": "keyword" },
            "location": { "type": "keyword" },
            "event": { "type": "keyword" },
            "timestamp": { "type": "keyword" }
        }
    })
}

async fn check_status(response: Response, what: &str) -> Result<Response, AppError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let reason = response.text().await.unwrap_or_default();
    log::debug!("Elasticsearch {} returned {}: {}", what, code, reason);
    Err(match code {
        404 => AppError::NotFound(format!("{}: {}", what, reason)),
        409 => AppError::Conflict(format!("{}: {}", what, reason)),
        400 if reason.contains("resource_already_exists_exception") => {
            AppError::Conflict(format!("{}: {}", what, reason))
        }
        _ => AppError::SearchBackend { status: code, reason },
    })
}

fn parse_search_body(body: &Value) -> Result<SearchResponse, AppError> {
    let mut documents = Vec::new();
    if let Some(hits) = body["hits"]["hits"].as_array() {
        for hit in hits {
            if let Some(source) = hit.get("_source") {
                let doc: CatalogDocument = serde_json::from_value(source.clone())?;
                documents.push(doc);
            }
        }
    }

    let total = &body["hits"]["total"];
    let (total, relation) = match total {
        Value::Object(_) => {
            let relation = match total["relation"].as_str() {
                Some("eq") | None => TotalRelation::Eq,
                Some(_) => TotalRelation::Gte,
            };
            (total["value"].as_u64().unwrap_or(documents.len() as u64), relation)
        }
        // Pre-7 servers report a bare number, which is always exact.
        Value::Number(n) => (n.as_u64().unwrap_or(0), TotalRelation::Eq),
        _ => (documents.len() as u64, TotalRelation::Eq),
    };

    Ok(SearchResponse {
        total,
        relation,
        documents,
    })
}

#[async_trait]
impl SearchIndex for ElasticsearchSearchIndex {
    async fn index_document(
        &self,
        index: &str,
        doc: &CatalogDocument,
        overwrite: bool,
    ) -> Result<(), AppError> {
        let doc_id = doc.doc_id();
        log::debug!(
            "Indexing document {} into '{}' (overwrite: {})",
            doc_id,
            index,
            overwrite
        );

        let response = if overwrite {
            self.client
                .index(IndexParts::IndexId(index, &doc_id))
                .body(doc)
                .send()
                .await?
        } else {
            self.client
                .create(CreateParts::IndexId(index, &doc_id))
                .body(doc)
                .send()
                .await?
        };
        check_status(response, &format!("index {}/{}", index, doc_id)).await?;
        Ok(())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), AppError> {
        log::info!("Creating Elasticsearch index '{}'", spec.name);

        let mut body = json!({ "mappings": catalog_mappings() });
        // Binding a second write index to the alias is rejected, so when a write
        // index is already in place the switch happens in one alias update below.
        let switch_later = spec.alias.is_some() && spec.current_write_index.is_some();
        if let (Some(alias), false) = (&spec.alias, switch_later) {
            body["aliases"] = json!({ alias.as_str(): { "is_write_index": spec.is_write_index } });
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&spec.name))
            .body(body)
            .send()
            .await?;
        check_status(response, &format!("create index {}", spec.name)).await?;

        if let (Some(alias), Some(current)) = (&spec.alias, &spec.current_write_index) {
            log::info!(
                "Moving write alias '{}' from '{}' to '{}'",
                alias,
                current,
                spec.name
            );
            let response = self
                .client
                .indices()
                .update_aliases()
                .body(json!({
                    "actions": [
                        { "add": { "index": current, "alias": alias, "is_write_index": false } },
                        { "add": { "index": spec.name, "alias": alias, "is_write_index": spec.is_write_index } }
                    ]
                }))
                .send()
                .await?;
            check_status(response, &format!("update alias {}", alias)).await?;
        }

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<bool, AppError> {
        log::info!("Deleting Elasticsearch index '{}'", name);
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await?;
        let response = check_status(response, &format!("delete index {}", name)).await?;
        let body = response.json::<Value>().await?;
        Ok(body["acknowledged"].as_bool().unwrap_or(false))
    }

    async fn search(
        &self,
        index: &str,
        query: &QueryDescription,
        default_size: usize,
    ) -> Result<SearchResponse, AppError> {
        let search_body = query.to_elasticsearch(default_size);
        log::debug!("Searching Elasticsearch index '{}'", index);
        log::trace!("Search body: {}", search_body);

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(search_body)
            .send()
            .await?;
        let response = check_status(response, &format!("search {}", index)).await?;

        let body = response.json::<Value>().await?;
        log::trace!("Elasticsearch search response: {:?}", body);
        let result = parse_search_body(&body)?;
        log::debug!(
            "Found {} document(s) in '{}' (total {}, {:?})",
            result.documents.len(),
            index,
            result.total,
            result.relation
        );
        Ok(result)
    }
}
