use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::Hit;

/// Fields the full-text box matches against.
pub const SEARCH_FIELDS: [&str; 35] = [
    "antibody_uuid",
    "antibody_hubmap_id",
    "protocol_doi",
    "manuscript_doi",
    "uniprot_accession_number",
    "target_symbol",
    "target_aliases",
    "rrid",
    "host",
    "clonality",
    "clone_id",
    "vendor_name",
    "catalog_number",
    "lot_number",
    "recombinant",
    "organ",
    "organ_uberon_id",
    "omap_id",
    "antigen_retrieval",
    "hgnc_id",
    "isotype",
    "concentration_value",
    "dilution_factor",
    "conjugate",
    "method",
    "tissue_preservation",
    "cycle_number",
    "fluorescent_reporter",
    "author_orcids",
    "vendor_affiliation",
    "created_by_user_displayname",
    "created_by_user_email",
    "avr_pdf_filename",
    "previous_version_id",
    "next_version_id",
];

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("search backend answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode search response: {source}")]
    Decode {
        #[source]
        source: reqwest::Error,
    },
}

/// A search request body in the backend's query DSL.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    body: Value,
}

impl SearchQuery {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Full-text query over [`SEARCH_FIELDS`], or every report when `text`
    /// is blank. Superseded reports are always excluded.
    pub fn from_text(text: &str, from: u64, size: u64) -> Self {
        let text = text.trim();
        let must = if text.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({
                "multi_match": {
                    "query": text,
                    "fields": &SEARCH_FIELDS[..],
                    "analyzer": "standard"
                }
            })
        };
        Self::new(json!({
            "query": {
                "bool": {
                    "must": [must],
                    "must_not": [{ "exists": { "field": "next_version_id" } }]
                }
            },
            "from": from,
            "size": size
        }))
    }

    /// Same query, different window.
    pub fn with_page(&self, from: u64, size: u64) -> Self {
        let mut body = self.body.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert("from".to_string(), json!(from));
            map.insert("size".to_string(), json!(size));
        }
        Self { body }
    }

    /// Restrict the returned document fields.
    pub fn with_source(&self, fields: &[&str]) -> Self {
        let mut body = self.body.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert("_source".to_string(), json!(fields));
        }
        Self { body }
    }

    pub fn from(&self) -> u64 {
        self.body.get("from").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn size(&self) -> u64 {
        self.body.get("size").and_then(Value::as_u64).unwrap_or(0)
    }

    pub fn source_fields(&self) -> Vec<String> {
        self.body
            .get("_source")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

// Newer backends report `{ "value": n, "relation": "eq" }`, older ones a bare
// number.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Tracked { value: u64 },
    Plain(u64),
}

impl Default for Total {
    fn default() -> Self {
        Total::Plain(0)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Total,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    hits: HitsEnvelope,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Every match of the query, not just this page.
    pub total: u64,
    pub hits: Vec<Hit>,
}

impl SearchResponse {
    pub fn new(total: u64, hits: Vec<Hit>) -> Self {
        Self { total, hits }
    }

    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let envelope: ResponseEnvelope = serde_json::from_value(value)?;
        Ok(envelope.into())
    }
}

impl From<ResponseEnvelope> for SearchResponse {
    fn from(envelope: ResponseEnvelope) -> Self {
        let total = match envelope.hits.total {
            Total::Tracked { value } => value,
            Total::Plain(value) => value,
        };
        Self {
            total,
            hits: envelope.hits.hits,
        }
    }
}

/// Anything that can answer a [`SearchQuery`].
#[allow(async_fn_in_trait)]
pub trait SearchBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;
}

#[derive(Clone, Debug)]
pub struct ElasticClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ElasticClient {
    pub fn new(
        search_url: &str,
        index: &str,
        timeout_seconds: u64,
        proxy: Option<&str>,
    ) -> Result<Self, SearchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("avrsearch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_seconds));

        if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| SearchError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::HttpClientBuild { source: e })?;

        Ok(Self {
            client,
            endpoint: search_endpoint(search_url, index),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn search_endpoint(search_url: &str, index: &str) -> String {
    format!(
        "{}/{}/_search",
        search_url.trim().trim_end_matches('/'),
        index.trim().trim_matches('/')
    )
}

impl SearchBackend for ElasticClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        debug!(url = %self.endpoint, from = query.from(), size = query.size(), "search request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(query.body())
            .send()
            .await
            .map_err(|e| SearchError::Request {
                url: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let envelope: ResponseEnvelope = response
            .json()
            .await
            .map_err(|e| SearchError::Decode { source: e })?;
        Ok(envelope.into())
    }
}

/// The current query plus the total reported by its last answer.
#[derive(Clone, Debug)]
pub struct SearchSession {
    query: SearchQuery,
    total: Option<u64>,
}

impl SearchSession {
    pub fn new(query: SearchQuery) -> Self {
        Self { query, total: None }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Run the current query and remember its total.
    pub async fn run<B: SearchBackend>(&mut self, backend: &B) -> Result<SearchResponse, SearchError> {
        let response = backend.search(&self.query).await?;
        info!(total = response.total, page = response.hits.len(), "search answered");
        self.total = Some(response.total);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use std::cell::RefCell;

    struct Fixed {
        response: SearchResponse,
        seen: RefCell<Vec<SearchQuery>>,
    }

    impl SearchBackend for Fixed {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            self.seen.borrow_mut().push(query.clone());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn blank_text_matches_everything_but_superseded_reports() {
        let q = SearchQuery::from_text("  ", 0, 20);
        let body = q.body();
        assert_eq!(body["query"]["bool"]["must"][0], json!({ "match_all": {} }));
        assert_eq!(
            body["query"]["bool"]["must_not"][0],
            json!({ "exists": { "field": "next_version_id" } })
        );
        assert_eq!(q.size(), 20);
        assert_eq!(q.from(), 0);
    }

    #[test]
    fn text_becomes_multi_match() {
        let q = SearchQuery::from_text("CD8", 10, 10);
        let mm = &q.body()["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(mm["query"], "CD8");
        assert_eq!(mm["fields"].as_array().map(Vec::len), Some(SEARCH_FIELDS.len()));
        assert_eq!(mm["fields"][0], "antibody_uuid");
        assert_eq!(mm["fields"][34], "next_version_id");
        assert_eq!(q.from(), 10);
    }

    #[test]
    fn paging_and_projection_leave_the_original_untouched() {
        let q = SearchQuery::from_text("kidney", 20, 10);
        let all = q.with_page(0, 57).with_source(&["target_symbol", "rrid"]);
        assert_eq!(all.from(), 0);
        assert_eq!(all.size(), 57);
        assert_eq!(all.source_fields(), vec!["target_symbol", "rrid"]);
        assert_eq!(all.body()["query"], q.body()["query"]);
        assert_eq!(q.from(), 20);
        assert!(q.source_fields().is_empty());
    }

    #[test]
    fn totals_accept_both_shapes() {
        let tracked = SearchResponse::from_json(json!({
            "hits": { "total": { "value": 3, "relation": "eq" }, "hits": [] }
        }))
        .unwrap();
        assert_eq!(tracked.total, 3);

        let plain = SearchResponse::from_json(json!({
            "hits": { "total": 7, "hits": [{ "_id": "a", "_source": { "host": "Mouse" } }] }
        }))
        .unwrap();
        assert_eq!(plain.total, 7);
        assert_eq!(plain.hits[0].id, "a");
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            search_endpoint("https://search.example/v3/", "/hm_antibodies"),
            "https://search.example/v3/hm_antibodies/_search"
        );
    }

    #[tokio::test]
    async fn session_remembers_total() {
        let backend = Fixed {
            response: SearchResponse::new(42, vec![Hit::new("1", Record::default())]),
            seen: RefCell::new(Vec::new()),
        };
        let mut session = SearchSession::new(SearchQuery::from_text("", 0, 1));
        assert_eq!(session.total(), None);
        let response = session.run(&backend).await.unwrap();
        assert_eq!(response.hits.len(), 1);
        assert_eq!(session.total(), Some(42));
        assert_eq!(backend.seen.borrow().len(), 1);
    }
}
