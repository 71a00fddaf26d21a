//! Thin typed access to the shared document index.
//!
//! Two implementations of [`DocumentIndex`] are provided:
//!
//! - [`ElasticIndex`]: talks to the index service over HTTP
//! - [`MockIndex`]: keeps documents in memory, for tests and local runs

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::blocking::run_blocking;
use crate::error::Result;
use crate::service::ServiceName;
use crate::system::SystemConfig;

/// Outcome of storing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub created: bool,
    pub id: String,
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub version: u64,
}

/// The operations the rest of the library needs from a document index.
pub trait DocumentIndex: Send + Sync {
    /// Index name documents are stored under.
    fn index_name(&self) -> &str;

    /// Store `document` under `doc_type`. An empty `id` lets the index assign
    /// one.
    fn post_data(&self, doc_type: &str, id: &str, document: &Value) -> Result<IndexResponse>;

    /// Fetch a stored document, `None` if it does not exist.
    fn get_data(&self, doc_type: &str, id: &str) -> Result<Option<Value>>;
}

#[derive(Debug, Clone)]
struct StoredDocument {
    version: u64,
    source: Value,
}

/// In-memory index.
#[derive(Debug)]
pub struct MockIndex {
    name: String,
    documents: Mutex<HashMap<(String, String), StoredDocument>>,
}

impl MockIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Number of documents stored under `doc_type`.
    pub fn count(&self, doc_type: &str) -> usize {
        self.documents()
            .keys()
            .filter(|(stored_type, _)| stored_type == doc_type)
            .count()
    }

    fn documents(&self) -> MutexGuard<'_, HashMap<(String, String), StoredDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentIndex for MockIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    fn post_data(&self, doc_type: &str, id: &str, document: &Value) -> Result<IndexResponse> {
        let id = if id.is_empty() {
            uuid::Uuid::now_v7().to_string()
        } else {
            id.to_string()
        };

        let mut documents = self.documents();
        let key = (doc_type.to_string(), id.clone());
        let version = documents.get(&key).map_or(1, |doc| doc.version + 1);
        documents.insert(
            key,
            StoredDocument {
                version,
                source: document.clone(),
            },
        );

        Ok(IndexResponse {
            created: version == 1,
            id,
            index: self.name.clone(),
            doc_type: doc_type.to_string(),
            version,
        })
    }

    fn get_data(&self, doc_type: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents()
            .get(&(doc_type.to_string(), id.to_string()))
            .map(|doc| doc.source.clone()))
    }
}

/// HTTP client for the index service.
#[derive(Debug, Clone)]
pub struct ElasticIndex {
    base_url: String,
    name: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct WriteResult {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_type", default)]
    doc_type: Option<String>,
    #[serde(rename = "_version", default)]
    version: u64,
    #[serde(default)]
    created: Option<bool>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetResult {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

impl ElasticIndex {
    /// Client for index `name` on the document index registered in `config`.
    pub fn new(config: &SystemConfig, name: impl Into<String>) -> Result<Self> {
        let base_url = config.url_of(ServiceName::Elasticsearch)?;
        Ok(Self::with_client(base_url, name, config.http_client()))
    }

    pub fn with_client(base_url: impl Into<String>, name: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            name: name.into(),
            client,
        }
    }

    fn document_url(&self, doc_type: &str, id: &str) -> String {
        if id.is_empty() {
            format!("{}/{}/{}", self.base_url, self.name, doc_type)
        } else {
            format!("{}/{}/{}/{}", self.base_url, self.name, doc_type, id)
        }
    }
}

impl DocumentIndex for ElasticIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    fn post_data(&self, doc_type: &str, id: &str, document: &Value) -> Result<IndexResponse> {
        run_blocking(|| self.store(doc_type, id, document))
    }

    fn get_data(&self, doc_type: &str, id: &str) -> Result<Option<Value>> {
        run_blocking(|| self.fetch(doc_type, id))
    }
}

impl ElasticIndex {
    fn store(&self, doc_type: &str, id: &str, document: &Value) -> Result<IndexResponse> {
        let url = self.document_url(doc_type, id);
        debug!(url = %url, "indexing document");

        let request = if id.is_empty() {
            self.client.post(&url)
        } else {
            self.client.put(&url)
        };
        let result: WriteResult = request.json(document).send()?.error_for_status()?.json()?;

        let created = result
            .created
            .unwrap_or_else(|| result.result.as_deref() == Some("created"));
        Ok(IndexResponse {
            created,
            id: result.id,
            index: result.index,
            doc_type: result.doc_type.unwrap_or_else(|| doc_type.to_string()),
            version: result.version,
        })
    }

    fn fetch(&self, doc_type: &str, id: &str) -> Result<Option<Value>> {
        let response = self.client.get(self.document_url(doc_type, id)).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let result: GetResult = response.error_for_status()?.json()?;
        Ok(if result.found { result.source } else { None })
    }
}
