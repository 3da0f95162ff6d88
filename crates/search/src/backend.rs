//! Search engine contract.
//!
//! `SearchBackend` is the seam between the typed repository and whichever
//! engine client is wired in. Bodies are engine JSON; the repository builds
//! them and interprets the results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SearchError, SearchResult};

/// Async engine interface.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Create an index from a `{ settings, mappings }` body.
    ///
    /// Returns `false` when the index already existed.
    async fn create_index(&self, index: &str, body: Value) -> SearchResult<bool>;

    /// Returns `false` when there was no such index.
    async fn delete_index(&self, index: &str) -> SearchResult<bool>;

    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    async fn put_mapping(&self, index: &str, mapping: Value) -> SearchResult<()>;

    async fn get_mapping(&self, index: &str) -> SearchResult<Value>;

    /// Create or replace a document.
    async fn index_document(&self, index: &str, id: &str, source: Value) -> SearchResult<()>;

    /// Create or replace many documents in one round trip.
    async fn bulk_index(&self, index: &str, docs: Vec<(String, Value)>) -> SearchResult<()>;

    /// Document `_source`, or `None` when absent.
    async fn get_document(&self, index: &str, id: &str) -> SearchResult<Option<Value>>;

    /// Returns `false` when the document did not exist.
    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<bool>;

    /// Make recent writes visible to search.
    async fn refresh(&self, index: &str) -> SearchResult<()>;

    async fn search(&self, index: &str, body: Value) -> SearchResult<SearchResponse>;

    async fn count(&self, index: &str, query: Value) -> SearchResult<u64>;

    async fn health(&self) -> SearchResult<ClusterHealth>;
}

#[async_trait::async_trait]
impl<S> SearchBackend for Arc<S>
where
    S: SearchBackend + ?Sized,
{
    async fn create_index(&self, index: &str, body: Value) -> SearchResult<bool> {
        (**self).create_index(index, body).await
    }

    async fn delete_index(&self, index: &str) -> SearchResult<bool> {
        (**self).delete_index(index).await
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        (**self).index_exists(index).await
    }

    async fn put_mapping(&self, index: &str, mapping: Value) -> SearchResult<()> {
        (**self).put_mapping(index, mapping).await
    }

    async fn get_mapping(&self, index: &str) -> SearchResult<Value> {
        (**self).get_mapping(index).await
    }

    async fn index_document(&self, index: &str, id: &str, source: Value) -> SearchResult<()> {
        (**self).index_document(index, id, source).await
    }

    async fn bulk_index(&self, index: &str, docs: Vec<(String, Value)>) -> SearchResult<()> {
        (**self).bulk_index(index, docs).await
    }

    async fn get_document(&self, index: &str, id: &str) -> SearchResult<Option<Value>> {
        (**self).get_document(index, id).await
    }

    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<bool> {
        (**self).delete_document(index, id).await
    }

    async fn refresh(&self, index: &str) -> SearchResult<()> {
        (**self).refresh(index).await
    }

    async fn search(&self, index: &str, body: Value) -> SearchResult<SearchResponse> {
        (**self).search(index, body).await
    }

    async fn count(&self, index: &str, query: Value) -> SearchResult<u64> {
        (**self).count(index, query).await
    }

    async fn health(&self) -> SearchResult<ClusterHealth> {
        (**self).health().await
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: Option<f64>,
    pub source: Value,
    /// Sort values of the hit, empty unless the request sorted.
    pub sort: Vec<Value>,
}

/// Raw search result: totals, hits and the untouched `aggregations` object.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<Hit>,
    pub aggregations: Value,
}

impl SearchResponse {
    /// Parse a `_search` response body.
    ///
    /// `hits.total` is either a bare number (older engines) or
    /// `{ "value": n, "relation": "eq" }`.
    pub fn from_json(raw: &Value) -> SearchResult<Self> {
        let hits = raw
            .get("hits")
            .ok_or_else(|| SearchError::invalid_response("search response without hits"))?;

        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(obj @ Value::Object(_)) => obj.get("value").and_then(Value::as_u64),
            _ => None,
        }
        .ok_or_else(|| SearchError::invalid_response("search response without hits.total"))?;

        let hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(parse_hit).collect::<SearchResult<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            total,
            hits,
            aggregations: raw.get("aggregations").cloned().unwrap_or(Value::Null),
        })
    }
}

fn parse_hit(raw: &Value) -> SearchResult<Hit> {
    let id = raw
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| SearchError::invalid_response("hit without _id"))?
        .to_string();
    Ok(Hit {
        id,
        score: raw.get("_score").and_then(Value::as_f64),
        source: raw.get("_source").cloned().unwrap_or(Value::Null),
        sort: raw
            .get("sort")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Subset of the cluster health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: String,
    #[serde(default)]
    pub number_of_nodes: u32,
}
