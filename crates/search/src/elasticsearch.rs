//! Elasticsearch REST implementation of [`SearchBackend`].
//!
//! Talks to the engine's HTTP API with `reqwest`. Connection pooling and
//! keep-alive are handled by the client; there is no retry layer here, failures
//! surface to the caller as [`SearchError`].

use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode, Url, header};
use serde_json::{Value, json};

use crate::backend::{ClusterHealth, SearchBackend, SearchResponse};
use crate::error::{SearchError, SearchResult};

/// When writes become visible to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Leave it to the engine's periodic refresh.
    None,
    /// Block the write until the next refresh has made it visible.
    #[default]
    WaitFor,
    /// Force a refresh right after the write.
    Immediate,
}

impl RefreshPolicy {
    pub fn as_param(self) -> &'static str {
        match self {
            RefreshPolicy::None => "false",
            RefreshPolicy::WaitFor => "wait_for",
            RefreshPolicy::Immediate => "true",
        }
    }
}

impl core::str::FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "false" | "none" => Ok(RefreshPolicy::None),
            "wait_for" => Ok(RefreshPolicy::WaitFor),
            "true" | "immediate" => Ok(RefreshPolicy::Immediate),
            other => Err(format!("refresh must be false, true or wait_for (got {other:?})")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of one node, e.g. `http://localhost:9200`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub refresh: RefreshPolicy,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
            refresh: RefreshPolicy::default(),
        }
    }
}

enum Payload {
    Json(Value),
    NdJson(String),
}

/// Status and raw body of one engine call.
struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    fn into_error(self) -> SearchError {
        engine_error(self.status, &self.body)
    }

    /// Success body as JSON, or the engine error.
    fn into_json(self) -> SearchResult<Value> {
        if !self.status.is_success() {
            return Err(self.into_error());
        }
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

fn engine_error(status: StatusCode, body: &str) -> SearchError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let kind = error
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let reason = error
        .and_then(|e| e.get("reason").and_then(Value::as_str).or_else(|| e.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body.to_string()
            }
        });
    SearchError::Engine {
        status: status.as_u16(),
        kind,
        reason,
    }
}

#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: reqwest::Client,
    base: Url,
    credentials: Option<(String, Option<String>)>,
    refresh: RefreshPolicy,
}

impl ElasticsearchBackend {
    pub fn new(config: ElasticsearchConfig) -> SearchResult<Self> {
        let base = Url::parse(&config.url).map_err(|e| {
            SearchError::invalid_request(format!("invalid engine url {:?}: {e}", config.url))
        })?;
        if base.cannot_be_a_base() {
            return Err(SearchError::invalid_request(format!(
                "engine url {:?} cannot be used as a base",
                config.url
            )));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base,
            credentials: config.username.map(|u| (u, config.password)),
            refresh: config.refresh,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> SearchResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::invalid_request("engine url cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        with_refresh: bool,
        payload: Option<Payload>,
    ) -> SearchResult<Reply> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();

        let mut req = self.client.request(method.clone(), url);
        if let Some((user, password)) = &self.credentials {
            req = req.basic_auth(user, password.as_ref());
        }
        if with_refresh {
            req = req.query(&[("refresh", self.refresh.as_param())]);
        }
        req = match payload {
            Some(Payload::Json(body)) => req.json(&body),
            Some(Payload::NdJson(body)) => req
                .header(header::CONTENT_TYPE, "application/x-ndjson")
                .body(body),
            None => req,
        };

        let started = Instant::now();
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "engine request failed");
            SearchError::Transport(e)
        })?;
        let status = resp.status();
        let body = resp.text().await?;

        tracing::debug!(
            %method,
            %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "engine request"
        );

        Ok(Reply { status, body })
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn create_index(&self, index: &str, body: Value) -> SearchResult<bool> {
        let reply = self
            .call(Method::PUT, &[index], false, Some(Payload::Json(body)))
            .await?;
        if reply.status.is_success() {
            return Ok(true);
        }
        match reply.into_error() {
            SearchError::Engine { kind: Some(kind), .. }
                if kind == "resource_already_exists_exception" =>
            {
                Ok(false)
            }
            err => Err(err),
        }
    }

    async fn delete_index(&self, index: &str) -> SearchResult<bool> {
        let reply = self.call(Method::DELETE, &[index], false, None).await?;
        if reply.is_not_found() {
            return Ok(false);
        }
        reply.into_json()?;
        Ok(true)
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let reply = self.call(Method::HEAD, &[index], false, None).await?;
        let status = reply.status;
        if status.is_success() {
            Ok(true)
        } else if reply.is_not_found() {
            Ok(false)
        } else {
            Err(reply.into_error())
        }
    }

    async fn put_mapping(&self, index: &str, mapping: Value) -> SearchResult<()> {
        self.call(
            Method::PUT,
            &[index, "_mapping"],
            false,
            Some(Payload::Json(mapping)),
        )
        .await?
        .into_json()?;
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> SearchResult<Value> {
        let raw = self
            .call(Method::GET, &[index, "_mapping"], false, None)
            .await?
            .into_json()?;
        // Keyed by concrete index name, which differs from `index` for aliases.
        raw.as_object()
            .and_then(|m| m.values().next())
            .and_then(|v| v.get("mappings"))
            .cloned()
            .ok_or_else(|| SearchError::invalid_response("mapping response without mappings"))
    }

    async fn index_document(&self, index: &str, id: &str, source: Value) -> SearchResult<()> {
        self.call(
            Method::PUT,
            &[index, "_doc", id],
            true,
            Some(Payload::Json(source)),
        )
        .await?
        .into_json()?;
        Ok(())
    }

    async fn bulk_index(&self, index: &str, docs: Vec<(String, Value)>) -> SearchResult<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let mut body = String::new();
        for (id, source) in &docs {
            body.push_str(&json!({ "index": { "_index": index, "_id": id } }).to_string());
            body.push('\n');
            body.push_str(&serde_json::to_string(source)?);
            body.push('\n');
        }

        let raw = self
            .call(Method::POST, &["_bulk"], true, Some(Payload::NdJson(body)))
            .await?
            .into_json()?;

        if !raw.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(());
        }

        let failed: Vec<String> = raw
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("index"))
            .filter(|op| op.get("error").is_some())
            .map(|op| {
                let id = op.get("_id").and_then(Value::as_str).unwrap_or("?");
                let reason = op
                    .pointer("/error/reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                tracing::warn!(index, id, reason, "bulk item rejected");
                id.to_string()
            })
            .collect();
        Err(SearchError::Bulk { failed })
    }

    async fn get_document(&self, index: &str, id: &str) -> SearchResult<Option<Value>> {
        let reply = self
            .call(Method::GET, &[index, "_doc", id], false, None)
            .await?;
        if reply.is_not_found() {
            return Ok(None);
        }
        let raw = reply.into_json()?;
        if raw.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        Ok(raw.get("_source").cloned())
    }

    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<bool> {
        let reply = self
            .call(Method::DELETE, &[index, "_doc", id], true, None)
            .await?;
        if reply.is_not_found() {
            return Ok(false);
        }
        reply.into_json()?;
        Ok(true)
    }

    async fn refresh(&self, index: &str) -> SearchResult<()> {
        self.call(Method::POST, &[index, "_refresh"], false, None)
            .await?
            .into_json()?;
        Ok(())
    }

    async fn search(&self, index: &str, body: Value) -> SearchResult<SearchResponse> {
        let raw = self
            .call(
                Method::POST,
                &[index, "_search"],
                false,
                Some(Payload::Json(body)),
            )
            .await?
            .into_json()?;
        SearchResponse::from_json(&raw)
    }

    async fn count(&self, index: &str, query: Value) -> SearchResult<u64> {
        let raw = self
            .call(
                Method::POST,
                &[index, "_count"],
                false,
                Some(Payload::Json(json!({ "query": query }))),
            )
            .await?
            .into_json()?;
        raw.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::invalid_response("count response without count"))
    }

    async fn health(&self) -> SearchResult<ClusterHealth> {
        let raw = self
            .call(Method::GET, &["_cluster", "health"], false, None)
            .await?
            .into_json()?;
        Ok(serde_json::from_value(raw)?)
    }
}
