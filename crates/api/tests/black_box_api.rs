use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use itemsearch_api::app::{build_router, services::AppServices};
use itemsearch_search::{
    ClusterHealth, IndexSettings, SearchBackend, SearchError, SearchResponse, SearchResult,
};

/// In-memory engine understanding the query subset the API emits.
#[derive(Default)]
struct MemoryEngine {
    state: Mutex<EngineState>,
    /// When set, every call fails with this engine status.
    failing: Option<u16>,
}

#[derive(Default)]
struct EngineState {
    indices: BTreeMap<String, Value>,
    docs: BTreeMap<String, BTreeMap<String, Value>>,
    searches: Vec<Value>,
}

impl MemoryEngine {
    fn failing(status: u16) -> Self {
        Self {
            failing: Some(status),
            ..Default::default()
        }
    }

    fn check(&self) -> SearchResult<()> {
        match self.failing {
            Some(status) => Err(SearchError::Engine {
                status,
                kind: Some("unavailable_shards_exception".to_string()),
                reason: "engine is down".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn last_search(&self) -> Value {
        self.state
            .lock()
            .unwrap()
            .searches
            .last()
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn index_missing(index: &str) -> SearchError {
    SearchError::Engine {
        status: 404,
        kind: Some("index_not_found_exception".to_string()),
        reason: format!("no such index [{index}]"),
    }
}

#[async_trait]
impl SearchBackend for MemoryEngine {
    async fn create_index(&self, index: &str, body: Value) -> SearchResult<bool> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        if st.indices.contains_key(index) {
            return Ok(false);
        }
        st.indices.insert(index.to_string(), body);
        st.docs.entry(index.to_string()).or_default();
        Ok(true)
    }

    async fn delete_index(&self, index: &str) -> SearchResult<bool> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        st.docs.remove(index);
        Ok(st.indices.remove(index).is_some())
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        self.check()?;
        Ok(self.state.lock().unwrap().indices.contains_key(index))
    }

    async fn put_mapping(&self, index: &str, mapping: Value) -> SearchResult<()> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        let body = st
            .indices
            .get_mut(index)
            .ok_or_else(|| index_missing(index))?;
        body["mappings"] = mapping;
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> SearchResult<Value> {
        self.check()?;
        let st = self.state.lock().unwrap();
        st.indices
            .get(index)
            .map(|body| body["mappings"].clone())
            .ok_or_else(|| index_missing(index))
    }

    async fn index_document(&self, index: &str, id: &str, source: Value) -> SearchResult<()> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        st.indices.entry(index.to_string()).or_insert(Value::Null);
        st.docs
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source);
        Ok(())
    }

    async fn bulk_index(&self, index: &str, docs: Vec<(String, Value)>) -> SearchResult<()> {
        for (id, source) in docs {
            self.index_document(index, &id, source).await?;
        }
        Ok(())
    }

    async fn get_document(&self, index: &str, id: &str) -> SearchResult<Option<Value>> {
        self.check()?;
        let st = self.state.lock().unwrap();
        Ok(st.docs.get(index).and_then(|d| d.get(id)).cloned())
    }

    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<bool> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        Ok(st
            .docs
            .get_mut(index)
            .and_then(|d| d.remove(id))
            .is_some())
    }

    async fn refresh(&self, _index: &str) -> SearchResult<()> {
        self.check()
    }

    async fn search(&self, index: &str, body: Value) -> SearchResult<SearchResponse> {
        self.check()?;
        let mut st = self.state.lock().unwrap();
        st.searches.push(body.clone());
        let docs = st.docs.get(index).ok_or_else(|| index_missing(index))?;

        let query = body.get("query").cloned().unwrap_or(json!({ "match_all": {} }));
        let mut hits: Vec<(&String, &Value)> =
            docs.iter().filter(|(_, d)| matches(&query, d)).collect();

        let sorts: Vec<(&String, bool)> = body["sort"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .flatten()
            .map(|(field, clause)| (field, clause["order"] == "desc"))
            .collect();
        let key = |doc: &Value| -> Vec<Value> {
            sorts.iter().map(|(f, _)| doc[f.as_str()].clone()).collect()
        };
        let by_keys = |a: &[Value], b: &[Value]| {
            sorts
                .iter()
                .zip(a.iter().zip(b))
                .map(|((_, desc), (x, y))| {
                    let ord = compare(x, y);
                    if *desc { ord.reverse() } else { ord }
                })
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        };
        hits.sort_by(|a, b| by_keys(&key(a.1), &key(b.1)));

        let total = hits.len();
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let after = body["search_after"].as_array();
        let page: Vec<Value> = hits
            .iter()
            .filter(|(_, d)| after.is_none_or(|after| by_keys(&key(d), after).is_gt()))
            .skip(from)
            .take(size)
            .map(|(id, source)| {
                json!({ "_id": id, "_score": 1.0, "_source": source, "sort": key(source) })
            })
            .collect();

        let mut aggregations = serde_json::Map::new();
        if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
            let matched: Vec<&Value> = hits.iter().map(|(_, d)| *d).collect();
            for (name, def) in aggs {
                aggregations.insert(name.clone(), aggregate(def, &matched));
            }
        }

        SearchResponse::from_json(&json!({
            "hits": { "total": { "value": total, "relation": "eq" }, "hits": page },
            "aggregations": aggregations,
        }))
    }

    async fn count(&self, index: &str, query: Value) -> SearchResult<u64> {
        self.check()?;
        let st = self.state.lock().unwrap();
        let docs = st.docs.get(index).ok_or_else(|| index_missing(index))?;
        Ok(docs.values().filter(|d| matches(&query, d)).count() as u64)
    }

    async fn health(&self) -> SearchResult<ClusterHealth> {
        self.check()?;
        Ok(ClusterHealth {
            cluster_name: "memory".to_string(),
            status: "green".to_string(),
            number_of_nodes: 1,
        })
    }
}

fn single(clause: &Value) -> Option<(&String, &Value)> {
    clause.as_object().and_then(|o| o.iter().next())
}

fn same(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.as_str().unwrap_or("").cmp(b.as_str().unwrap_or("")),
    }
}

fn matches(query: &Value, doc: &Value) -> bool {
    let Some((kind, body)) = single(query) else {
        return false;
    };
    match kind.as_str() {
        "match_all" => true,
        "term" => single(body).is_some_and(|(f, v)| same(&doc[f.as_str()], &v["value"])),
        "terms" => single(body).is_some_and(|(f, vs)| {
            vs.as_array()
                .is_some_and(|vs| vs.iter().any(|v| same(&doc[f.as_str()], v)))
        }),
        "match" => single(body).is_some_and(|(f, v)| {
            let text = doc[f.as_str()].as_str().unwrap_or("").to_lowercase();
            let query = v["query"].as_str().unwrap_or("").to_lowercase();
            let mut words = query.split_whitespace();
            if v["operator"] == "and" {
                words.all(|w| text.contains(w))
            } else {
                words.any(|w| text.contains(w))
            }
        }),
        "fuzzy" => single(body).is_some_and(|(f, v)| {
            let text = doc[f.as_str()].as_str().unwrap_or("");
            text.contains(v["value"].as_str().unwrap_or(""))
        }),
        "range" => single(body).is_some_and(|(f, bounds)| {
            let Some(x) = doc[f.as_str()].as_f64() else {
                return false;
            };
            let ok = |key: &str, test: fn(f64, f64) -> bool| {
                bounds.get(key).and_then(Value::as_f64).is_none_or(|b| test(x, b))
            };
            ok("gte", |x, b| x >= b)
                && ok("gt", |x, b| x > b)
                && ok("lte", |x, b| x <= b)
                && ok("lt", |x, b| x < b)
        }),
        "bool" => {
            let list = |key: &str| body[key].as_array().cloned().unwrap_or_default();
            let (must, filter, should, must_not) =
                (list("must"), list("filter"), list("should"), list("must_not"));
            must.iter().chain(filter.iter()).all(|q| matches(q, doc))
                && must_not.iter().all(|q| !matches(q, doc))
                && (should.is_empty()
                    || !(must.is_empty() && filter.is_empty())
                    || should.iter().any(|q| matches(q, doc)))
        }
        _ => false,
    }
}

fn aggregate(def: &Value, docs: &[&Value]) -> Value {
    if let Some(terms) = def.get("terms") {
        let field = terms["field"].as_str().unwrap_or("");
        let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
        for doc in docs {
            if let Some(key) = doc[field].as_str() {
                groups.entry(key.to_string()).or_default().push(*doc);
            }
        }
        let mut buckets: Vec<(String, Vec<&Value>)> = groups.into_iter().collect();
        buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
        if let Some(n) = terms.get("size").and_then(Value::as_u64) {
            buckets.truncate(n as usize);
        }
        let buckets: Vec<Value> = buckets
            .into_iter()
            .map(|(key, members)| {
                let mut bucket = json!({ "key": key, "doc_count": members.len() });
                if let Some(subs) = def.get("aggs").and_then(Value::as_object) {
                    for (name, sub) in subs {
                        bucket[name.as_str()] = aggregate(sub, &members);
                    }
                }
                bucket
            })
            .collect();
        return json!({ "doc_count_error_upper_bound": 0, "sum_other_doc_count": 0, "buckets": buckets });
    }
    if let Some(avg) = def.get("avg") {
        let field = avg["field"].as_str().unwrap_or("");
        let values: Vec<f64> = docs.iter().filter_map(|d| d[field].as_f64()).collect();
        if values.is_empty() {
            return json!({ "value": null });
        }
        return json!({ "value": values.iter().sum::<f64>() / values.len() as f64 });
    }
    Value::Null
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(engine: Arc<MemoryEngine>) -> Self {
        // Same router as prod, wired to the in-memory engine on an ephemeral port.
        let services = AppServices::new(engine, IndexSettings::default(), 2);
        let app = build_router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn seeded() -> (TestServer, Arc<MemoryEngine>, reqwest::Client) {
    let engine = Arc::new(MemoryEngine::default());
    let server = TestServer::spawn(engine.clone()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(server.url("/items/seed"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["indexed"], 5);
    (server, engine, client)
}

async fn get_json(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

fn ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_endpoints_report_status() {
    let server = TestServer::spawn(Arc::new(MemoryEngine::default())).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, server.url("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&client, server.url("/health/engine")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cluster_name"], "memory");
    assert_eq!(body["status"], "green");
}

#[tokio::test]
async fn index_lifecycle_over_http() {
    let server = TestServer::spawn(Arc::new(MemoryEngine::default())).await;
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, server.url("/indices")).await;
    assert_eq!(body["exists"], false);
    assert!(body.get("mapping").is_none());

    let resp = client.post(server.url("/indices")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = client.post(server.url("/indices")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["created"], false);

    let (status, body) = get_json(&client, server.url("/indices")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], "item");
    assert_eq!(body["exists"], true);
    assert_eq!(body["document_count"], 0);
    assert_eq!(body["mapping"]["properties"]["title"]["type"], "text");
    assert_eq!(body["mapping"]["properties"]["category"]["type"], "keyword");

    let resp = client.delete(server.url("/indices")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);
    let resp = client.delete(server.url("/indices")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], false);
}

#[tokio::test]
async fn item_crud_over_http() {
    let (server, _engine, client) = seeded().await;

    let (status, item) = get_json(&client, server.url("/items/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["title"], "小米手机7");
    assert_eq!(item["price"], 3299.0);

    let resp = client
        .put(server.url("/items/1"))
        .json(&json!({
            "title": "小米手机7 Pro",
            "category": "手机",
            "brand": "小米",
            "price": 3599.0,
            "images": "http://image.example.com/1.jpg"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let (_, item) = get_json(&client, server.url("/items/1")).await;
    assert_eq!(item["title"], "小米手机7 Pro");
    assert_eq!(item["price"], 3599.0);

    let resp = client
        .post(server.url("/items"))
        .json(&json!({
            "id": 6, "title": "一加6", "category": "手机",
            "brand": "一加", "price": 3199.0, "images": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client.delete(server.url("/items/6")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = client.delete(server.url("/items/6")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let (status, body) = get_json(&client, server.url("/items/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = get_json(&client, server.url("/items/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn invalid_items_are_rejected_before_reaching_the_engine() {
    let (server, _engine, client) = seeded().await;

    let resp = client
        .post(server.url("/items"))
        .json(&json!({
            "id": 7, "title": "负价", "category": "手机",
            "brand": "x", "price": -1.0, "images": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let resp = client
        .post(server.url("/items"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");

    let (status, _) = get_json(&client, server.url("/items/7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_save_reports_count() {
    let engine = Arc::new(MemoryEngine::default());
    let server = TestServer::spawn(engine).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/items/bulk"))
        .json(&json!([
            { "id": 10, "title": "a", "category": "c", "brand": "b", "price": 1.0, "images": "" },
            { "id": 11, "title": "b", "category": "c", "brand": "b", "price": 2.0, "images": "" }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["indexed"], 2);

    let (status, _) = get_json(&client, server.url("/items/11")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn listing_scans_every_page_in_sort_order() {
    // Scan size is 2, so five items take three engine round trips.
    let (server, engine, client) = seeded().await;

    let (status, items) = get_json(&client, server.url("/items")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&items), vec![5, 1, 2, 4, 3]);
    let last = engine.last_search();
    assert_eq!(
        last["sort"],
        json!([ { "price": { "order": "asc" } }, { "id": { "order": "asc" } } ])
    );
    assert!(last.get("from").is_none());
    assert_eq!(last["search_after"].as_array().unwrap().len(), 2);

    let (_, items) = get_json(&client, server.url("/items?sort=price&order=desc")).await;
    assert_eq!(ids(&items), vec![3, 4, 2, 1, 5]);

    let (status, body) = get_json(&client, server.url("/items?order=up")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn finders_filter_by_price_and_category() {
    let (server, engine, client) = seeded().await;

    let (status, items) = get_json(&client, server.url("/items/by-price?min=3000&max=4300")).await;
    assert_eq!(status, StatusCode::OK);
    let mut found = ids(&items);
    found.sort();
    assert_eq!(found, vec![1, 2, 4]);

    let (status, _) = get_json(&client, server.url("/items/by-price?min=5000&max=1000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(&client, server.url("/items/by-price?min=cheap&max=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");

    let (_, items) = get_json(
        &client,
        server.url("/items/by-category-and-price?category=手机&price=3299"),
    )
    .await;
    assert_eq!(ids(&items), vec![1]);
    assert_eq!(
        engine.last_search()["sort"],
        json!([ { "id": { "order": "asc" } } ])
    );

    let (status, body) = get_json(
        &client,
        server.url("/items/by-category-and-price?category=手机&price=NaN"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn query_endpoints_return_page_echo() {
    let (server, engine, client) = seeded().await;

    let (status, page) = get_json(&client, server.url("/search/match?text=手机")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 2);
    assert_eq!(page["number"], 0);
    assert_eq!(page["size"], 10);
    assert_eq!(
        engine.last_search()["query"]["match"]["title"]["query"],
        "手机"
    );

    let (_, page) = get_json(&client, server.url("/search/term?field=brand&value=小米")).await;
    assert_eq!(page["total_elements"], 2);

    let (_, page) = get_json(&client, server.url("/search/term?field=price&value=4499")).await;
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["brand"], "华为");
    assert_eq!(
        engine.last_search()["query"]["term"]["price"]["value"],
        4499
    );

    let (_, page) = get_json(
        &client,
        server.url("/search/fuzzy?value=小米&fuzziness=1"),
    )
    .await;
    assert_eq!(page["total_elements"], 2);
    assert_eq!(
        engine.last_search()["query"]["fuzzy"]["title"]["fuzziness"],
        1
    );

    let (status, _) = get_json(&client, server.url("/search/fuzzy?value=x&fuzziness=9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bool_search_combines_clauses() {
    let (server, _engine, client) = seeded().await;

    let resp = client
        .post(server.url("/search/bool"))
        .json(&json!({
            "must": [{ "type": "match", "field": "title", "text": "手机" }],
            "filter": [{ "type": "term", "field": "brand", "value": "小米" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["id"], 1);

    let resp = client
        .post(server.url("/search/bool"))
        .json(&json!({
            "filter": [{ "type": "range", "field": "price", "gte": 4000.0 }],
            "must_not": [{ "type": "term", "field": "brand", "value": "华为" }]
        }))
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["id"], 4);

    let resp = client
        .post(server.url("/search/bool"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(server.url("/search/bool"))
        .json(&json!({ "must": [{ "type": "wildcard", "field": "title" }] }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn category_pages_echo_totals() {
    let (server, engine, client) = seeded().await;

    let (status, page) = get_json(&client, server.url("/search/page?category=手机&page=0&size=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 5);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["number"], 0);
    assert_eq!(page["size"], 3);
    assert_eq!(page["content"].as_array().unwrap().len(), 3);

    let (_, page) = get_json(&client, server.url("/search/page?category=手机&page=1&size=3")).await;
    assert_eq!(page["number"], 1);
    assert_eq!(page["content"].as_array().unwrap().len(), 2);
    assert_eq!(engine.last_search()["from"], 3);

    let (status, _) = get_json(&client, server.url("/search/page?category=手机&size=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = get_json(
        &client,
        server.url("/search/sorted?category=手机&sort=price&order=desc"),
    )
    .await;
    assert_eq!(page["content"][0]["price"], 4499.0);
    assert_eq!(page["content"][4]["price"], 2799.0);
    assert_eq!(engine.last_search()["sort"][0]["price"]["order"], "desc");
}

#[tokio::test]
async fn brand_aggregations_bucket_and_average() {
    let (server, engine, client) = seeded().await;

    let (status, buckets) = get_json(&client, server.url("/aggregations/brands")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        buckets,
        json!([
            { "key": "华为", "doc_count": 2 },
            { "key": "小米", "doc_count": 2 },
            { "key": "锤子", "doc_count": 1 }
        ])
    );
    assert_eq!(engine.last_search()["size"], 0);

    let (_, buckets) = get_json(&client, server.url("/aggregations/brands/avg-price")).await;
    assert_eq!(
        buckets,
        json!([
            { "key": "华为", "doc_count": 2, "avg_price": 3649.0 },
            { "key": "小米", "doc_count": 2, "avg_price": 3799.0 },
            { "key": "锤子", "doc_count": 1, "avg_price": 3699.0 }
        ])
    );

    let (_, buckets) = get_json(&client, server.url("/aggregations/brands?size=1")).await;
    assert_eq!(buckets.as_array().unwrap().len(), 1);

    let (status, body) = get_json(&client, server.url("/aggregations/brands?size=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn engine_failures_map_to_gateway_errors() {
    let server = TestServer::spawn(Arc::new(MemoryEngine::failing(503))).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, server.url("/health/engine")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "engine_error");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("unavailable_shards_exception")
    );

    let (status, _) = get_json(&client, server.url("/items/1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn searching_a_missing_index_is_not_found() {
    let server = TestServer::spawn(Arc::new(MemoryEngine::default())).await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, server.url("/search/match?text=x")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "engine_not_found");
}
