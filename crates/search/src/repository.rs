//! Typed repository and index administration on top of a [`SearchBackend`].

use serde_json::Value;

use itemsearch_core::{Item, ItemId, fields};

use crate::aggregation::Aggregations;
use crate::backend::{SearchBackend, SearchResponse};
use crate::document::{Document, IndexSettings};
use crate::error::{SearchError, SearchResult};
use crate::page::{AggregatedPage, Page, PageRequest};
use crate::query::{Query, bool_query, range_query, term_query};
use crate::request::{SearchRequest, Sort};

/// Index lifecycle for document types.
#[derive(Debug, Clone)]
pub struct IndexOperations<B> {
    backend: B,
    settings: IndexSettings,
}

impl<B: SearchBackend> IndexOperations<B> {
    pub fn new(backend: B, settings: IndexSettings) -> Self {
        Self { backend, settings }
    }

    /// Create the index with settings and mappings.
    ///
    /// An existing index is left untouched; returns whether it was created.
    pub async fn create_index<D: Document>(&self) -> SearchResult<bool> {
        let created = self
            .backend
            .create_index(D::INDEX, D::index_body(&self.settings))
            .await?;
        if created {
            tracing::info!(index = D::INDEX, "index created");
        } else {
            tracing::info!(index = D::INDEX, "index already exists");
        }
        Ok(created)
    }

    /// Push the document type's field mappings onto an existing index.
    pub async fn put_mapping<D: Document>(&self) -> SearchResult<()> {
        self.backend
            .put_mapping(D::INDEX, D::mapping(&self.settings))
            .await
    }

    pub async fn get_mapping<D: Document>(&self) -> SearchResult<Value> {
        self.backend.get_mapping(D::INDEX).await
    }

    pub async fn delete_index<D: Document>(&self) -> SearchResult<bool> {
        let deleted = self.backend.delete_index(D::INDEX).await?;
        tracing::info!(index = D::INDEX, deleted, "index delete");
        Ok(deleted)
    }

    pub async fn index_exists<D: Document>(&self) -> SearchResult<bool> {
        self.backend.index_exists(D::INDEX).await
    }
}

/// Page size used by "find all"-style methods unless configured otherwise.
pub const DEFAULT_SCAN_SIZE: u32 = 1000;

/// Repository for catalog items.
///
/// "Find all"-style methods page through results `scan_size` hits at a time
/// instead of stopping at the engine's default page of ten.
#[derive(Debug, Clone)]
pub struct ItemRepository<B> {
    backend: B,
    scan_size: u32,
}

impl<B: SearchBackend> ItemRepository<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            scan_size: DEFAULT_SCAN_SIZE,
        }
    }

    pub fn with_scan_size(mut self, scan_size: u32) -> Self {
        self.scan_size = scan_size.max(1);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create or replace one item.
    pub async fn save(&self, item: &Item) -> SearchResult<()> {
        item.validate()?;
        self.backend
            .index_document(Item::INDEX, &item.document_id(), serde_json::to_value(item)?)
            .await
    }

    /// Create or replace many items in one bulk request.
    pub async fn save_all(&self, items: &[Item]) -> SearchResult<usize> {
        for item in items {
            item.validate()?;
        }
        let docs = items
            .iter()
            .map(|item| Ok((item.document_id(), serde_json::to_value(item)?)))
            .collect::<SearchResult<Vec<_>>>()?;
        self.backend.bulk_index(Item::INDEX, docs).await?;
        Ok(items.len())
    }

    pub async fn find_by_id(&self, id: ItemId) -> SearchResult<Option<Item>> {
        match self
            .backend
            .get_document(Item::INDEX, &id.to_string())
            .await?
        {
            Some(source) => Ok(Some(serde_json::from_value(source)?)),
            None => Ok(None),
        }
    }

    pub async fn exists_by_id(&self, id: ItemId) -> SearchResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Returns `false` when there was nothing to delete.
    pub async fn delete_by_id(&self, id: ItemId) -> SearchResult<bool> {
        self.backend
            .delete_document(Item::INDEX, &id.to_string())
            .await
    }

    pub async fn count(&self) -> SearchResult<u64> {
        self.backend
            .count(Item::INDEX, Query::MatchAll.to_json())
            .await
    }

    /// Every item, ordered by `sort`.
    pub async fn find_all_sorted(&self, sort: Sort) -> SearchResult<Vec<Item>> {
        self.scan(Query::MatchAll, vec![sort]).await
    }

    /// Items with `min <= price <= max`.
    pub async fn find_by_price_between(&self, min: f64, max: f64) -> SearchResult<Vec<Item>> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(SearchError::invalid_request("price bounds must be finite"));
        }
        if min > max {
            return Err(SearchError::invalid_request(format!(
                "price range is empty: {min} > {max}"
            )));
        }
        self.scan(range_query(fields::PRICE).between(min, max).into(), Vec::new())
            .await
    }

    /// Items in `category` with exactly `price`.
    pub async fn find_by_category_and_price(
        &self,
        category: &str,
        price: f64,
    ) -> SearchResult<Vec<Item>> {
        if !price.is_finite() {
            return Err(SearchError::invalid_request("price must be finite"));
        }
        let query = bool_query()
            .filter(term_query(fields::CATEGORY, category))
            .filter(term_query(fields::PRICE, price));
        self.scan(query.into(), Vec::new()).await
    }

    /// Run a built request; returns the page echo and any aggregations.
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<AggregatedPage<Item>> {
        let response = self.backend.search(Item::INDEX, request.to_body()).await?;
        let aggregations = if request.aggregations().is_empty() {
            Aggregations::default()
        } else {
            Aggregations::parse(request.aggregations(), &response.aggregations)?
        };
        let total = response.total;
        let content = decode_hits(response)?;
        Ok(AggregatedPage::new(
            Page::new(content, total, request.pageable()),
            aggregations,
        ))
    }

    /// Fetch every hit of `query` with `search_after`, so the scan is not
    /// bounded by the engine's result window. `id` is appended as a unique
    /// tiebreaker unless the caller already sorts on it.
    async fn scan(&self, query: Query, mut sorts: Vec<Sort>) -> SearchResult<Vec<Item>> {
        if !sorts.iter().any(|s| s.field == fields::ID) {
            sorts.push(Sort::asc(fields::ID));
        }
        let pageable = PageRequest::of(0, self.scan_size)?;
        let mut after: Option<Vec<Value>> = None;
        let mut out = Vec::new();
        loop {
            let mut request = SearchRequest::new()
                .with_query(query.clone())
                .with_pageable(pageable);
            for sort in &sorts {
                request = request.with_sort(sort.clone());
            }
            if let Some(values) = after.take() {
                request = request.with_search_after(values);
            }
            let response = self.backend.search(Item::INDEX, request.to_body()).await?;
            let fetched = response.hits.len();
            let cursor = response.hits.last().map(|hit| hit.sort.clone());
            out.extend(decode_hits(response)?);
            if fetched < self.scan_size as usize {
                break;
            }
            match cursor {
                Some(values) if !values.is_empty() => after = Some(values),
                _ => {
                    return Err(SearchError::invalid_response(
                        "sorted hit without sort values",
                    ))
                }
            }
        }
        tracing::debug!(hits = out.len(), "scan complete");
        Ok(out)
    }
}

fn decode_hits(response: SearchResponse) -> SearchResult<Vec<Item>> {
    response
        .hits
        .into_iter()
        .map(|hit| {
            serde_json::from_value::<Item>(hit.source).map_err(|e| {
                SearchError::invalid_response(format!("document {} is not an item: {e}", hit.id))
            })
        })
        .collect()
}
