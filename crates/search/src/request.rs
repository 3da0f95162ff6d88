//! Search request builder: query + sort + paging + aggregations.

use serde_json::{Map, Value, json};

use crate::aggregation::{self, Aggregation};
use crate::page::PageRequest;
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl core::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("sort order must be asc or desc (got {other:?})")),
        }
    }
}

/// Field sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    fn to_json(&self) -> Value {
        json!({ self.field.clone(): { "order": self.order.as_str() } })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    query: Option<Query>,
    sorts: Vec<Sort>,
    pageable: PageRequest,
    aggregations: Vec<Aggregation>,
    without_hits: bool,
    search_after: Option<Vec<Value>>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<Query>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Append a sort; earlier sorts take precedence.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_pageable(mut self, pageable: PageRequest) -> Self {
        self.pageable = pageable;
        self
    }

    /// Continue after the hit carrying these sort values; replaces `from`.
    pub fn with_search_after(mut self, values: Vec<Value>) -> Self {
        self.search_after = Some(values);
        self
    }

    pub fn add_aggregation(mut self, agg: Aggregation) -> Self {
        self.aggregations.push(agg);
        self
    }

    /// Ask only for totals and aggregations, no documents.
    pub fn without_hits(mut self) -> Self {
        self.without_hits = true;
        self
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn pageable(&self) -> PageRequest {
        self.pageable
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    /// Render the `_search` request body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        let query = self.query.as_ref().unwrap_or(&Query::MatchAll);
        body.insert("query".to_string(), query.to_json());

        if self.without_hits {
            body.insert("size".to_string(), Value::from(0));
        } else if let Some(after) = &self.search_after {
            body.insert("search_after".to_string(), Value::Array(after.clone()));
            body.insert("size".to_string(), Value::from(self.pageable.size()));
        } else {
            body.insert("from".to_string(), Value::from(self.pageable.offset()));
            body.insert("size".to_string(), Value::from(self.pageable.size()));
        }

        if !self.sorts.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sorts.iter().map(Sort::to_json).collect()),
            );
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".to_string(), aggregation::to_json(&self.aggregations));
        }
        // Exact totals: page counts are derived from them.
        body.insert("track_total_hits".to_string(), Value::Bool(true));
        Value::Object(body)
    }
}
