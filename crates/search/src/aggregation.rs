//! Aggregation builders and response parsing.
//!
//! The engine computes buckets and metrics; this module renders the request
//! DSL and reshapes the response into typed buckets. Aggregation responses do
//! not name their kind, so parsing walks the same definitions that built the
//! request.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{SearchError, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Avg,
    Min,
    Max,
    Sum,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Avg => "avg",
            MetricKind::Min => "min",
            MetricKind::Max => "max",
            MetricKind::Sum => "sum",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AggregationKind {
    Terms { field: String, size: Option<u32> },
    Metric { kind: MetricKind, field: String },
}

/// A named aggregation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    name: String,
    kind: AggregationKind,
    sub_aggregations: Vec<Aggregation>,
}

impl Aggregation {
    /// Bucket documents by the distinct values of `field`.
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Terms {
                field: field.into(),
                size: None,
            },
            sub_aggregations: Vec::new(),
        }
    }

    pub fn avg(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::metric(name, MetricKind::Avg, field)
    }

    pub fn min(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::metric(name, MetricKind::Min, field)
    }

    pub fn max(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::metric(name, MetricKind::Max, field)
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::metric(name, MetricKind::Sum, field)
    }

    fn metric(name: impl Into<String>, kind: MetricKind, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Metric {
                kind,
                field: field.into(),
            },
            sub_aggregations: Vec::new(),
        }
    }

    /// Maximum number of buckets (terms only; ignored for metrics).
    pub fn size(mut self, n: u32) -> Self {
        if let AggregationKind::Terms { size, .. } = &mut self.kind {
            *size = Some(n);
        }
        self
    }

    /// Nest an aggregation inside every bucket of this one.
    pub fn sub_aggregation(mut self, agg: Aggregation) -> Self {
        self.sub_aggregations.push(agg);
        self
    }

    fn to_json(&self) -> Value {
        let mut body = match &self.kind {
            AggregationKind::Terms { field, size } => {
                let mut terms = Map::new();
                terms.insert("field".to_string(), Value::String(field.clone()));
                if let Some(n) = size {
                    terms.insert("size".to_string(), Value::from(*n));
                }
                let mut m = Map::new();
                m.insert("terms".to_string(), Value::Object(terms));
                m
            }
            AggregationKind::Metric { kind, field } => {
                let mut m = Map::new();
                m.insert(kind.as_str().to_string(), json!({ "field": field }));
                m
            }
        };
        if !self.sub_aggregations.is_empty() {
            body.insert("aggs".to_string(), to_json(&self.sub_aggregations));
        }
        Value::Object(body)
    }

    fn parse(&self, raw: &Value) -> SearchResult<AggregationResult> {
        match &self.kind {
            AggregationKind::Terms { .. } => {
                let buckets = raw
                    .get("buckets")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        SearchError::invalid_response(format!(
                            "aggregation {:?} has no buckets",
                            self.name
                        ))
                    })?
                    .iter()
                    .map(|b| TermsBucket::parse(b, &self.sub_aggregations))
                    .collect::<SearchResult<Vec<_>>>()?;
                let sum_other_doc_count = raw
                    .get("sum_other_doc_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                Ok(AggregationResult::Terms(TermsAggregation {
                    buckets,
                    sum_other_doc_count,
                }))
            }
            // `value` is null when no document had the field.
            AggregationKind::Metric { .. } => Ok(AggregationResult::Metric(MetricValue {
                value: raw.get("value").and_then(Value::as_f64),
            })),
        }
    }
}

/// Render a list of definitions as the request's `aggs` object.
pub fn to_json(aggs: &[Aggregation]) -> Value {
    Value::Object(
        aggs.iter()
            .map(|a| (a.name.clone(), a.to_json()))
            .collect(),
    )
}

/// Parsed aggregations, keyed by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Aggregations(BTreeMap<String, AggregationResult>);

impl Aggregations {
    /// Parse the `aggregations` object of a search response.
    ///
    /// A definition with no counterpart in the response is an error: the
    /// engine always answers every requested aggregation.
    pub fn parse(defs: &[Aggregation], raw: &Value) -> SearchResult<Self> {
        let mut out = BTreeMap::new();
        for def in defs {
            let value = raw.get(&def.name).ok_or_else(|| {
                SearchError::invalid_response(format!("missing aggregation {:?}", def.name))
            })?;
            out.insert(def.name.clone(), def.parse(value)?);
        }
        Ok(Self(out))
    }

    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.0.get(name)
    }

    pub fn terms(&self, name: &str) -> Option<&TermsAggregation> {
        match self.0.get(name) {
            Some(AggregationResult::Terms(t)) => Some(t),
            _ => None,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        match self.0.get(name) {
            Some(AggregationResult::Metric(m)) => m.value,
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Terms(TermsAggregation),
    Metric(MetricValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermsAggregation {
    buckets: Vec<TermsBucket>,
    sum_other_doc_count: u64,
}

impl TermsAggregation {
    pub fn buckets(&self) -> &[TermsBucket] {
        &self.buckets
    }

    /// Documents that fell outside the returned buckets (bucket `size` cap).
    pub fn sum_other_doc_count(&self) -> u64 {
        self.sum_other_doc_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermsBucket {
    key: Value,
    key_as_string: String,
    doc_count: u64,
    #[serde(skip_serializing_if = "Aggregations::is_empty")]
    aggregations: Aggregations,
}

impl TermsBucket {
    fn parse(raw: &Value, sub: &[Aggregation]) -> SearchResult<Self> {
        let key = raw
            .get("key")
            .cloned()
            .ok_or_else(|| SearchError::invalid_response("bucket without key"))?;
        let key_as_string = match raw.get("key_as_string").and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => match &key {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };
        let doc_count = raw
            .get("doc_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::invalid_response("bucket without doc_count"))?;
        Ok(Self {
            key,
            key_as_string,
            doc_count,
            aggregations: Aggregations::parse(sub, raw)?,
        })
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn key_as_string(&self) -> &str {
        &self.key_as_string
    }

    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    pub fn aggregations(&self) -> &Aggregations {
        &self.aggregations
    }

    /// Value of a nested metric aggregation in this bucket.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.aggregations.metric(name)
    }
}
