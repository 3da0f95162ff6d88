//! Query DSL builders.
//!
//! These are plain data; `Query::to_json` renders the engine's JSON query DSL.
//! No matching or scoring happens here.

use serde_json::{Map, Value, json};

/// Boolean operator applied between the analysed terms of a `match` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    Or,
    And,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Or => "or",
            Operator::And => "and",
        }
    }
}

/// Edit distance allowed by a fuzzy query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fuzziness {
    /// Engine picks the distance from the term length.
    #[default]
    Auto,
    Edits(u8),
}

impl Fuzziness {
    fn to_json(self) -> Value {
        match self {
            Fuzziness::Auto => Value::String("AUTO".to_string()),
            Fuzziness::Edits(n) => Value::from(n),
        }
    }
}

impl core::str::FromStr for Fuzziness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Fuzziness::Auto);
        }
        match s.parse::<u8>() {
            Ok(n) if n <= 2 => Ok(Fuzziness::Edits(n)),
            _ => Err(format!("fuzziness must be AUTO, 0, 1 or 2 (got {s:?})")),
        }
    }
}

/// Range bounds; unset bounds are omitted from the rendered query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeQuery {
    pub field: String,
    pub gte: Option<Value>,
    pub gt: Option<Value>,
    pub lte: Option<Value>,
    pub lt: Option<Value>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
        }
    }

    pub fn gte(mut self, v: impl Into<Value>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn gt(mut self, v: impl Into<Value>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn lte(mut self, v: impl Into<Value>) -> Self {
        self.lte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<Value>) -> Self {
        self.lt = Some(v.into());
        self
    }

    /// Convenience for the common inclusive `[from, to]` case.
    pub fn between(self, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.gte(from).lte(to)
    }

    fn to_json(&self) -> Value {
        let mut bounds = Map::new();
        for (name, bound) in [
            ("gte", &self.gte),
            ("gt", &self.gt),
            ("lte", &self.lte),
            ("lt", &self.lt),
        ] {
            if let Some(v) = bound {
                bounds.insert(name.to_string(), v.clone());
            }
        }
        json!({ "range": { self.field.clone(): bounds } })
    }
}

/// Compound query combining clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub must_not: Vec<Query>,
    pub filter: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, q: Query) -> Self {
        self.must.push(q);
        self
    }

    pub fn should(mut self, q: Query) -> Self {
        self.should.push(q);
        self
    }

    pub fn must_not(mut self, q: Query) -> Self {
        self.must_not.push(q);
        self
    }

    pub fn filter(mut self, q: Query) -> Self {
        self.filter.push(q);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    fn to_json(&self) -> Value {
        let mut clauses = Map::new();
        for (name, list) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
            ("filter", &self.filter),
        ] {
            if !list.is_empty() {
                clauses.insert(
                    name.to_string(),
                    Value::Array(list.iter().map(Query::to_json).collect()),
                );
            }
        }
        json!({ "bool": clauses })
    }
}

impl From<BoolQuery> for Query {
    fn from(value: BoolQuery) -> Self {
        Query::Bool(value)
    }
}

impl From<RangeQuery> for Query {
    fn from(value: RangeQuery) -> Self {
        Query::Range(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    /// Full-text query: the text is analysed by the engine before matching.
    Match {
        field: String,
        text: String,
        operator: Operator,
    },
    /// Exact, un-analysed value match.
    Term { field: String, value: Value },
    Terms { field: String, values: Vec<Value> },
    Fuzzy {
        field: String,
        value: String,
        fuzziness: Fuzziness,
    },
    Range(RangeQuery),
    Bool(BoolQuery),
}

impl Query {
    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Match {
                field,
                text,
                operator,
            } => json!({
                "match": { field.clone(): { "query": text, "operator": operator.as_str() } }
            }),
            Query::Term { field, value } => json!({
                "term": { field.clone(): { "value": value } }
            }),
            Query::Terms { field, values } => json!({
                "terms": { field.clone(): values }
            }),
            Query::Fuzzy {
                field,
                value,
                fuzziness,
            } => json!({
                "fuzzy": { field.clone(): { "value": value, "fuzziness": fuzziness.to_json() } }
            }),
            Query::Range(range) => range.to_json(),
            Query::Bool(b) => b.to_json(),
        }
    }
}

pub fn match_all() -> Query {
    Query::MatchAll
}

pub fn match_query(field: impl Into<String>, text: impl Into<String>) -> Query {
    Query::Match {
        field: field.into(),
        text: text.into(),
        operator: Operator::Or,
    }
}

pub fn term_query(field: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::Term {
        field: field.into(),
        value: value.into(),
    }
}

pub fn terms_query<V: Into<Value>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> Query {
    Query::Terms {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

pub fn fuzzy_query(field: impl Into<String>, value: impl Into<String>) -> Query {
    Query::Fuzzy {
        field: field.into(),
        value: value.into(),
        fuzziness: Fuzziness::Auto,
    }
}

pub fn range_query(field: impl Into<String>) -> RangeQuery {
    RangeQuery::new(field)
}

pub fn bool_query() -> BoolQuery {
    BoolQuery::new()
}
