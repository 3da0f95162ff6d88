use serde::{Deserialize, Serialize};
use serde_json::Value;

use itemsearch_core::{Item, fields};
use itemsearch_search::{
    BoolQuery, Fuzziness, Operator, Query, SearchError, SearchResult, Sort, SortOrder, TermsBucket,
    query,
};

/// `GET /items?sort=&order=`
#[derive(Debug, Deserialize)]
pub struct SortParams {
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SortParams {
    /// Defaults to price ascending.
    pub fn to_sort(&self) -> SearchResult<Sort> {
        let field = self.sort.as_deref().unwrap_or(fields::PRICE);
        let order = match self.order.as_deref() {
            Some(raw) => raw
                .parse::<SortOrder>()
                .map_err(SearchError::invalid_request)?,
            None => SortOrder::Asc,
        };
        Ok(Sort {
            field: field.to_string(),
            order,
        })
    }
}

/// `GET /items/by-price?min=&max=`
#[derive(Debug, Deserialize)]
pub struct PriceRangeParams {
    pub min: f64,
    pub max: f64,
}

/// `GET /items/by-category-and-price?category=&price=`
#[derive(Debug, Deserialize)]
pub struct CategoryPriceParams {
    pub category: String,
    pub price: f64,
}

/// `GET /search/match`
#[derive(Debug, Deserialize)]
pub struct MatchParams {
    pub field: Option<String>,
    pub text: String,
    /// `or` (default) or `and`.
    pub operator: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl MatchParams {
    pub fn to_query(&self) -> SearchResult<Query> {
        let operator = match self.operator.as_deref().map(str::to_ascii_lowercase) {
            None => Operator::Or,
            Some(op) if op == "or" => Operator::Or,
            Some(op) if op == "and" => Operator::And,
            Some(other) => {
                return Err(SearchError::invalid_request(format!(
                    "operator must be or/and (got {other:?})"
                )));
            }
        };
        Ok(Query::Match {
            field: self.field.clone().unwrap_or_else(|| fields::TITLE.to_string()),
            text: self.text.clone(),
            operator,
        })
    }
}

/// `GET /search/term`
#[derive(Debug, Deserialize)]
pub struct TermParams {
    pub field: String,
    pub value: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// `GET /search/fuzzy`
#[derive(Debug, Deserialize)]
pub struct FuzzyParams {
    pub field: Option<String>,
    pub value: String,
    pub fuzziness: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl FuzzyParams {
    pub fn to_query(&self) -> SearchResult<Query> {
        let fuzziness = match self.fuzziness.as_deref() {
            Some(raw) => raw
                .parse::<Fuzziness>()
                .map_err(SearchError::invalid_request)?,
            None => Fuzziness::Auto,
        };
        Ok(Query::Fuzzy {
            field: self.field.clone().unwrap_or_else(|| fields::TITLE.to_string()),
            value: self.value.clone(),
            fuzziness,
        })
    }
}

/// `GET /search/page?category=&page=&size=`
#[derive(Debug, Deserialize)]
pub struct CategoryPageParams {
    pub category: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// `GET /search/sorted?category=&sort=&order=`
#[derive(Debug, Deserialize)]
pub struct SortedSearchParams {
    pub category: String,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SortedSearchParams {
    pub fn to_sort(&self) -> SearchResult<Sort> {
        SortParams {
            sort: self.sort.clone(),
            order: self.order.clone(),
        }
        .to_sort()
    }
}

/// `GET /aggregations/brands*`
#[derive(Debug, Deserialize)]
pub struct BucketParams {
    /// Maximum number of buckets (engine default when absent).
    pub size: Option<u32>,
}

impl BucketParams {
    pub fn bucket_size(&self) -> SearchResult<Option<u32>> {
        match self.size {
            Some(0) => Err(SearchError::invalid_request("bucket size must be at least 1")),
            other => Ok(other),
        }
    }
}

/// A single clause of a `POST /search/bool` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClauseDto {
    Match {
        field: String,
        text: String,
    },
    Term {
        field: String,
        value: Value,
    },
    Fuzzy {
        field: String,
        value: String,
        #[serde(default)]
        fuzziness: Option<String>,
    },
    Range {
        field: String,
        #[serde(default)]
        gte: Option<f64>,
        #[serde(default)]
        gt: Option<f64>,
        #[serde(default)]
        lte: Option<f64>,
        #[serde(default)]
        lt: Option<f64>,
    },
}

impl ClauseDto {
    pub fn to_query(&self) -> SearchResult<Query> {
        Ok(match self {
            ClauseDto::Match { field, text } => query::match_query(field.clone(), text.clone()),
            ClauseDto::Term { field, value } => query::term_query(field.clone(), value.clone()),
            ClauseDto::Fuzzy {
                field,
                value,
                fuzziness,
            } => {
                let fuzziness = match fuzziness.as_deref() {
                    Some(raw) => raw
                        .parse::<Fuzziness>()
                        .map_err(SearchError::invalid_request)?,
                    None => Fuzziness::Auto,
                };
                Query::Fuzzy {
                    field: field.clone(),
                    value: value.clone(),
                    fuzziness,
                }
            }
            ClauseDto::Range {
                field,
                gte,
                gt,
                lte,
                lt,
            } => {
                let bounds = [gte, gt, lte, lt];
                if bounds.iter().all(|b| b.is_none()) {
                    return Err(SearchError::invalid_request(format!(
                        "range on {field} needs at least one bound"
                    )));
                }
                let mut range = query::range_query(field.clone());
                if let Some(v) = gte {
                    range = range.gte(*v);
                }
                if let Some(v) = gt {
                    range = range.gt(*v);
                }
                if let Some(v) = lte {
                    range = range.lte(*v);
                }
                if let Some(v) = lt {
                    range = range.lt(*v);
                }
                range.into()
            }
        })
    }
}

/// `POST /search/bool` body.
#[derive(Debug, Default, Deserialize)]
pub struct BoolSearchRequest {
    #[serde(default)]
    pub must: Vec<ClauseDto>,
    #[serde(default)]
    pub should: Vec<ClauseDto>,
    #[serde(default)]
    pub must_not: Vec<ClauseDto>,
    #[serde(default)]
    pub filter: Vec<ClauseDto>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl BoolSearchRequest {
    pub fn to_query(&self) -> SearchResult<BoolQuery> {
        let mut q = BoolQuery::new();
        for c in &self.must {
            q = q.must(c.to_query()?);
        }
        for c in &self.should {
            q = q.should(c.to_query()?);
        }
        for c in &self.must_not {
            q = q.must_not(c.to_query()?);
        }
        for c in &self.filter {
            q = q.filter(c.to_query()?);
        }
        if q.is_empty() {
            return Err(SearchError::invalid_request(
                "bool query needs at least one clause",
            ));
        }
        Ok(q)
    }
}

/// `PUT /items/:id` body; the id comes from the path.
#[derive(Debug, Deserialize)]
pub struct ItemFields {
    pub title: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub images: String,
}

impl ItemFields {
    pub fn into_item(self, id: itemsearch_core::ItemId) -> Item {
        Item::new(
            id,
            self.title,
            self.category,
            self.brand,
            self.price,
            self.images,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct BrandBucket {
    pub key: String,
    pub doc_count: u64,
}

impl From<&TermsBucket> for BrandBucket {
    fn from(b: &TermsBucket) -> Self {
        Self {
            key: b.key_as_string().to_string(),
            doc_count: b.doc_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrandAvgBucket {
    pub key: String,
    pub doc_count: u64,
    /// `None` when the bucket has no priced documents.
    pub avg_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct IndexStatus {
    pub index: &'static str,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
}

/// Query-string term values: numbers and booleans are sent typed, anything else as text.
pub fn scalar_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(raw.to_string()),
    }
}
