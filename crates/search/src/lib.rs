//! Search-engine client layer.
//!
//! Everything that touches the engine lives here:
//! - `query`, `request`, `aggregation`: typed builders rendering the engine's query DSL
//! - `page`: paging parameters and page echo (total, pages, number, size)
//! - `backend`: the engine contract (`SearchBackend`) and raw response shapes
//! - `elasticsearch`: REST implementation of the contract over `reqwest`
//! - `document` + `repository`: index definitions and the typed item repository

pub mod aggregation;
pub mod backend;
pub mod document;
pub mod elasticsearch;
pub mod error;
pub mod page;
pub mod query;
pub mod repository;
pub mod request;

pub use aggregation::{
    Aggregation, AggregationResult, Aggregations, MetricKind, MetricValue, TermsAggregation,
    TermsBucket,
};
pub use backend::{ClusterHealth, Hit, SearchBackend, SearchResponse};
pub use document::{Document, IndexSettings};
pub use elasticsearch::{ElasticsearchBackend, ElasticsearchConfig, RefreshPolicy};
pub use error::{SearchError, SearchResult};
pub use page::{AggregatedPage, Page, PageRequest};
pub use query::{BoolQuery, Fuzziness, Operator, Query, RangeQuery};
pub use repository::{DEFAULT_SCAN_SIZE, IndexOperations, ItemRepository};
pub use request::{SearchRequest, Sort, SortOrder};
