//! `itemsearch-core`: catalog domain building blocks.
//!
//! This crate contains the **pure domain** model of the product catalog (no IO,
//! no HTTP, no search-engine client). Persistence is owned by the search engine.

pub mod error;
pub mod id;
pub mod item;

pub use error::{DomainError, DomainResult};
pub use id::ItemId;
pub use item::{Item, fields, sample_catalog};
