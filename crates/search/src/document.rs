//! Index definitions for document types.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use itemsearch_core::{Item, fields};

/// Index-level settings shared by every document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub shards: u32,
    pub replicas: u32,
    /// Analyzer applied to full-text fields.
    pub text_analyzer: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            shards: 1,
            replicas: 0,
            text_analyzer: "standard".to_string(),
        }
    }
}

/// A type stored as documents in its own index.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const INDEX: &'static str;

    /// Engine document id.
    fn document_id(&self) -> String;

    /// Field mappings (`{ "properties": ... }`).
    fn mapping(settings: &IndexSettings) -> Value;

    /// Body for index creation: settings plus mappings.
    fn index_body(settings: &IndexSettings) -> Value {
        json!({
            "settings": {
                "number_of_shards": settings.shards,
                "number_of_replicas": settings.replicas,
            },
            "mappings": Self::mapping(settings),
        })
    }
}

impl Document for Item {
    const INDEX: &'static str = "item";

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn mapping(settings: &IndexSettings) -> Value {
        json!({
            "properties": {
                (fields::ID): { "type": "long" },
                (fields::TITLE): { "type": "text", "analyzer": settings.text_analyzer },
                (fields::CATEGORY): { "type": "keyword" },
                (fields::BRAND): { "type": "keyword" },
                (fields::PRICE): { "type": "double" },
                (fields::IMAGES): { "type": "keyword", "index": false },
            }
        })
    }
}
