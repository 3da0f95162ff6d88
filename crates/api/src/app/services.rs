use std::sync::Arc;

use itemsearch_search::{
    ElasticsearchBackend, IndexOperations, IndexSettings, ItemRepository, SearchBackend,
    SearchResult,
};

use crate::config::ApiConfig;

/// Engine client shared by every handler.
pub type SharedBackend = Arc<dyn SearchBackend>;

pub struct AppServices {
    pub items: ItemRepository<SharedBackend>,
    pub indices: IndexOperations<SharedBackend>,
}

impl AppServices {
    pub fn new(backend: SharedBackend, index: IndexSettings, scan_size: u32) -> Self {
        Self {
            items: ItemRepository::new(backend.clone()).with_scan_size(scan_size),
            indices: IndexOperations::new(backend, index),
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        self.items.backend()
    }
}

pub fn build_services(config: &ApiConfig) -> SearchResult<AppServices> {
    let backend: SharedBackend = Arc::new(ElasticsearchBackend::new(config.engine.clone())?);
    tracing::info!(
        engine = %config.engine.url,
        refresh = config.engine.refresh.as_param(),
        "search engine client ready"
    );
    Ok(AppServices::new(
        backend,
        config.index.clone(),
        config.scan_size,
    ))
}
