//! Search index adapters and the shared query language.

pub mod elasticsearch;
pub mod memory;
pub mod query;

use std::sync::Arc;

use tracing::info;

use crate::config::{SearchBackend, SearchConfig};
use crate::domain::ports::{IndexError, SearchIndex};

pub use elasticsearch::ElasticsearchIndex;
pub use memory::MemoryIndex;
pub use query::{Query, QueryError};

/// Build the configured backend.
///
/// # Errors
/// Returns [`IndexError::Unavailable`] when the Elasticsearch client cannot be set up.
pub fn build_index(cfg: &SearchConfig) -> Result<Arc<dyn SearchIndex>, IndexError> {
    let index: Arc<dyn SearchIndex> = match cfg.backend {
        SearchBackend::Memory => Arc::new(MemoryIndex::new()),
        SearchBackend::Elasticsearch => Arc::new(ElasticsearchIndex::new(cfg)?),
    };
    info!(backend = index.backend(), "search index ready");
    Ok(index)
}
