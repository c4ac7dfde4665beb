#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::must_use_candidate,
    clippy::missing_panics_doc
)]
//! Test helpers shared by unit tests and the integration tests under `tests/`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use socckit::config::DatabaseConfig;
use socckit::{Page, PageRequest};
use socctrader_sdk::EntityKind;
use tokio_util::sync::CancellationToken;

use crate::config::SocctraderConfig;
use crate::domain::ports::{IndexDocument, IndexEntry, IndexError, SearchIndex};
use crate::infra::search::MemoryIndex;
use crate::infra::storage::connect_and_migrate;
use crate::module::AppServices;

/// Fresh, migrated in-memory `SQLite` database.
pub async fn inmem_db() -> DatabaseConnection {
    connect_and_migrate(&DatabaseConfig {
        dsn: "sqlite::memory:".to_owned(),
        max_connections: 1,
    })
    .await
    .expect("in-memory database")
}

/// Index wrapper that fails every call while switched off.
pub struct FaultyIndex {
    inner: Arc<dyn SearchIndex>,
    failing: AtomicBool,
    rejected: AtomicU64,
}

impl FaultyIndex {
    pub fn new(inner: Arc<dyn SearchIndex>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Calls refused while failing.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), IndexError> {
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(IndexError::Unavailable("injected outage".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for FaultyIndex {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn index(&self, doc: IndexDocument) -> Result<(), IndexError> {
        self.check()?;
        self.inner.index(doc).await
    }

    async fn delete(&self, kind: EntityKind, id: i64, version: i64) -> Result<(), IndexError> {
        self.check()?;
        self.inner.delete(kind, id, version).await
    }

    async fn query(
        &self,
        kind: EntityKind,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<IndexDocument>, IndexError> {
        self.check()?;
        self.inner.query(kind, text, page).await
    }

    async fn entries(&self, kind: EntityKind) -> Result<Vec<IndexEntry>, IndexError> {
        self.check()?;
        self.inner.entries(kind).await
    }
}

/// Config with millisecond retry delays.
pub fn fast_config() -> SocctraderConfig {
    let mut cfg = SocctraderConfig::default();
    cfg.sync.base_delay_ms = 5;
    cfg.sync.max_delay_ms = 40;
    cfg
}

/// Services over an in-memory database and the given index.
pub async fn services_with(index: Arc<dyn SearchIndex>) -> AppServices {
    AppServices::assemble(fast_config(), inmem_db().await, index, CancellationToken::new())
}

/// Services plus direct handles on the memory index and its fault switch.
pub async fn faulty_services() -> (AppServices, Arc<MemoryIndex>, Arc<FaultyIndex>) {
    let memory = Arc::new(MemoryIndex::new());
    let faulty = Arc::new(FaultyIndex::new(memory.clone()));
    let services = services_with(faulty.clone()).await;
    (services, memory, faulty)
}

/// Wait for the coordinator to drain, failing the test after five seconds.
pub async fn converge(services: &AppServices) {
    assert!(
        services.sync.wait_idle(Duration::from_secs(5)).await,
        "index did not converge: {:?}",
        services.sync_status()
    );
}
