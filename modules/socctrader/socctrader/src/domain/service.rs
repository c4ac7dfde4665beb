use std::sync::Arc;

use async_trait::async_trait;
use socckit::{Page, PageRequest};
use socctrader_sdk::EntityKind;
use tracing::{debug, error, info, instrument};

use crate::domain::error::DomainError;
use crate::domain::ports::{IndexDocument, IndexError};
use crate::domain::record::Record;
use crate::domain::repos::RecordRepository;
use crate::domain::sync::{ReconcileSource, SyncCoordinator, SyncOp};

/// CRUD and search for one record type.
///
/// Writes commit to the store and then hand the change to the
/// [`SyncCoordinator`]; they never wait on, or fail because of, the index.
pub struct RecordService<E: Record> {
    repo: Arc<dyn RecordRepository<E>>,
    sync: SyncCoordinator,
}

impl<E: Record> Clone for RecordService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            sync: self.sync.clone(),
        }
    }
}

impl<E: Record> RecordService<E> {
    pub fn new(repo: Arc<dyn RecordRepository<E>>, sync: SyncCoordinator) -> Self {
        Self { repo, sync }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    #[instrument(skip_all, fields(kind = %E::KIND))]
    pub async fn create(&self, draft: E::Draft) -> Result<E, DomainError> {
        E::validate(&draft)?;

        let record = self.repo.insert(draft).await?;
        self.propagate(&record);

        info!(id = record.id(), "record created");
        Ok(record)
    }

    #[instrument(skip(self, draft), fields(kind = %E::KIND))]
    pub async fn update(&self, id: i64, draft: E::Draft) -> Result<E, DomainError> {
        E::validate(&draft)?;

        let record = self
            .repo
            .update(id, draft)
            .await?
            .ok_or_else(|| DomainError::not_found(E::KIND, id))?;
        self.propagate(&record);

        info!(version = record.version(), "record updated");
        Ok(record)
    }

    #[instrument(skip(self), fields(kind = %E::KIND))]
    pub async fn get(&self, id: i64) -> Result<E, DomainError> {
        debug!("getting record by id");
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    #[instrument(skip_all, fields(kind = %E::KIND, page = page.page, size = page.size))]
    pub async fn list(&self, page: &PageRequest) -> Result<Page<E>, DomainError> {
        let page = self.repo.list(page).await?;
        debug!(items = page.items.len(), total = page.total, "listed records");
        Ok(page)
    }

    /// Remove the row, then queue the index delete. Deleting an unknown id is
    /// allowed and still clears any leftover index document.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    /// Fails only when the store does; the index is never consulted.
    #[instrument(skip(self), fields(kind = %E::KIND))]
    pub async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let removed = self.repo.delete(id).await?;
        self.enqueue(SyncOp::delete(E::KIND, id));

        if removed {
            info!("record deleted");
        } else {
            debug!("delete of a missing record");
        }
        Ok(removed)
    }

    #[instrument(skip(self, page), fields(kind = %E::KIND))]
    pub async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<E>, DomainError> {
        let hits = self
            .sync
            .index()
            .query(E::KIND, query, page)
            .await
            .map_err(|e| match e {
                IndexError::InvalidQuery(message) => DomainError::invalid_query(message),
                window @ IndexError::WindowExceeded { .. } => {
                    DomainError::validation("page", window.to_string())
                }
                other => DomainError::search(other.to_string()),
            })?;

        let mut items = Vec::with_capacity(hits.items.len());
        for doc in &hits.items {
            items.push(
                doc.to_record::<E>()
                    .map_err(|e| DomainError::search(format!("undecodable document {}: {e}", doc.id)))?,
            );
        }

        debug!(hits = items.len(), total = hits.total, "search finished");
        Ok(Page {
            items,
            page: hits.page,
            size: hits.size,
            total: hits.total,
        })
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        self.repo.count().await
    }

    fn propagate(&self, record: &E) {
        match SyncOp::index(record) {
            Ok(op) => self.enqueue(op),
            Err(e) => error!(id = record.id(), error = %e, "cannot build search document"),
        }
    }

    fn enqueue(&self, op: SyncOp) {
        let (id, version) = (op.id(), op.version());
        if !self.sync.submit(op) {
            debug!(id, version, "index operation not queued");
        }
    }
}

#[async_trait]
impl<E: Record> ReconcileSource for RecordService<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    async fn documents(&self) -> Result<Vec<IndexDocument>, DomainError> {
        self.repo
            .list_all()
            .await?
            .iter()
            .map(|record| {
                IndexDocument::from_record(record).map_err(|e| {
                    DomainError::search(format!("cannot build document {}: {e}", record.id()))
                })
            })
            .collect()
    }
}
