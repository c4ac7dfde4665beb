use async_trait::async_trait;
use socckit::{Page, PageRequest};

use crate::domain::error::DomainError;
use crate::domain::record::Record;

/// Persistence port for one record type.
///
/// The store is the source of truth: it assigns identities (never reused)
/// and versions (1 on insert, bumped atomically on each update).
#[async_trait]
pub trait RecordRepository<E: Record>: Send + Sync {
    async fn insert(&self, draft: E::Draft) -> Result<E, DomainError>;

    /// Overwrite the business fields of `id`. `None` when the row is missing.
    async fn update(&self, id: i64, draft: E::Draft) -> Result<Option<E>, DomainError>;

    async fn find(&self, id: i64) -> Result<Option<E>, DomainError>;

    /// One page ordered by `page.sort` (default `id` ascending).
    async fn list(&self, page: &PageRequest) -> Result<Page<E>, DomainError>;

    /// `true` when a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;

    /// Every row, read in id order in bounded chunks.
    async fn list_all(&self) -> Result<Vec<E>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
