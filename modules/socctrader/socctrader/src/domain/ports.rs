//! Output ports of the domain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use socckit::{Page, PageRequest};
use socctrader_sdk::EntityKind;
use xxhash_rust::xxh3::xxh3_64;

use crate::domain::record::Record;

/// Version carried by deletes. Outranks every store version, so a delete can
/// never be overtaken by an older index write for the same id.
pub const TOMBSTONE_VERSION: i64 = 1 << 62;

/// A search document: the record body plus the bookkeeping used for ordering
/// (`version`) and drift detection (`checksum`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub kind: EntityKind,
    pub id: i64,
    pub version: i64,
    pub checksum: String,
    pub body: serde_json::Value,
}

impl IndexDocument {
    /// Build the document for a stored record.
    ///
    /// # Errors
    /// Returns the serialization error if the record cannot be rendered to JSON.
    pub fn from_record<E: Record>(record: &E) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_value(record)?;
        let checksum = body_checksum(&body)?;
        Ok(Self {
            kind: E::KIND,
            id: record.id(),
            version: record.version(),
            checksum,
            body,
        })
    }

    /// Decode the body back into its record type.
    ///
    /// # Errors
    /// Returns the deserialization error when the body does not match `E`.
    pub fn to_record<E: Record>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }

    #[must_use]
    pub fn entry(&self) -> IndexEntry {
        IndexEntry {
            id: self.id,
            version: self.version,
            checksum: self.checksum.clone(),
        }
    }
}

/// xxh3-64 (hex) of the serialized body. `serde_json::Value` objects keep
/// their keys sorted, so equal bodies always hash equally.
///
/// # Errors
/// Returns the serialization error of `body`.
pub fn body_checksum(body: &serde_json::Value) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(body)?;
    Ok(format!("{:016x}", xxh3_64(&bytes)))
}

/// What reconciliation needs to know about one indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: i64,
    pub version: i64,
    pub checksum: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Transport failure or timeout; worth retrying.
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered with an error status.
    #[error("search backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed query: {0}")]
    InvalidQuery(String),
    /// The requested page lies beyond what the backend will page through.
    #[error("page out of range: page offset plus size must not exceed {limit}")]
    WindowExceeded { limit: u64 },
    #[error("unexpected search backend response: {0}")]
    Decode(String),
}

/// The search index port. Implementations must treat writes as versioned
/// upserts: a document whose version is lower than what is stored (or lower
/// than a delete tombstone) is silently ignored. Deleting an unknown id is a
/// no-op that still records the tombstone.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Short backend name for logs and status output.
    fn backend(&self) -> &'static str;

    async fn index(&self, doc: IndexDocument) -> Result<(), IndexError>;

    async fn delete(&self, kind: EntityKind, id: i64, version: i64) -> Result<(), IndexError>;

    async fn query(
        &self,
        kind: EntityKind,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<IndexDocument>, IndexError>;

    /// Every live document of `kind`.
    async fn entries(&self, kind: EntityKind) -> Result<Vec<IndexEntry>, IndexError>;
}
