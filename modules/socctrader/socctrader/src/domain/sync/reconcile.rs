//! Full diff-and-repair pass between the store and the search index.
//!
//! For each kind the index is listed before the store, so a row committed
//! while the pass runs is either seen in the store (and submitted) or is
//! covered by its own live write. Every repair goes through the coordinator,
//! so live traffic and reconciliation share the per-id ordering and the
//! newest version wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use socctrader_sdk::EntityKind;
use tracing::{info, instrument, warn};

use super::coordinator::{SyncCoordinator, SyncOp};
use crate::domain::error::DomainError;
use crate::domain::ports::{IndexDocument, IndexEntry};

/// Store side of reconciliation for one kind.
#[async_trait]
pub trait ReconcileSource: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Freshly built documents for every stored row.
    async fn documents(&self) -> Result<Vec<IndexDocument>, DomainError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindReport {
    pub kind: EntityKind,
    pub stored: usize,
    pub indexed: usize,
    /// Stored rows with no index document.
    pub missing: usize,
    /// Index documents with no stored row.
    pub orphaned: usize,
    /// Index documents whose checksum differs from the stored row.
    pub stale: usize,
    /// Repairs not queued because newer work for the id already was.
    pub skipped: usize,
}

impl KindReport {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            stored: 0,
            indexed: 0,
            missing: 0,
            orphaned: 0,
            stale: 0,
            skipped: 0,
        }
    }

    /// Repairs found for this kind.
    #[must_use]
    pub fn repairs(&self) -> usize {
        self.missing + self.orphaned + self.stale
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub kinds: Vec<KindReport>,
}

impl ReconcileReport {
    #[must_use]
    pub fn repairs(&self) -> usize {
        self.kinds.iter().map(KindReport::repairs).sum()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repairs() == 0
    }

    #[must_use]
    pub fn for_kind(&self, kind: EntityKind) -> Option<&KindReport> {
        self.kinds.iter().find(|r| r.kind == kind)
    }
}

/// Run one pass over `sources`. The repairs are submitted, not awaited; use
/// [`SyncCoordinator::wait_idle`] to wait for them to land.
///
/// # Errors
/// Fails on the first kind whose index entries or store rows cannot be read.
#[instrument(skip_all, fields(kinds = sources.len()))]
pub async fn reconcile(
    sync: &SyncCoordinator,
    sources: &[Arc<dyn ReconcileSource>],
) -> Result<ReconcileReport, DomainError> {
    let mut report = ReconcileReport::default();

    for source in sources {
        let kind_report = reconcile_kind(sync, source.as_ref()).await?;
        if kind_report.repairs() > 0 {
            info!(
                kind = %kind_report.kind,
                missing = kind_report.missing,
                orphaned = kind_report.orphaned,
                stale = kind_report.stale,
                "reconciliation queued repairs"
            );
        }
        report.kinds.push(kind_report);
    }

    info!(repairs = report.repairs(), "reconciliation pass finished");
    Ok(report)
}

async fn reconcile_kind(
    sync: &SyncCoordinator,
    source: &dyn ReconcileSource,
) -> Result<KindReport, DomainError> {
    let kind = source.kind();
    let mut report = KindReport::new(kind);

    let entries = sync.index().entries(kind).await.map_err(|e| {
        warn!(kind = %kind, error = %e, "cannot list index entries");
        DomainError::search(e.to_string())
    })?;
    let documents = source.documents().await?;

    report.indexed = entries.len();
    report.stored = documents.len();

    let mut indexed: HashMap<i64, IndexEntry> =
        entries.into_iter().map(|entry| (entry.id, entry)).collect();

    for doc in documents {
        match indexed.remove(&doc.id) {
            None => report.missing += 1,
            Some(entry) if entry.checksum != doc.checksum => report.stale += 1,
            Some(_) => continue,
        }
        if !sync.submit(SyncOp::Index(doc)) {
            report.skipped += 1;
        }
    }

    let mut orphans: Vec<i64> = indexed.into_keys().collect();
    orphans.sort_unstable();
    report.orphaned = orphans.len();
    for id in orphans {
        if !sync.submit(SyncOp::delete(kind, id)) {
            report.skipped += 1;
        }
    }

    Ok(report)
}
