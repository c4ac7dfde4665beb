//! Propagation of committed store writes to the search index.
//!
//! Per id the index moves through `PendingIndex -> Synced` on create/update and
//! `PendingDelete -> Absent` on delete. A slot in the [`SyncCoordinator`] exists
//! exactly while an id has work outstanding; its single worker task applies
//! the newest queued operation, retrying with [`Backoff`] until it lands.

pub mod backoff;
pub mod coordinator;
pub mod metrics;
pub mod reconcile;

pub use backoff::Backoff;
pub use coordinator::{SyncCoordinator, SyncOp};
pub use metrics::SyncStatus;
pub use reconcile::{KindReport, ReconcileReport, ReconcileSource, reconcile};
