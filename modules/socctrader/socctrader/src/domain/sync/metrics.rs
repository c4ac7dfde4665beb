//! Sync observability.
//!
//! Emitted through the `metrics` facade (the host picks the exporter):
//! - `index_pending` gauge: ids with an index operation outstanding
//! - `index_retry_count` counter, labelled by `kind`
//! - `index_lag_seconds` gauge: age of the oldest outstanding operation
//!
//! The same numbers are kept locally and served as a [`SyncStatus`] snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};
use serde::Serialize;
use socctrader_sdk::EntityKind;

pub const INDEX_PENDING: &str = "index_pending";
pub const INDEX_RETRY_COUNT: &str = "index_retry_count";
pub const INDEX_LAG_SECONDS: &str = "index_lag_seconds";
pub const INDEX_OPERATIONS_TOTAL: &str = "index_operations_total";

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub backend: &'static str,
    pub pending: u64,
    pub lag_seconds: f64,
    pub retry_count: u64,
    pub indexed: u64,
    pub deleted: u64,
    pub superseded: u64,
    pub dropped_stale: u64,
}

#[derive(Debug, Default)]
pub struct SyncCounters {
    retries: AtomicU64,
    indexed: AtomicU64,
    deleted: AtomicU64,
    superseded: AtomicU64,
    dropped_stale: AtomicU64,
}

impl SyncCounters {
    pub fn record_retry(&self, kind: EntityKind) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        counter!(INDEX_RETRY_COUNT, "kind" => kind.name()).increment(1);
    }

    pub fn record_indexed(&self, kind: EntityKind) {
        self.indexed.fetch_add(1, Ordering::Relaxed);
        counter!(INDEX_OPERATIONS_TOTAL, "kind" => kind.name(), "op" => "index").increment(1);
    }

    pub fn record_deleted(&self, kind: EntityKind) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
        counter!(INDEX_OPERATIONS_TOTAL, "kind" => kind.name(), "op" => "delete").increment(1);
    }

    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_stale(&self) {
        self.dropped_stale.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn snapshot(&self, backend: &'static str, pending: u64, lag_seconds: f64) -> SyncStatus {
        SyncStatus {
            backend,
            pending,
            lag_seconds,
            retry_count: self.retries.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            dropped_stale: self.dropped_stale.load(Ordering::Relaxed),
        }
    }
}

pub fn set_pending(pending: u64) {
    gauge!(INDEX_PENDING).set(gauge_value(pending));
}

pub fn set_lag(lag_seconds: f64) {
    gauge!(INDEX_LAG_SECONDS).set(lag_seconds);
}

fn gauge_value(n: u64) -> f64 {
    u32::try_from(n).map_or(f64::from(u32::MAX), f64::from)
}
