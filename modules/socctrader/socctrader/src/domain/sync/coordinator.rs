use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use socctrader_sdk::EntityKind;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::backoff::Backoff;
use super::metrics::{self, SyncCounters, SyncStatus};
use crate::domain::ports::{IndexDocument, IndexError, SearchIndex, TOMBSTONE_VERSION};
use crate::domain::record::Record;

/// One index mutation derived from a committed store write.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    Index(IndexDocument),
    Delete { kind: EntityKind, id: i64 },
}

impl SyncOp {
    /// # Errors
    /// Returns the serialization error if the record cannot be rendered.
    pub fn index<E: Record>(record: &E) -> Result<Self, serde_json::Error> {
        IndexDocument::from_record(record).map(Self::Index)
    }

    #[must_use]
    pub fn delete(kind: EntityKind, id: i64) -> Self {
        Self::Delete { kind, id }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Index(doc) => doc.kind,
            Self::Delete { kind, .. } => *kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Index(doc) => doc.id,
            Self::Delete { id, .. } => *id,
        }
    }

    /// Store version for writes, [`TOMBSTONE_VERSION`] for deletes.
    #[must_use]
    pub fn version(&self) -> i64 {
        match self {
            Self::Index(doc) => doc.version,
            Self::Delete { .. } => TOMBSTONE_VERSION,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Index(_) => "index",
            Self::Delete { .. } => "delete",
        }
    }
}

type SlotKey = (EntityKind, i64);

#[derive(Debug)]
struct Queued {
    op: SyncOp,
    at: Instant,
}

/// Outstanding work for one id. Present in the map exactly while a worker
/// task owns the id.
#[derive(Debug)]
struct Slot {
    /// Newest operation not yet picked up by the worker.
    queued: Option<Queued>,
    /// Version of the newest operation handed to the worker. Never decreases
    /// while the slot lives.
    inflight: Option<i64>,
    /// Enqueue time of the oldest operation not yet applied.
    oldest: Instant,
}

impl Slot {
    /// Highest version already accepted for this id, queued or handed out.
    fn accepted_version(&self) -> Option<i64> {
        let queued = self.queued.as_ref().map(|q| q.op.version());
        queued.max(self.inflight)
    }

    fn hand_out(&mut self) -> Option<SyncOp> {
        let queued = self.queued.take()?;
        self.inflight = Some(queued.op.version());
        Some(queued.op)
    }
}

struct Inner {
    index: Arc<dyn SearchIndex>,
    backoff: Backoff,
    slots: DashMap<SlotKey, Slot>,
    outstanding: AtomicU64,
    idle: Notify,
    counters: SyncCounters,
    cancel: CancellationToken,
}

impl Inner {
    /// Next operation for `key`, or `None` after retiring the slot.
    fn next_op(&self, key: SlotKey) -> Option<SyncOp> {
        loop {
            if let Some(op) = self.slots.get_mut(&key).and_then(|mut slot| slot.hand_out()) {
                return Some(op);
            }

            if self
                .slots
                .remove_if(&key, |_, slot| slot.queued.is_none())
                .is_some()
            {
                let left = self.outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
                metrics::set_pending(left);
                if left == 0 {
                    self.idle.notify_waiters();
                }
                return None;
            }

            // A submit raced in between the two lookups.
            if !self.slots.contains_key(&key) {
                return None;
            }
        }
    }

    fn mark_applied(&self, key: SlotKey, op: &SyncOp) {
        match op {
            SyncOp::Index(_) => self.counters.record_indexed(op.kind()),
            SyncOp::Delete { .. } => self.counters.record_deleted(op.kind()),
        }
        if let Some(mut slot) = self.slots.get_mut(&key) {
            slot.oldest = slot.queued.as_ref().map_or_else(Instant::now, |q| q.at);
        }
    }

    /// The queued operation for `key` if it outranks `current`.
    fn take_newer(&self, key: SlotKey, current: &SyncOp) -> Option<SyncOp> {
        let mut slot = self.slots.get_mut(&key)?;
        if slot
            .queued
            .as_ref()
            .is_some_and(|queued| queued.op.version() > current.version())
        {
            slot.hand_out()
        } else {
            None
        }
    }

    fn lag_seconds(&self) -> f64 {
        let now = Instant::now();
        self.slots
            .iter()
            .map(|slot| now.saturating_duration_since(slot.oldest))
            .max()
            .map_or(0.0, |lag| lag.as_secs_f64())
    }
}

/// Serializes index writes per id and retries them until they land.
///
/// Writers call [`submit`](Self::submit) after their store commit and never
/// wait on the index. Each id with outstanding work has a single worker task;
/// a newer operation for the same id replaces the queued one and is picked
/// up by the worker at its next attempt. Across ids there is no ordering.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("backend", &self.inner.index.backend())
            .field("backoff", &self.inner.backoff)
            .field("slots", &self.inner.slots.len())
            .field("outstanding", &self.inner.outstanding.load(Ordering::Relaxed))
            .field("counters", &self.inner.counters)
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(index: Arc<dyn SearchIndex>, backoff: Backoff) -> Self {
        Self::with_cancellation(index, backoff, CancellationToken::new())
    }

    /// Coordinator whose workers stop when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(
        index: Arc<dyn SearchIndex>,
        backoff: Backoff,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                index,
                backoff,
                slots: DashMap::new(),
                outstanding: AtomicU64::new(0),
                idle: Notify::new(),
                counters: SyncCounters::default(),
                cancel,
            }),
        }
    }

    #[must_use]
    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.inner.index
    }

    /// Queue `op` for its id. Must be called from within a tokio runtime.
    ///
    /// Returns `false` when the operation was dropped: an operation with the
    /// same or a newer version is already queued or being delivered, or the
    /// coordinator is shut down.
    #[must_use = "a dropped operation is never applied"]
    pub fn submit(&self, op: SyncOp) -> bool {
        if self.inner.cancel.is_cancelled() {
            warn!(
                kind = %op.kind(),
                id = op.id(),
                "sync coordinator is shut down; dropping index operation"
            );
            return false;
        }

        let key = (op.kind(), op.id());
        let spawn = match self.inner.slots.entry(key) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if let Some(accepted) = slot.accepted_version().filter(|v| *v >= op.version()) {
                    debug!(
                        kind = %op.kind(),
                        id = op.id(),
                        version = op.version(),
                        accepted_version = accepted,
                        "dropping index operation that is not newer than the accepted one"
                    );
                    self.inner.counters.record_dropped_stale();
                    return false;
                }
                let at = match slot.queued.take() {
                    Some(queued) => {
                        self.inner.counters.record_superseded();
                        queued.at
                    }
                    None => Instant::now(),
                };
                slot.queued = Some(Queued { op, at });
                false
            }
            Entry::Vacant(entry) => {
                let now = Instant::now();
                entry.insert(Slot {
                    queued: Some(Queued { op, at: now }),
                    inflight: None,
                    oldest: now,
                });
                let pending = self.inner.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                metrics::set_pending(pending);
                true
            }
        };

        if spawn {
            let inner = Arc::clone(&self.inner);
            let span = info_span!("index_sync", kind = %key.0, id = key.1);
            tokio::spawn(run_worker(inner, key).instrument(span));
        }
        true
    }

    /// Ids with index work outstanding.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        let pending = self.pending();
        let lag = self.inner.lag_seconds();
        metrics::set_pending(pending);
        metrics::set_lag(lag);
        self.inner
            .counters
            .snapshot(self.inner.index.backend(), pending, lag)
    }

    /// Wait until no id has outstanding work. Returns `false` on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.pending() == 0;
            }
        }
    }

    /// Stop all workers. Outstanding operations are abandoned; run
    /// reconciliation after restart to repair them.
    pub fn shutdown(&self) {
        let abandoned = self.pending();
        if abandoned > 0 {
            warn!(abandoned, "shutting down with index operations outstanding");
        } else {
            info!("sync coordinator shut down");
        }
        self.inner.cancel.cancel();
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

async fn apply(index: &dyn SearchIndex, op: &SyncOp) -> Result<(), IndexError> {
    match op {
        SyncOp::Index(doc) => index.index(doc.clone()).await,
        SyncOp::Delete { kind, id } => index.delete(*kind, *id, TOMBSTONE_VERSION).await,
    }
}

async fn run_worker(inner: Arc<Inner>, key: SlotKey) {
    let mut backoff = inner.backoff.clone();
    while let Some(op) = inner.next_op(key) {
        backoff.reset();
        if !deliver(&inner, key, op, &mut backoff).await {
            debug!("index worker cancelled");
            return;
        }
    }
}

/// Apply `op`, retrying forever. A newer queued operation replaces `op`
/// between attempts. Returns `false` when cancelled.
async fn deliver(inner: &Inner, key: SlotKey, mut op: SyncOp, backoff: &mut Backoff) -> bool {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let result = tokio::select! {
            () = inner.cancel.cancelled() => return false,
            result = apply(inner.index.as_ref(), &op) => result,
        };

        match result {
            Ok(()) => {
                inner.mark_applied(key, &op);
                if attempt > 1 {
                    info!(
                        op = op.label(),
                        version = op.version(),
                        attempts = attempt,
                        "index operation applied after retries"
                    );
                } else {
                    debug!(op = op.label(), version = op.version(), "index operation applied");
                }
                return true;
            }
            Err(e) => {
                inner.counters.record_retry(op.kind());
                metrics::set_lag(inner.lag_seconds());
                let delay = backoff.next_delay();
                warn!(
                    op = op.label(),
                    version = op.version(),
                    attempt,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "index operation failed; will retry"
                );

                tokio::select! {
                    () = inner.cancel.cancelled() => return false,
                    () = tokio::time::sleep(delay) => {}
                }

                if let Some(newer) = inner.take_newer(key, &op) {
                    debug!(
                        stale_version = op.version(),
                        version = newer.version(),
                        "retry superseded by a newer operation"
                    );
                    inner.counters.record_superseded();
                    op = newer;
                }
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::infra::search::memory::MemoryIndex;
    use crate::test_support::FaultyIndex;
    use socctrader_sdk::Team;
    use tracing_test::traced_test;

    fn team(id: i64, version: i64, name: &str) -> Team {
        Team {
            id,
            version,
            team_id: None,
            team_name: Some(name.to_owned()),
            league_id: None,
            game_id: None,
        }
    }

    fn fast_backoff() -> Backoff {
        Backoff::new(Duration::from_millis(5), Duration::from_millis(20), 2.0)
    }

    #[tokio::test]
    async fn applies_and_retires_the_slot() {
        let index = Arc::new(MemoryIndex::new());
        let sync = SyncCoordinator::new(index.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(1, 1, "AAAAA")).unwrap()));
        assert!(sync.wait_idle(Duration::from_secs(5)).await);

        assert_eq!(sync.pending(), 0);
        let entries = index.entries(EntityKind::Team).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, 1);
        assert_eq!(sync.status().indexed, 1);
    }

    #[tokio::test]
    async fn not_newer_operation_is_dropped_while_queued() {
        let faulty = Arc::new(FaultyIndex::new(Arc::new(MemoryIndex::new())));
        faulty.set_failing(true);
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(1, 1, "first")).unwrap()));
        // Replaces v1 in the queue, or waits behind it if v1 is already in flight.
        assert!(sync.submit(SyncOp::index(&team(1, 3, "third")).unwrap()));
        assert!(!sync.submit(SyncOp::index(&team(1, 2, "second")).unwrap()));
        assert_eq!(sync.status().dropped_stale, 1);

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        let entries = faulty.entries(EntityKind::Team).await.unwrap();
        assert_eq!(entries[0].version, 3);
    }

    async fn wait_for_retries(sync: &SyncCoordinator, at_least: u64) {
        for _ in 0..400 {
            if sync.status().retry_count >= at_least {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("no retries observed: {:?}", sync.status());
    }

    #[tokio::test]
    async fn older_operation_never_replaces_the_one_in_flight() {
        let faulty = Arc::new(FaultyIndex::new(Arc::new(MemoryIndex::new())));
        faulty.set_failing(true);
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(1, 3, "newer")).unwrap()));
        wait_for_retries(&sync, 1).await;
        assert!(!sync.submit(SyncOp::index(&team(1, 2, "older")).unwrap()));
        assert_eq!(sync.status().dropped_stale, 1);

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        let entries = faulty.entries(EntityKind::Team).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].version, 3);
        assert_eq!(
            entries[0].checksum,
            IndexDocument::from_record(&team(1, 3, "newer")).unwrap().checksum
        );
    }

    #[tokio::test]
    async fn repair_write_cannot_undo_a_delete_in_flight() {
        let memory = Arc::new(MemoryIndex::new());
        let faulty = Arc::new(FaultyIndex::new(memory.clone()));
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(5, 1, "kept")).unwrap()));
        assert!(sync.wait_idle(Duration::from_secs(5)).await);

        faulty.set_failing(true);
        assert!(sync.submit(SyncOp::delete(EntityKind::Team, 5)));
        wait_for_retries(&sync, 1).await;
        assert!(!sync.submit(SyncOp::index(&team(5, 1, "kept")).unwrap()));

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        assert!(memory.document(EntityKind::Team, 5).is_none());
    }

    #[tokio::test]
    async fn newer_operation_still_supersedes_the_one_in_flight() {
        let faulty = Arc::new(FaultyIndex::new(Arc::new(MemoryIndex::new())));
        faulty.set_failing(true);
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(2, 1, "first")).unwrap()));
        wait_for_retries(&sync, 1).await;
        assert!(sync.submit(SyncOp::index(&team(2, 2, "second")).unwrap()));

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        let entries = faulty.entries(EntityKind::Team).await.unwrap();
        assert_eq!(entries[0].version, 2);
        assert_eq!(sync.status().superseded, 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn outage_keeps_work_pending_and_counts_retries() {
        let faulty = Arc::new(FaultyIndex::new(Arc::new(MemoryIndex::new())));
        faulty.set_failing(true);
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(7, 1, "x")).unwrap()));
        assert!(sync.submit(SyncOp::delete(EntityKind::Team, 8)));
        assert!(!sync.wait_idle(Duration::from_millis(80)).await);

        let status = sync.status();
        assert_eq!(status.pending, 2);
        assert!(status.retry_count >= 2);
        assert!(status.lag_seconds > 0.0);

        assert!(logs_contain("index operation failed; will retry"));

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        assert_eq!(sync.pending(), 0);
        assert!(logs_contain("index operation applied after retries"));
    }

    #[tokio::test]
    async fn delete_outranks_queued_writes() {
        let faulty = Arc::new(FaultyIndex::new(Arc::new(MemoryIndex::new())));
        faulty.set_failing(true);
        let sync = SyncCoordinator::new(faulty.clone(), fast_backoff());

        assert!(sync.submit(SyncOp::index(&team(4, 1, "a")).unwrap()));
        assert!(sync.submit(SyncOp::delete(EntityKind::Team, 4)));
        assert!(!sync.submit(SyncOp::index(&team(4, 2, "late")).unwrap()));

        faulty.set_failing(false);
        assert!(sync.wait_idle(Duration::from_secs(5)).await);
        assert!(faulty.entries(EntityKind::Team).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_accepting_work() {
        let sync = SyncCoordinator::new(Arc::new(MemoryIndex::new()), fast_backoff());
        sync.shutdown();
        assert!(sync.is_shut_down());
        assert!(!sync.submit(SyncOp::delete(EntityKind::Game, 1)));
        assert!(sync.wait_idle(Duration::from_millis(10)).await);
    }
}
