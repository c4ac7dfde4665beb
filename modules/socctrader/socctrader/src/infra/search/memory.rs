//! In-process search index.
//!
//! Keeps the same external-version rules as the Elasticsearch adapter so
//! either backend can sit behind the coordinator. Tombstones are kept for a
//! retention window, like Elasticsearch's `index.gc_deletes`, then purged.

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use socckit::{Page, PageRequest};
use socctrader_sdk::EntityKind;
use tracing::trace;

use super::query::Query;
use crate::domain::ports::{IndexDocument, IndexEntry, IndexError, SearchIndex};

#[derive(Debug, Clone)]
struct Slot {
    version: i64,
    /// `None` marks a tombstone.
    doc: Option<IndexDocument>,
}

/// How long a delete keeps blocking older writes for its id.
pub const DEFAULT_TOMBSTONE_RETENTION: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct State {
    kinds: BTreeMap<EntityKind, BTreeMap<i64, Slot>>,
    /// Tombstones in the order they were written.
    tombstones: VecDeque<(Instant, EntityKind, i64)>,
}

impl State {
    fn purge_tombstones(&mut self, retention: Duration) {
        let now = Instant::now();
        while let Some(&(at, kind, id)) = self.tombstones.front() {
            if now.saturating_duration_since(at) < retention {
                break;
            }
            self.tombstones.pop_front();
            let Some(slots) = self.kinds.get_mut(&kind) else {
                continue;
            };
            if slots.get(&id).is_some_and(|slot| slot.doc.is_none()) {
                slots.remove(&id);
            }
        }
    }
}

#[derive(Debug)]
pub struct MemoryIndex {
    state: RwLock<State>,
    tombstone_retention: Duration,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::with_tombstone_retention(DEFAULT_TOMBSTONE_RETENTION)
    }
}

impl MemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tombstone_retention(tombstone_retention: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            tombstone_retention,
        }
    }

    /// Tombstones currently held, across all kinds.
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.state
            .read()
            .kinds
            .values()
            .map(|slots| slots.values().filter(|s| s.doc.is_none()).count())
            .sum()
    }

    /// The live document for `id`, if any.
    #[must_use]
    pub fn document(&self, kind: EntityKind, id: i64) -> Option<IndexDocument> {
        self.state
            .read()
            .kinds
            .get(&kind)
            .and_then(|slots| slots.get(&id))
            .and_then(|slot| slot.doc.clone())
    }

    /// Number of live documents of `kind`.
    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        self.state
            .read()
            .kinds
            .get(&kind)
            .map_or(0, |slots| slots.values().filter(|s| s.doc.is_some()).count())
    }

    #[must_use]
    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    /// Drop any trace of `id`, tombstone included. Used to simulate drift.
    pub fn forget(&self, kind: EntityKind, id: i64) {
        if let Some(slots) = self.state.write().kinds.get_mut(&kind) {
            slots.remove(&id);
        }
    }

    /// Write a document without version checks. Used to simulate drift.
    pub fn force_put(&self, doc: IndexDocument) {
        self.state.write().kinds.entry(doc.kind).or_default().insert(
            doc.id,
            Slot {
                version: doc.version,
                doc: Some(doc),
            },
        );
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn index(&self, doc: IndexDocument) -> Result<(), IndexError> {
        let mut state = self.state.write();
        state.purge_tombstones(self.tombstone_retention);
        let slots = state.kinds.entry(doc.kind).or_default();

        if let Some(stored) = slots.get(&doc.id).map(|s| s.version).filter(|v| *v > doc.version) {
            trace!(id = doc.id, version = doc.version, stored, "ignoring stale write");
            return Ok(());
        }

        slots.insert(
            doc.id,
            Slot {
                version: doc.version,
                doc: Some(doc),
            },
        );
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: i64, version: i64) -> Result<(), IndexError> {
        let mut state = self.state.write();
        state.purge_tombstones(self.tombstone_retention);
        let slots = state.kinds.entry(kind).or_default();

        if slots.get(&id).is_some_and(|current| current.version >= version) {
            trace!(id, version, "ignoring stale delete");
            return Ok(());
        }

        slots.insert(id, Slot { version, doc: None });
        state.tombstones.push_back((Instant::now(), kind, id));
        Ok(())
    }

    async fn query(
        &self,
        kind: EntityKind,
        text: &str,
        page: &PageRequest,
    ) -> Result<Page<IndexDocument>, IndexError> {
        let query = Query::parse(text).map_err(|e| IndexError::InvalidQuery(e.to_string()))?;

        let state = self.state.read();
        let hits: Vec<&IndexDocument> = state
            .kinds
            .get(&kind)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter_map(|slot| slot.doc.as_ref())
            .filter(|doc| query.matches(&doc.body))
            .collect();

        let total = u64::try_from(hits.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.size).unwrap_or(usize::MAX);
        let items = hits.into_iter().skip(skip).take(take).cloned().collect();

        Ok(Page::new(items, page, total))
    }

    async fn entries(&self, kind: EntityKind) -> Result<Vec<IndexEntry>, IndexError> {
        Ok(self
            .state
            .read()
            .kinds
            .get(&kind)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter_map(|slot| slot.doc.as_ref().map(IndexDocument::entry))
            .collect())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::ports::{TOMBSTONE_VERSION, body_checksum};

    fn team_doc(id: i64, version: i64, name: &str) -> IndexDocument {
        let body = json!({"id": id, "version": version, "teamName": name});
        IndexDocument {
            kind: EntityKind::Team,
            id,
            version,
            checksum: body_checksum(&body).unwrap(),
            body,
        }
    }

    #[tokio::test]
    async fn lower_versions_never_overwrite() {
        let index = MemoryIndex::new();
        index.index(team_doc(1, 3, "new")).await.unwrap();
        index.index(team_doc(1, 2, "old")).await.unwrap();
        assert_eq!(index.document(EntityKind::Team, 1).unwrap().body["teamName"], "new");

        index.index(team_doc(1, 3, "same version")).await.unwrap();
        assert_eq!(index.document(EntityKind::Team, 1).unwrap().version, 3);
    }

    #[tokio::test]
    async fn tombstones_block_resurrection() {
        let index = MemoryIndex::new();
        index.index(team_doc(1, 1, "AAAAA")).await.unwrap();
        index.delete(EntityKind::Team, 1, TOMBSTONE_VERSION).await.unwrap();
        index.index(team_doc(1, 2, "BBBBB")).await.unwrap();

        assert!(index.document(EntityKind::Team, 1).is_none());
        assert!(index.entries(EntityKind::Team).await.unwrap().is_empty());

        // Unknown ids are a no-op that still leaves a tombstone.
        index.delete(EntityKind::Team, 9, TOMBSTONE_VERSION).await.unwrap();
        index.index(team_doc(9, 1, "late")).await.unwrap();
        assert!(index.is_empty(EntityKind::Team));
    }

    #[tokio::test]
    async fn tombstones_expire_after_the_retention_window() {
        let index = MemoryIndex::with_tombstone_retention(Duration::from_millis(20));
        for id in 100..110 {
            index.delete(EntityKind::Team, id, TOMBSTONE_VERSION).await.unwrap();
        }
        assert_eq!(index.tombstones(), 10);

        tokio::time::sleep(Duration::from_millis(40)).await;
        index.delete(EntityKind::Team, 200, TOMBSTONE_VERSION).await.unwrap();
        assert_eq!(index.tombstones(), 1);

        // A live document is never purged, only tombstones.
        index.index(team_doc(1, 1, "AAAAA")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        index.index(team_doc(2, 1, "BBBBB")).await.unwrap();
        assert_eq!(index.tombstones(), 0);
        assert_eq!(index.len(EntityKind::Team), 2);
    }

    #[tokio::test]
    async fn query_pages_matches_in_id_order() {
        let index = MemoryIndex::new();
        for id in 1..=5 {
            index.index(team_doc(id, 1, "club")).await.unwrap();
        }
        index.index(team_doc(6, 1, "other")).await.unwrap();

        let page = index
            .query(EntityKind::Team, "teamName:club", &PageRequest::of(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        let ids: Vec<i64> = page.items.iter().map(|d| d.id).collect();
        assert_eq!(ids, [3, 4]);

        let empty = index
            .query(EntityKind::Country, "*", &PageRequest::of(0, 20))
            .await
            .unwrap();
        assert_eq!(empty.total, 0);

        let err = index
            .query(EntityKind::Team, "club AND", &PageRequest::of(0, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
    }
}
