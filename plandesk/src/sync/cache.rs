//! Local copy of one collection, fed by change events.

use std::collections::HashMap;

use plandesk_proto::document::{ChangeEvent, ChangeKind, Document};
use plandesk_proto::revision::Revision;

use super::merge::merge_document_list;

/// Tombstones kept per cache before the oldest are evicted.
pub const DEFAULT_TOMBSTONE_LIMIT: usize = 1024;

/// Documents of one collection as last seen by this client.
///
/// Removals leave a tombstone holding the removed revision so that a late
/// `Added`/`Modified` event for an older version cannot resurrect the
/// document. Tombstones are dropped when a listing shows the id again, and
/// at most `tombstone_limit` are kept; past that the oldest revision goes
/// first.
pub struct CollectionCache<T: Document> {
    docs: HashMap<T::Id, T>,
    tombstones: HashMap<T::Id, Revision>,
    tombstone_limit: usize,
}

impl<T: Document> Default for CollectionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> CollectionCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tombstone_limit(DEFAULT_TOMBSTONE_LIMIT)
    }

    /// Creates an empty cache that keeps at most `limit` tombstones.
    #[must_use]
    pub fn with_tombstone_limit(limit: usize) -> Self {
        Self {
            docs: HashMap::new(),
            tombstones: HashMap::new(),
            tombstone_limit: limit.max(1),
        }
    }

    /// Seeds the cache with an initial listing.
    ///
    /// Returns the number of documents that changed.
    pub fn load(&mut self, docs: &[T]) -> usize {
        let fresh: Vec<T> = docs
            .iter()
            .filter(|d| !self.is_buried(d.id(), d.revision()))
            .cloned()
            .collect();
        merge_document_list(&mut self.docs, &fresh)
    }

    /// Replaces the cache with a listing read straight from the store.
    ///
    /// The listing wins over anything cached: documents it lacks are
    /// dropped, and tombstones for ids it contains are pruned. Returns `true`
    /// if the set of documents or any revision changed.
    pub fn reset(&mut self, docs: &[T]) -> bool {
        let listed: HashMap<T::Id, T> = docs.iter().map(|d| (d.id(), d.clone())).collect();
        self.tombstones.retain(|id, _| !listed.contains_key(id));
        let changed = listed.len() != self.docs.len()
            || listed.iter().any(|(id, doc)| {
                self.docs
                    .get(id)
                    .is_none_or(|cached| cached.revision() != doc.revision())
            });
        self.docs = listed;
        changed
    }

    /// Applies one change event. Returns `true` if the cache changed.
    ///
    /// Events for other collections and stale versions are ignored.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        let Some(doc) = T::from_record(event.record.clone()) else {
            return false;
        };
        let id = doc.id();
        match event.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                if self.is_buried(id, doc.revision()) {
                    return false;
                }
                merge_document_list(&mut self.docs, std::slice::from_ref(&doc)) > 0
            }
            ChangeKind::Removed => {
                let removed_rev = doc.revision().clone();
                let newer_local = self
                    .docs
                    .get(&id)
                    .is_some_and(|local| local.revision().supersedes(&removed_rev));
                if newer_local {
                    return false;
                }
                let tombstone = self.tombstones.entry(id).or_insert_with(|| removed_rev.clone());
                if removed_rev.supersedes(tombstone) {
                    *tombstone = removed_rev;
                }
                self.evict_tombstones();
                self.docs.remove(&id).is_some()
            }
        }
    }

    fn evict_tombstones(&mut self) {
        while self.tombstones.len() > self.tombstone_limit {
            let oldest = self
                .tombstones
                .iter()
                .min_by(|a, b| a.1.cmp(b.1))
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => self.tombstones.remove(&id),
                None => break,
            };
        }
    }

    /// Number of tombstones currently held.
    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    fn is_buried(&self, id: T::Id, revision: &Revision) -> bool {
        self.tombstones
            .get(&id)
            .is_some_and(|tomb| !revision.supersedes(tomb))
    }

    /// Looks up one document.
    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.docs.get(&id)
    }

    /// Number of live documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns `true` if no live documents are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Clones out every live document, in unspecified order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.docs.values().cloned().collect()
    }
}
