//! In-memory document store.
//!
//! Holds every document in a single map guarded by a [`RwLock`] and fans
//! changes out over a [`broadcast`] channel. Locks are never held across an
//! await point.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::RwLock;
use plandesk_proto::document::{ChangeEvent, ChangeKind, CollectionKind, DocKey, Record, Snapshot};
use tokio::sync::broadcast;

use super::{DocumentStore, Scope, StoreError, Subscription, WriteBatch, WriteOp};

/// Default number of change events buffered per subscriber.
const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Thread-safe in-process [`DocumentStore`].
pub struct InMemoryStore {
    docs: RwLock<HashMap<DocKey, Record>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the default feed capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Creates an empty store whose change feed buffers `capacity` events.
    #[must_use]
    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            docs: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Creates a store pre-populated from a snapshot. No events are emitted.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        {
            let mut docs = store.docs.write();
            for record in snapshot.records {
                docs.insert(record.key(), record);
            }
        }
        store
    }

    /// Exports every document, ordered by key so output is stable.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let docs = self.docs.read();
        let mut entries: Vec<(&DocKey, &Record)> = docs.iter().collect();
        entries.sort_by_key(|(key, _)| **key);
        Snapshot {
            records: entries.into_iter().map(|(_, r)| r.clone()).collect(),
        }
    }

    /// Total number of stored documents across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns `true` if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
    }
}

impl DocumentStore for InMemoryStore {
    async fn get(&self, key: DocKey) -> Result<Option<Record>, StoreError> {
        Ok(self.docs.read().get(&key).cloned())
    }

    async fn list(&self, kind: CollectionKind, scope: Scope) -> Result<Vec<Record>, StoreError> {
        let docs = self.docs.read();
        let mut records: Vec<Record> = docs
            .iter()
            .filter(|(key, record)| key.kind == kind && scope.matches(record))
            .map(|(_, record)| record.clone())
            .collect();
        drop(docs);
        records.sort_by_key(Record::key);
        Ok(records)
    }

    async fn put(&self, record: Record) -> Result<ChangeKind, StoreError> {
        let key = record.key();
        let previous = self.docs.write().insert(key, record.clone());
        let kind = if previous.is_some() {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        tracing::debug!(doc = %key, change = ?kind, "document written");
        self.publish(vec![ChangeEvent::new(kind, record)]);
        Ok(kind)
    }

    async fn delete(&self, key: DocKey) -> Result<bool, StoreError> {
        let removed = self.docs.write().remove(&key);
        let Some(record) = removed else {
            return Ok(false);
        };
        tracing::debug!(doc = %key, "document deleted");
        self.publish(vec![ChangeEvent::new(ChangeKind::Removed, record)]);
        Ok(true)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let ops = batch.into_ops();
        let mut events = Vec::with_capacity(ops.len());
        {
            let mut docs = self.docs.write();

            // Stage every write first so a failing delete leaves the store untouched.
            let mut staged: HashMap<DocKey, Option<Record>> = HashMap::new();
            for op in ops {
                match op {
                    WriteOp::Put(record) => {
                        let key = record.key();
                        let existed = staged
                            .get(&key)
                            .map_or_else(|| docs.contains_key(&key), Option::is_some);
                        let kind = if existed {
                            ChangeKind::Modified
                        } else {
                            ChangeKind::Added
                        };
                        events.push(ChangeEvent::new(kind, record.clone()));
                        staged.insert(key, Some(record));
                    }
                    WriteOp::Delete(key) => {
                        let current = match staged.get(&key) {
                            Some(staged_value) => staged_value.clone(),
                            None => docs.get(&key).cloned(),
                        };
                        let Some(record) = current else {
                            tracing::warn!(doc = %key, "batch rejected: delete of missing document");
                            return Err(StoreError::NotFound(key));
                        };
                        events.push(ChangeEvent::new(ChangeKind::Removed, record));
                        staged.insert(key, None);
                    }
                    WriteOp::DeleteScope { kind, project } => {
                        let in_scope =
                            |record: &Record| record.kind() == kind && record.project_id() == project;
                        let mut doomed: Vec<Record> = docs
                            .iter()
                            .filter(|(key, record)| !staged.contains_key(*key) && in_scope(*record))
                            .map(|(_, record)| record.clone())
                            .collect();
                        doomed.extend(staged.values().flatten().filter(|r| in_scope(*r)).cloned());
                        doomed.sort_by_key(Record::key);
                        for record in doomed {
                            staged.insert(record.key(), None);
                            events.push(ChangeEvent::new(ChangeKind::Removed, record));
                        }
                    }
                }
            }

            for (key, value) in staged {
                match value {
                    Some(record) => {
                        docs.insert(key, record);
                    }
                    None => {
                        if let Entry::Occupied(entry) = docs.entry(key) {
                            entry.remove();
                        }
                    }
                }
            }
        }
        let count = events.len();
        tracing::debug!(writes = count, "batch committed");
        self.publish(events);
        Ok(count)
    }

    fn subscribe(&self, kind: CollectionKind, scope: Scope) -> Subscription {
        Subscription::new(self.events.subscribe(), kind, scope)
    }
}
