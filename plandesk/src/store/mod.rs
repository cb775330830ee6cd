//! Document store boundary.
//!
//! Defines the [`DocumentStore`] trait every backend must satisfy.
//! Concrete implementations include:
//! - [`memory::InMemoryStore`]: in-process store used by the CLI and tests
//!
//! [`persist`] saves and restores an in-memory store to a snapshot file.
//!
//! The store applies writes in arrival order (last write wins per document)
//! and pushes one [`ChangeEvent`] per applied write to every matching
//! [`Subscription`].

pub mod memory;
pub mod persist;

use plandesk_proto::document::{ChangeEvent, ChangeKind, CollectionKind, DocKey, Record};
use plandesk_proto::ids::ProjectId;
use tokio::sync::broadcast;

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A batch referenced a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(DocKey),

    /// The backend could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Which documents of a collection an operation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every document in the collection.
    All,
    /// Only documents belonging to one project.
    Project(ProjectId),
}

impl Scope {
    /// Returns `true` if `record` falls inside this scope.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Project(id) => record.project_id() == *id,
        }
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or overwrite a document.
    Put(Record),
    /// Delete an existing document.
    Delete(DocKey),
    /// Delete every document of `kind` belonging to `project`, as found at
    /// commit time. Matching nothing is not an error.
    DeleteScope {
        kind: CollectionKind,
        project: ProjectId,
    },
}

/// A group of writes applied atomically by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an insert or overwrite.
    pub fn put(&mut self, record: Record) -> &mut Self {
        self.ops.push(WriteOp::Put(record));
        self
    }

    /// Queues a delete.
    pub fn delete(&mut self, key: DocKey) -> &mut Self {
        self.ops.push(WriteOp::Delete(key));
        self
    }

    /// Queues a delete of every `kind` document in `project`.
    pub fn delete_scope(&mut self, kind: CollectionKind, project: ProjectId) -> &mut Self {
        self.ops.push(WriteOp::DeleteScope { kind, project });
        self
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued writes, in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consumes the batch, returning its writes.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Async document store.
///
/// Mirrors the hosted document database the application is built on:
/// collections keyed by project id, single-document writes, atomic batched
/// writes, and a push feed of changes.
pub trait DocumentStore: Send + Sync {
    /// Fetches one document.
    fn get(
        &self,
        key: DocKey,
    ) -> impl std::future::Future<Output = Result<Option<Record>, StoreError>> + Send;

    /// Lists the documents of a collection within `scope`.
    fn list(
        &self,
        kind: CollectionKind,
        scope: Scope,
    ) -> impl std::future::Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Inserts or overwrites a document, reporting which of the two happened.
    fn put(
        &self,
        record: Record,
    ) -> impl std::future::Future<Output = Result<ChangeKind, StoreError>> + Send;

    /// Deletes a document. Returns `false` if it did not exist.
    fn delete(
        &self,
        key: DocKey,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Applies every write in `batch` or none of them.
    ///
    /// Returns the number of documents written or removed. A delete of a
    /// document that is neither stored nor put earlier in the same batch fails
    /// the whole batch with [`StoreError::NotFound`]. A
    /// [`WriteOp::DeleteScope`] is resolved against the store as it stands
    /// when the batch is applied, so it never fails.
    fn commit(
        &self,
        batch: WriteBatch,
    ) -> impl std::future::Future<Output = Result<usize, StoreError>> + Send;

    /// Opens a change feed for one collection within `scope`.
    fn subscribe(&self, kind: CollectionKind, scope: Scope) -> Subscription;
}

/// What a [`Subscription`] yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    /// A change to a document inside the subscription's scope.
    Change(ChangeEvent),
    /// The subscriber fell behind and `skipped` events were dropped. Anything
    /// mirrored from the feed must be reloaded from the store.
    Lagged(u64),
}

/// A filtered view of a store's change feed.
///
/// Dropping the subscription unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    kind: CollectionKind,
    scope: Scope,
}

impl Subscription {
    /// Wraps a raw broadcast receiver with a collection and scope filter.
    #[must_use]
    pub const fn new(
        rx: broadcast::Receiver<ChangeEvent>,
        kind: CollectionKind,
        scope: Scope,
    ) -> Self {
        Self { rx, kind, scope }
    }

    /// Collection this subscription follows.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn wants(&self, event: &ChangeEvent) -> bool {
        event.record.kind() == self.kind && self.scope.matches(&event.record)
    }

    /// Waits for the next matching change or a gap in the feed.
    ///
    /// Returns `None` once the store is gone. After [`FeedItem::Lagged`] the
    /// feed continues with the oldest event still buffered.
    pub async fn recv(&mut self) -> Option<FeedItem> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(FeedItem::Change(event)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = %self.kind,
                        skipped,
                        "change feed lagged, events dropped"
                    );
                    return Some(FeedItem::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next matching change, stepping over gaps.
    ///
    /// Only for callers that do not keep state derived from the feed; use
    /// [`Self::recv`] to learn about dropped events.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.recv().await? {
                FeedItem::Change(event) => return Some(event),
                FeedItem::Lagged(_) => {}
            }
        }
    }

    /// Returns the next matching change if one is already buffered.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}
