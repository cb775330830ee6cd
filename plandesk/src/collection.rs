//! Typed access to one store collection.

use std::marker::PhantomData;
use std::sync::Arc;

use plandesk_proto::document::{ChangeKind, DocKey, Document};
use plandesk_proto::ids::ProjectId;

use crate::store::{DocumentStore, Scope, StoreError, Subscription};

/// A [`DocumentStore`] collection viewed as documents of type `T`.
///
/// Records of other types found under the collection's kind are skipped.
pub struct Collection<S, T> {
    store: Arc<S>,
    _doc: PhantomData<fn() -> T>,
}

impl<S, T> Clone for Collection<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _doc: PhantomData,
        }
    }
}

impl<S: DocumentStore, T: Document> Collection<S, T> {
    /// Wraps `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _doc: PhantomData,
        }
    }

    /// Store key for the document with `id`.
    #[must_use]
    pub fn key(id: T::Id) -> DocKey {
        DocKey::new(T::KIND, T::uuid(id))
    }

    /// Fetches one document.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        Ok(self.store.get(Self::key(id)).await?.and_then(T::from_record))
    }

    /// Lists one project's documents.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub async fn list(&self, project: ProjectId) -> Result<Vec<T>, StoreError> {
        self.list_scoped(Scope::Project(project)).await
    }

    /// Lists every document in the collection.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        self.list_scoped(Scope::All).await
    }

    async fn list_scoped(&self, scope: Scope) -> Result<Vec<T>, StoreError> {
        Ok(self
            .store
            .list(T::KIND, scope)
            .await?
            .into_iter()
            .filter_map(T::from_record)
            .collect())
    }

    /// Inserts or overwrites a document.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub async fn save(&self, doc: T) -> Result<ChangeKind, StoreError> {
        self.store.put(doc.into_record()).await
    }

    /// Deletes a document. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the backend.
    pub async fn remove(&self, id: T::Id) -> Result<bool, StoreError> {
        self.store.delete(Self::key(id)).await
    }

    /// Opens a change feed for one project's documents.
    #[must_use]
    pub fn subscribe(&self, project: ProjectId) -> Subscription {
        self.store.subscribe(T::KIND, Scope::Project(project))
    }
}
