//! A collection cache kept current by a background subscription task.

use std::sync::Arc;

use parking_lot::RwLock;
use plandesk_proto::document::Document;
use plandesk_proto::ids::ProjectId;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cache::CollectionCache;
use crate::store::{DocumentStore, FeedItem, Scope, StoreError};

/// Live mirror of one project's documents of type `T`.
///
/// Created with [`LiveCollection::follow`], which lists the collection once
/// and then applies every change from the feed. If the feed drops events the
/// mirror lists the collection again and starts over from that listing.
/// Dropping the value stops the background task and so unsubscribes.
pub struct LiveCollection<T: Document> {
    cache: Arc<RwLock<CollectionCache<T>>>,
    version: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

async fn list_scope<T: Document, S: DocumentStore>(
    store: &S,
    scope: Scope,
) -> Result<Vec<T>, StoreError> {
    Ok(store
        .list(T::KIND, scope)
        .await?
        .into_iter()
        .filter_map(T::from_record)
        .collect())
}

impl<T: Document> LiveCollection<T> {
    /// Starts following `project`'s documents in `store`.
    ///
    /// The subscription is opened before the initial listing so no change
    /// between the two can be missed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the initial listing fails.
    pub async fn follow<S>(store: Arc<S>, project: ProjectId) -> Result<Self, StoreError>
    where
        S: DocumentStore + 'static,
    {
        let scope = Scope::Project(project);
        let mut subscription = store.subscribe(T::KIND, scope);
        let initial = list_scope::<T, S>(&store, scope).await?;

        let mut cache = CollectionCache::new();
        cache.load(&initial);
        let cache = Arc::new(RwLock::new(cache));
        let (version_tx, version) = watch::channel(0u64);

        let feed_cache = Arc::clone(&cache);
        let task = tokio::spawn(async move {
            while let Some(item) = subscription.recv().await {
                let changed = match item {
                    FeedItem::Change(event) => feed_cache.write().apply(&event),
                    FeedItem::Lagged(_) => match list_scope::<T, S>(&store, scope).await {
                        Ok(docs) => {
                            tracing::info!(
                                collection = %T::KIND,
                                docs = docs.len(),
                                "mirror resynced after lag"
                            );
                            feed_cache.write().reset(&docs)
                        }
                        Err(e) => {
                            tracing::error!(
                                collection = %T::KIND,
                                error = %e,
                                "resync failed, mirror stopped"
                            );
                            break;
                        }
                    },
                };
                if changed {
                    version_tx.send_modify(|v| *v += 1);
                }
            }
            tracing::debug!(collection = %T::KIND, "change feed closed");
        });

        Ok(Self {
            cache,
            version,
            task,
        })
    }

    /// Clones out the current documents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.cache.read().to_vec()
    }

    /// Number of documents currently mirrored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Returns `true` if nothing is mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Waits until the mirror changes.
    ///
    /// Returns `false` if the feed ended.
    pub async fn changed(&mut self) -> bool {
        self.version.changed().await.is_ok()
    }
}

impl<T: Document> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
