//! Integration tests for the store change feed and live collections.
//!
//! Subscribers only see changes to their own collection and project, in the
//! order they were applied, and a `LiveCollection` mirrors the store even
//! when its feed drops events.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use plandesk::store::memory::InMemoryStore;
use plandesk::store::{DocumentStore, Scope};
use plandesk::sync::LiveCollection;
use plandesk_proto::document::{ChangeKind, CollectionKind, Document, Record};
use plandesk_proto::ids::{ProjectId, UserId};
use plandesk_proto::revision::Revision;
use plandesk_proto::task::Task;
use plandesk_proto::team::TeamMember;
use tokio::time::timeout;

fn user() -> UserId {
    UserId::new("alice")
}

async fn wait_until<T: Document>(live: &mut LiveCollection<T>, done: impl Fn(&[T]) -> bool) {
    timeout(Duration::from_secs(5), async {
        while !done(&live.snapshot()) {
            assert!(live.changed().await, "feed closed");
        }
    })
    .await
    .expect("live collection did not catch up");
}

#[tokio::test]
async fn subscriber_sees_only_its_project_and_collection() {
    let store = InMemoryStore::new();
    let mine = ProjectId::new();
    let theirs = ProjectId::new();
    let mut feed = store.subscribe(CollectionKind::Tasks, Scope::Project(mine));

    let mut task = Task::new(mine, "Mine", &user());
    store.put(task.clone().into_record()).await.unwrap();
    store
        .put(Task::new(theirs, "Theirs", &user()).into_record())
        .await
        .unwrap();
    store
        .put(TeamMember::new(mine, "Ana", "ana@example.com", &user()).into_record())
        .await
        .unwrap();
    task.title = "Mine, renamed".to_string();
    task.revision = task.revision.next(&user());
    store.put(task.clone().into_record()).await.unwrap();
    store.delete(task.key()).await.unwrap();

    let kinds: Vec<ChangeKind> = std::iter::from_fn(|| feed.try_next()).map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Added, ChangeKind::Modified, ChangeKind::Removed]
    );
}

#[tokio::test]
async fn removal_event_carries_last_version() {
    let store = InMemoryStore::new();
    let project = ProjectId::new();
    let mut feed = store.subscribe(CollectionKind::Tasks, Scope::All);
    let task = Task::new(project, "Gone", &user());
    store.put(task.clone().into_record()).await.unwrap();
    store.delete(task.key()).await.unwrap();

    let _added = feed.next().await.unwrap();
    let removed = feed.next().await.unwrap();
    assert_eq!(removed.kind, ChangeKind::Removed);
    assert_eq!(removed.record, Record::Task(task));
}

#[tokio::test]
async fn live_collection_follows_store() {
    let store = Arc::new(InMemoryStore::new());
    let project = ProjectId::new();
    let existing = Task::new(project, "Existing", &user());
    store.put(existing.clone().into_record()).await.unwrap();

    let mut live: LiveCollection<Task> = LiveCollection::follow(Arc::clone(&store), project)
        .await
        .unwrap();
    assert_eq!(live.len(), 1);

    let added = Task::new(project, "Added", &user());
    store.put(added.clone().into_record()).await.unwrap();
    store
        .put(Task::new(ProjectId::new(), "Elsewhere", &user()).into_record())
        .await
        .unwrap();
    wait_until(&mut live, |tasks| tasks.len() == 2).await;

    store.delete(existing.key()).await.unwrap();
    wait_until(&mut live, |tasks| tasks.len() == 1).await;
    assert_eq!(live.snapshot(), vec![added]);
}

#[tokio::test]
async fn live_collection_ignores_stale_writes() {
    let store = Arc::new(InMemoryStore::new());
    let project = ProjectId::new();
    let mut task = Task::new(project, "v1", &user());
    task.revision = Revision::new(1_000, user());
    store.put(task.clone().into_record()).await.unwrap();

    let mut live: LiveCollection<Task> = LiveCollection::follow(Arc::clone(&store), project)
        .await
        .unwrap();

    // An older write arrives after a newer one: the store takes it (last
    // write wins on arrival) but the mirror keeps the newer revision.
    let mut newer = task.clone();
    newer.title = "v3".to_string();
    newer.revision = Revision::new(3_000, user());
    let mut older = task.clone();
    older.title = "v2".to_string();
    older.revision = Revision::new(2_000, user());
    store.put(newer.clone().into_record()).await.unwrap();
    store.put(older.into_record()).await.unwrap();

    wait_until(&mut live, |tasks| tasks.first().is_some_and(|t| t.title == "v3")).await;
    tokio::task::yield_now().await;
    assert_eq!(live.snapshot(), vec![newer]);
}

#[tokio::test]
async fn live_collection_resyncs_after_feed_lag() {
    let store = Arc::new(InMemoryStore::with_feed_capacity(1));
    let project = ProjectId::new();
    let mut live: LiveCollection<Task> = LiveCollection::follow(Arc::clone(&store), project)
        .await
        .unwrap();

    // Two writes before the mirror task runs: the first event is dropped.
    let a = Task::new(project, "A", &user());
    let b = Task::new(project, "B", &user());
    store.put(a.clone().into_record()).await.unwrap();
    store.put(b.clone().into_record()).await.unwrap();
    wait_until(&mut live, |tasks| tasks.len() == 2).await;

    // Missed removals are caught up the same way.
    let c = Task::new(project, "C", &user());
    store.delete(a.key()).await.unwrap();
    store.delete(b.key()).await.unwrap();
    store.put(c.clone().into_record()).await.unwrap();
    wait_until(&mut live, |tasks| tasks == [c.clone()]).await;

    let stored = store
        .list(CollectionKind::Tasks, Scope::Project(project))
        .await
        .unwrap();
    assert_eq!(stored, vec![c.into_record()]);
}
