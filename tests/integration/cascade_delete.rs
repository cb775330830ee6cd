//! Integration tests for cascading project deletion.
//!
//! Deleting a project must remove the project and every document scoped to
//! it in one atomic batch, and leave other projects untouched. Documents
//! other writers remove or add while the delete is under way must not fail
//! the batch or be left behind.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use plandesk::budget::BudgetService;
use plandesk::projects::{AccessError, ProjectError, ProjectService};
use plandesk::risks::RiskService;
use plandesk::session::Session;
use plandesk::store::memory::InMemoryStore;
use parking_lot::Mutex;
use plandesk::store::{DocumentStore, Scope, StoreError, Subscription, WriteBatch};
use plandesk::tasks::TaskManager;
use plandesk::team::TeamService;
use plandesk_proto::document::{ChangeKind, CollectionKind, DocKey, Document, Record};
use plandesk_proto::ids::{ProjectId, UserId};
use plandesk_proto::risk::Level;
use plandesk_proto::task::Task;

struct Fixture {
    store: Arc<InMemoryStore>,
    projects: ProjectService<InMemoryStore>,
    tasks: TaskManager<InMemoryStore>,
    team: TeamService<InMemoryStore>,
    budget: BudgetService<InMemoryStore>,
    risks: RiskService<InMemoryStore>,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let session = Session::new("owner", "owner@example.com");
    Fixture {
        projects: ProjectService::new(Arc::clone(&store), session.clone()),
        tasks: TaskManager::new(Arc::clone(&store), session.clone()),
        team: TeamService::new(Arc::clone(&store), session.clone()),
        budget: BudgetService::new(Arc::clone(&store), session.clone()),
        risks: RiskService::new(Arc::clone(&store), session),
        store,
    }
}

/// Creates a project with one document in every collection. Returns its id.
async fn populate(f: &Fixture, name: &str) -> ProjectId {
    let project = f.projects.create(name, "").await.unwrap();
    let a = f.tasks.create_task(project.id, "A").await.unwrap();
    let b = f.tasks.create_task(project.id, "B").await.unwrap();
    f.tasks.set_dependencies(b.id, &[a.id]).await.unwrap();
    f.team.add(project.id, "Ana", "ana@example.com", "Dev").await.unwrap();
    f.budget.add(project.id, "Ops", "", 10_000, 0).await.unwrap();
    f.risks.add(project.id, "Outage", Level::High, Level::Medium, "").await.unwrap();
    project.id
}

async fn count(store: &InMemoryStore, kind: CollectionKind, project: ProjectId) -> usize {
    store.list(kind, Scope::Project(project)).await.unwrap().len()
}

#[tokio::test]
async fn delete_removes_every_project_document() {
    let f = fixture();
    let doomed = populate(&f, "Doomed").await;
    let kept = populate(&f, "Kept").await;
    let before = f.store.len();

    let removed = f.projects.delete(doomed).await.unwrap();
    // project + 2 tasks + member + budget item + risk
    assert_eq!(removed, 6);
    assert_eq!(f.store.len(), before - 6);

    for kind in CollectionKind::ALL {
        assert_eq!(count(&f.store, kind, doomed).await, 0, "{kind} left behind");
    }
    assert_eq!(count(&f.store, CollectionKind::Tasks, kept).await, 2);
    assert_eq!(count(&f.store, CollectionKind::Projects, kept).await, 1);

    let err = f.projects.get(doomed).await.unwrap_err();
    assert_eq!(err, ProjectError::Access(AccessError::ProjectNotFound(doomed)));
}

#[tokio::test]
async fn delete_emits_one_removal_per_document() {
    let f = fixture();
    let project = populate(&f, "Doomed").await;
    let mut feed = f.store.subscribe(CollectionKind::Tasks, Scope::Project(project));

    f.projects.delete(project).await.unwrap();

    let mut removed = 0;
    while let Some(event) = feed.try_next() {
        assert_eq!(event.kind, ChangeKind::Removed);
        removed += 1;
    }
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn non_owner_cannot_cascade() {
    let f = fixture();
    let project = populate(&f, "Shared").await;
    f.projects
        .add_member(project, UserId::new("guest"))
        .await
        .unwrap();
    let guest = ProjectService::new(Arc::clone(&f.store), Session::new("guest", ""));
    let before = f.store.len();

    assert_eq!(guest.delete(project).await, Err(ProjectError::NotOwner(project)));
    assert_eq!(f.store.len(), before);
}

/// Store whose next batch is preceded by another writer's delete and put.
struct RacingStore {
    inner: InMemoryStore,
    race: Mutex<Option<(DocKey, Record)>>,
}

impl DocumentStore for RacingStore {
    async fn get(&self, key: DocKey) -> Result<Option<Record>, StoreError> {
        self.inner.get(key).await
    }

    async fn list(&self, kind: CollectionKind, scope: Scope) -> Result<Vec<Record>, StoreError> {
        self.inner.list(kind, scope).await
    }

    async fn put(&self, record: Record) -> Result<ChangeKind, StoreError> {
        self.inner.put(record).await
    }

    async fn delete(&self, key: DocKey) -> Result<bool, StoreError> {
        self.inner.delete(key).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let race = self.race.lock().take();
        if let Some((gone, late)) = race {
            self.inner.delete(gone).await?;
            self.inner.put(late).await?;
        }
        self.inner.commit(batch).await
    }

    fn subscribe(&self, kind: CollectionKind, scope: Scope) -> Subscription {
        self.inner.subscribe(kind, scope)
    }
}

#[tokio::test]
async fn delete_sweeps_documents_changed_by_other_writers() {
    let store = Arc::new(RacingStore {
        inner: InMemoryStore::new(),
        race: Mutex::new(None),
    });
    let session = Session::new("owner", "owner@example.com");
    let projects = ProjectService::new(Arc::clone(&store), session.clone());
    let tasks = TaskManager::new(Arc::clone(&store), session);

    let project = projects.create("Raced", "").await.unwrap();
    let gone = tasks.create_task(project.id, "Gone").await.unwrap();
    tasks.create_task(project.id, "Stays").await.unwrap();
    let late = Task::new(project.id, "Late", &UserId::new("other"));
    *store.race.lock() = Some((gone.key(), late.into_record()));

    // project + "Stays" + "Late"; "Gone" was already removed by the other writer
    assert_eq!(projects.delete(project.id).await.unwrap(), 3);
    assert!(store.inner.is_empty());
}
