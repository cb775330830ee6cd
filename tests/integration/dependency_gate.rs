//! Integration tests for the task dependency gate.
//!
//! Exercises the gate both as a pure function and through `TaskManager`,
//! covering the documented scenarios, idempotence and cycles.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use plandesk::gate::{GateDecision, check_transition};
use plandesk::projects::ProjectService;
use plandesk::session::Session;
use plandesk::store::memory::InMemoryStore;
use plandesk::tasks::{StatusChange, TaskManager};
use plandesk_proto::ids::{ProjectId, TaskId, UserId};
use plandesk_proto::task::{Task, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn make_task(project: ProjectId, title: &str, status: TaskStatus, deps: &[TaskId]) -> Task {
    let mut task = Task::new(project, title, &UserId::new("alice"));
    task.status = status;
    task.depends_on = deps.to_vec();
    task
}

async fn make_board() -> (Arc<InMemoryStore>, TaskManager<InMemoryStore>, ProjectId) {
    let store = Arc::new(InMemoryStore::new());
    let session = Session::new("alice", "alice@example.com");
    let project = ProjectService::new(Arc::clone(&store), session.clone())
        .create("Gate", "")
        .await
        .unwrap();
    let tasks = TaskManager::new(Arc::clone(&store), session);
    (store, tasks, project.id)
}

// ---------------------------------------------------------------------------
// Pure gate scenarios
// ---------------------------------------------------------------------------

#[test]
fn task_without_dependencies_moves_to_in_progress() {
    let project = ProjectId::new();
    let a = make_task(project, "A", TaskStatus::NotStarted, &[]);
    let all = vec![a.clone()];
    assert_eq!(
        check_transition(&a, TaskStatus::InProgress, &all),
        GateDecision::Permitted
    );
}

#[test]
fn incomplete_prerequisite_blocks_done() {
    let project = ProjectId::new();
    let a = make_task(project, "A", TaskStatus::NotStarted, &[]);
    let b = make_task(project, "B", TaskStatus::NotStarted, &[a.id]);
    let all = vec![a, b.clone()];

    let GateDecision::Rejected(rejection) = check_transition(&b, TaskStatus::Done, &all) else {
        panic!("expected rejection");
    };
    assert_eq!(rejection.blocking_titles(), vec!["A"]);
    assert!(rejection.cycle.is_none());
    assert!(rejection.message().contains("blocked by A"));
}

#[test]
fn done_prerequisite_permits_done() {
    let project = ProjectId::new();
    let a = make_task(project, "A", TaskStatus::Done, &[]);
    let b = make_task(project, "B", TaskStatus::NotStarted, &[a.id]);
    let all = vec![a, b.clone()];
    assert!(check_transition(&b, TaskStatus::Done, &all).is_permitted());
}

#[test]
fn same_request_twice_gives_same_answer() {
    let project = ProjectId::new();
    let a = make_task(project, "A", TaskStatus::InProgress, &[]);
    let b = make_task(project, "B", TaskStatus::NotStarted, &[a.id]);
    let all = vec![a, b.clone()];
    let first = check_transition(&b, TaskStatus::InProgress, &all);
    let second = check_transition(&b, TaskStatus::InProgress, &all);
    assert_eq!(first, second);
}

#[test]
fn stored_cycle_is_named_in_rejection() {
    let project = ProjectId::new();
    let mut a = make_task(project, "A", TaskStatus::NotStarted, &[]);
    let b = make_task(project, "B", TaskStatus::NotStarted, &[a.id]);
    a.depends_on = vec![b.id];
    let all = vec![a.clone(), b];

    let GateDecision::Rejected(rejection) = check_transition(&a, TaskStatus::InProgress, &all)
    else {
        panic!("expected rejection");
    };
    assert_eq!(
        rejection.cycle,
        Some(vec!["A".to_string(), "B".to_string(), "A".to_string()])
    );
    assert!(rejection.message().contains("dependency cycle: A -> B -> A"));
}

// ---------------------------------------------------------------------------
// Through the task manager
// ---------------------------------------------------------------------------

#[tokio::test]
async fn finishing_prerequisite_unblocks_dependent() {
    let (_store, tasks, project) = make_board().await;
    let a = tasks.create_task(project, "Design").await.unwrap();
    let b = tasks.create_task(project, "Build").await.unwrap();
    tasks.set_dependencies(b.id, &[a.id]).await.unwrap();

    let blocked = tasks.change_status(b.id, TaskStatus::InProgress).await.unwrap();
    let StatusChange::Blocked(rejection) = blocked else {
        panic!("expected Blocked, got {blocked:?}");
    };
    assert_eq!(rejection.blocking_titles(), vec!["Design"]);
    assert_eq!(tasks.get(b.id).await.unwrap().status, TaskStatus::NotStarted);

    assert!(matches!(
        tasks.change_status(a.id, TaskStatus::Done).await.unwrap(),
        StatusChange::Applied(_)
    ));
    let applied = tasks.change_status(b.id, TaskStatus::InProgress).await.unwrap();
    assert!(matches!(applied, StatusChange::Applied(ref t) if t.status == TaskStatus::InProgress));
}

#[tokio::test]
async fn blocking_list_follows_dependency_order() {
    let (_store, tasks, project) = make_board().await;
    let a = tasks.create_task(project, "A").await.unwrap();
    let b = tasks.create_task(project, "B").await.unwrap();
    let c = tasks.create_task(project, "C").await.unwrap();
    let d = tasks.create_task(project, "D").await.unwrap();
    tasks.change_status(b.id, TaskStatus::Done).await.unwrap();
    tasks.set_dependencies(d.id, &[c.id, b.id, a.id]).await.unwrap();

    let StatusChange::Blocked(rejection) = tasks.change_status(d.id, TaskStatus::Done).await.unwrap()
    else {
        panic!("expected Blocked");
    };
    assert_eq!(rejection.blocking_titles(), vec!["C", "A"]);
}

#[tokio::test]
async fn moving_backward_is_never_gated() {
    let (_store, tasks, project) = make_board().await;
    let a = tasks.create_task(project, "A").await.unwrap();
    let b = tasks.create_task(project, "B").await.unwrap();
    tasks.change_status(b.id, TaskStatus::Done).await.unwrap();
    tasks.set_dependencies(b.id, &[a.id]).await.unwrap();

    let change = tasks.change_status(b.id, TaskStatus::NotStarted).await.unwrap();
    assert!(matches!(change, StatusChange::Applied(ref t) if t.status == TaskStatus::NotStarted));
}

#[tokio::test]
async fn deleted_prerequisite_no_longer_blocks() {
    let (_store, tasks, project) = make_board().await;
    let a = tasks.create_task(project, "A").await.unwrap();
    let b = tasks.create_task(project, "B").await.unwrap();
    tasks.set_dependencies(b.id, &[a.id]).await.unwrap();
    tasks.delete_task(a.id).await.unwrap();

    assert!(tasks.get(b.id).await.unwrap().depends_on.is_empty());
    assert!(matches!(
        tasks.change_status(b.id, TaskStatus::Done).await.unwrap(),
        StatusChange::Applied(_)
    ));
}
