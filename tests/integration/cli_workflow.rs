//! End-to-end CLI workflow tests.
//!
//! Parses real command lines with clap and runs them against an in-memory
//! store, checking printed output, notifications and persistence.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use plandesk::app::{App, AppError};
use plandesk::cli::{self, Command, Outcome};
use plandesk::config::{AppConfig, CliArgs};
use plandesk::notify::Level;
use plandesk::store::memory::InMemoryStore;
use plandesk::store::persist;
use plandesk_proto::task::TaskStatus;

fn command(args: &[&str]) -> Command {
    CliArgs::try_parse_from(std::iter::once("plandesk").chain(args.iter().copied()))
        .unwrap()
        .command
}

fn make_app(store: &Arc<InMemoryStore>) -> App<InMemoryStore> {
    let config = AppConfig {
        user_id: "alice".to_string(),
        email: "alice@example.com".to_string(),
        ..AppConfig::default()
    };
    App::new(Arc::clone(store), &config)
}

async fn run(app: &mut App<InMemoryStore>, args: &[&str]) -> Outcome {
    cli::execute(app, command(args)).await.unwrap()
}

#[tokio::test]
async fn gated_workflow() {
    let store = Arc::new(InMemoryStore::new());
    let mut app = make_app(&store);

    let created = run(&mut app, &["project", "create", "Launch"]).await;
    assert!(created.mutated);
    let project = app.current_project().unwrap();
    assert_eq!(created.output.trim(), project.to_string());

    run(&mut app, &["task", "add", "Design", "--priority", "high"]).await;
    run(&mut app, &["task", "add", "Build", "--due", "2030-01-15"]).await;
    let tasks = app.tasks.list(project).await.unwrap();
    let design = tasks.iter().find(|t| t.title == "Design").unwrap().id.to_string();
    let build = tasks.iter().find(|t| t.title == "Build").unwrap().id.to_string();

    run(&mut app, &["task", "deps", &build, &design]).await;
    app.notifications.drain(Instant::now());

    let blocked = run(&mut app, &["task", "status", &build, "in-progress"]).await;
    assert!(!blocked.mutated);
    assert!(blocked.output.contains(&design));
    let toasts = app.notifications.drain(Instant::now());
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, Level::Warning);
    assert!(toasts[0].message.contains("blocked by Design"));

    assert!(run(&mut app, &["task", "status", &design, "done"]).await.mutated);
    assert!(run(&mut app, &["task", "status", &build, "done"]).await.mutated);

    let board = run(&mut app, &["task", "board"]).await;
    assert!(board.output.contains("Done (2)"));

    let report = run(&mut app, &["report", "--json"]).await;
    let json: serde_json::Value = serde_json::from_str(&report.output).unwrap();
    assert_eq!(json["summary"]["done"], 2);
    assert_eq!(json["summary"]["completion_percent"], 100);

    let calendar = run(&mut app, &["calendar", "--from", "2030-01-01", "--to", "2030-01-31"]).await;
    assert!(calendar.output.contains("2030-01-15"));
    assert!(calendar.output.contains("Build"));
    assert_eq!(
        app.tasks.get(build.parse().unwrap()).await.unwrap().status,
        TaskStatus::Done
    );
}

#[tokio::test]
async fn budget_team_and_risks() {
    let store = Arc::new(InMemoryStore::new());
    let mut app = make_app(&store);
    run(&mut app, &["project", "create", "Ops"]).await;

    run(&mut app, &["budget", "add", "Hardware", "1200", "--actual", "1250.50"]).await;
    let table = run(&mut app, &["budget", "list"]).await;
    assert!(table.output.contains("1200.00"));
    assert!(table.output.contains("-50.50"));
    assert!(table.output.contains("(1 over budget)"));

    run(&mut app, &["member", "add", "Ana", "ana@example.com", "--role", "Dev"]).await;
    let team = run(&mut app, &["member", "list"]).await;
    assert!(team.output.contains("<ana@example.com>"));

    run(&mut app, &["risk", "add", "Outage", "--probability", "high", "--impact", "high"]).await;
    let register = run(&mut app, &["risk", "list"]).await;
    assert!(register.output.contains("[high] Outage"));
}

#[tokio::test]
async fn project_scoped_command_needs_selection() {
    let store = Arc::new(InMemoryStore::new());
    let mut app = make_app(&store);
    let err = cli::execute(&mut app, command(&["task", "list"])).await.unwrap_err();
    assert!(matches!(err, AppError::NoProject));
}

#[tokio::test]
async fn invalid_input_is_an_error() {
    let store = Arc::new(InMemoryStore::new());
    let mut app = make_app(&store);
    run(&mut app, &["project", "create", "Launch"]).await;
    let err = cli::execute(&mut app, command(&["member", "add", "Ana", "not-an-email"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid email address: not-an-email");
}

#[tokio::test]
async fn data_survives_save_and_load() {
    let dir = std::env::temp_dir().join(format!("plandesk-cli-{}", uuid::Uuid::now_v7()));
    let path = dir.join("data.db");

    let store = Arc::new(InMemoryStore::new());
    let mut app = make_app(&store);
    run(&mut app, &["project", "create", "Persistent"]).await;
    run(&mut app, &["task", "add", "Remember me"]).await;
    persist::save(&store, &path).unwrap();

    let reloaded = Arc::new(persist::load(&path).unwrap());
    let mut app = make_app(&reloaded);
    let listing = run(&mut app, &["project", "list"]).await;
    assert!(listing.output.contains("Persistent"));
    let project = app.projects.list_for_user().await.unwrap()[0].id;
    app.scope.select(project);
    let tasks = run(&mut app, &["task", "list"]).await;
    assert!(tasks.output.contains("Remember me"));

    let _ = std::fs::remove_dir_all(dir);
}
