//! `plandesk`: projects, tasks, team, budget and risks from the terminal.
//!
//! Every run loads the data file, executes one command, prints its output
//! and saves the data file if anything changed. Configuration via CLI flags,
//! environment variables, or config file (`~/.config/plandesk/config.toml`).
//!
//! ```bash
//! plandesk project create "Website relaunch"
//! export PLANDESK_PROJECT=<id printed above>
//! plandesk task add "Design mockups" --due 2025-06-01
//! plandesk task status <task-id> in-progress
//! plandesk report --json
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use plandesk::app::App;
use plandesk::cli;
use plandesk::config::{AppConfig, CliArgs};
use plandesk::store::persist;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Resolve configuration (CLI args > env > config file > defaults).
    let config = match AppConfig::load_for_run(&cli) {
        Ok((c, None)) => c,
        Ok((c, Some(warning))) => {
            eprintln!("Warning: failed to load config file: {warning}");
            c
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file so stdout carries only command output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::info!(user = %config.user_id, data_file = %config.data_file.display(), "plandesk starting");

    let store = match persist::load(&config.data_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "failed to load data file");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(Arc::clone(&store), &config);
    if let Some(project) = cli.project {
        app.scope.select(project);
    }

    let code = match cli::execute(&mut app, cli.command).await {
        Ok(outcome) => {
            print!("{}", outcome.output);
            match outcome.mutated.then(|| persist::save(&store, &config.data_file)) {
                Some(Err(e)) => {
                    app.notifications.error(&e);
                    ExitCode::FAILURE
                }
                _ => ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            app.notifications.error(&e);
            ExitCode::FAILURE
        }
    };

    for toast in app.notifications.drain(Instant::now()) {
        eprintln!("[{}] {}", toast.level, toast.message);
    }

    tracing::info!("plandesk exiting");
    code
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("plandesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
