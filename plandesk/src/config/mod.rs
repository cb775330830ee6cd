//! Configuration for the `plandesk` CLI.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/plandesk/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use plandesk_proto::ids::ProjectId;
use plandesk_proto::task::MAX_TASK_TITLE_LENGTH;

use crate::cli::Command;
use crate::notify::{DEFAULT_MAX_TOASTS, DEFAULT_TOAST_TTL};
use crate::session::Session;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    session: SessionFileConfig,
    storage: StorageFileConfig,
    tasks: TasksFileConfig,
    notifications: NotificationsFileConfig,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    user_id: Option<String>,
    email: Option<String>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_file: Option<PathBuf>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    max_title_len: Option<usize>,
}

/// `[notifications]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NotificationsFileConfig {
    toast_ttl_secs: Option<u64>,
    max_toasts: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // -- Session --
    /// Identity every write is stamped with.
    pub user_id: String,
    /// Contact email of the user.
    pub email: String,

    // -- Storage --
    /// Snapshot file the store is loaded from and saved to.
    pub data_file: PathBuf,

    // -- Tasks --
    /// Maximum task title length in characters.
    pub max_title_len: usize,

    // -- Notifications --
    /// How long a toast stays visible.
    pub toast_ttl: Duration,
    /// How many toasts are kept at once.
    pub max_toasts: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            email: String::new(),
            data_file: default_data_file(),
            max_title_len: MAX_TASK_TITLE_LENGTH,
            toast_ttl: DEFAULT_TOAST_TTL,
            max_toasts: DEFAULT_MAX_TOASTS,
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/plandesk/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Load configuration for a command run.
    ///
    /// A config file named with `--config` must load, so its failure is
    /// returned as an error. A broken file at the default path is skipped:
    /// configuration then comes from CLI args and env vars alone, and the
    /// error is handed back as a warning for the caller to report.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit `--config` file cannot be
    /// read or parsed.
    pub fn load_for_run(cli: &CliArgs) -> Result<(Self, Option<ConfigError>), ConfigError> {
        match Self::load(cli) {
            Ok(config) => Ok((config, None)),
            Err(e) if cli.config.is_some() => Err(e),
            Err(e) => Ok((Self::from_cli(cli), Some(e))),
        }
    }

    /// Resolve from CLI args and env vars alone, ignoring any config file.
    #[must_use]
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::resolve(cli, &ConfigFile::default())
    }

    /// Priority: CLI > file > default. Separated from `load()` to enable
    /// unit testing without touching the filesystem.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            user_id: cli
                .user
                .clone()
                .or_else(|| file.session.user_id.clone())
                .unwrap_or(defaults.user_id),
            email: cli
                .email
                .clone()
                .or_else(|| file.session.email.clone())
                .unwrap_or(defaults.email),
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.storage.data_file.clone())
                .unwrap_or(defaults.data_file),
            max_title_len: file
                .tasks
                .max_title_len
                .unwrap_or(defaults.max_title_len),
            toast_ttl: file
                .notifications
                .toast_ttl_secs
                .map_or(defaults.toast_ttl, Duration::from_secs),
            max_toasts: file
                .notifications
                .max_toasts
                .unwrap_or(defaults.max_toasts),
        }
    }

    /// The session operations run as.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.user_id.clone(), self.email.clone())
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug)]
#[command(name = "plandesk", version, about = "Projects, tasks, team, budget and risks from the terminal")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/plandesk/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data file holding every project.
    #[arg(long, env = "PLANDESK_DATA", global = true)]
    pub data_file: Option<PathBuf>,

    /// User id to act as.
    #[arg(long, env = "PLANDESK_USER", global = true)]
    pub user: Option<String>,

    /// Email of the acting user.
    #[arg(long, env = "PLANDESK_EMAIL", global = true)]
    pub email: Option<String>,

    /// Project that project-scoped commands apply to.
    #[arg(short, long, env = "PLANDESK_PROJECT", global = true)]
    pub project: Option<ProjectId>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "PLANDESK_LOG", global = true)]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/plandesk.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("plandesk")
        .join("plandesk.db")
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("plandesk").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
