//! Configuration system for the `taskboard` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use taskboard_proto::query::{SortField, SortOrder, TaskFilters, TaskQuery};
use taskboard_proto::task::{TaskId, TaskPriority, TaskStatus};

use crate::api::http::HttpConfig;
use crate::session::Session;
use crate::store::ViewTab;

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
    api: ApiFileConfig,
    session: SessionFileConfig,
    scope: ScopeFileConfig,
    ui: UiFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    url: Option<String>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    token: Option<String>,
}

/// `[scope]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ScopeFileConfig {
    workspace_id: Option<String>,
    project_id: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    state_file: Option<PathBuf>,
    event_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- API --
    /// Base url of the task API. `None` runs against demo data.
    pub api_url: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,

    // -- Session --
    /// Bearer token.
    pub access_token: Option<String>,

    // -- Scope --
    /// Workspace to show.
    pub workspace_id: Option<String>,
    /// Project to show; `None` shows the whole workspace.
    pub project_id: Option<String>,

    // -- UI --
    /// Where the active view tab is persisted.
    pub state_file: Option<PathBuf>,
    /// Buffer size for the sync event channel.
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("taskboard/", env!("CARGO_PKG_VERSION")).to_string(),
            access_token: None,
            workspace_id: None,
            project_id: None,
            state_file: None,
            event_buffer: 64,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/taskboard/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default. Separate from `load()` so it can be
    /// tested without CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli.api_url.clone().or_else(|| file.api.url.clone()),
            request_timeout: file
                .api
                .timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            user_agent: file
                .api
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            access_token: cli.token.clone().or_else(|| file.session.token.clone()),
            workspace_id: cli
                .workspace
                .clone()
                .or_else(|| file.scope.workspace_id.clone()),
            project_id: cli
                .project
                .clone()
                .or_else(|| file.scope.project_id.clone()),
            state_file: cli
                .state_file
                .clone()
                .or_else(|| file.ui.state_file.clone()),
            event_buffer: file.ui.event_buffer.unwrap_or(defaults.event_buffer),
        }
    }

    /// HTTP settings, or `None` in offline demo mode.
    #[must_use]
    pub fn to_http_config(&self) -> Option<HttpConfig> {
        let base_url = self.api_url.clone().filter(|url| !url.is_empty())?;
        Some(HttpConfig {
            base_url,
            timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
        })
    }

    /// Session carrying the configured token (blank when unset).
    #[must_use]
    pub fn to_session(&self) -> Session {
        Session::new(self.access_token.clone().unwrap_or_default())
    }

    /// Query scope from the configured workspace and project.
    ///
    /// Returns `None` when no workspace is configured.
    #[must_use]
    pub fn scope(&self) -> Option<TaskQuery> {
        let workspace = self.workspace_id.clone()?;
        Some(match &self.project_id {
            Some(project) => TaskQuery::project(workspace, project.clone()),
            None => TaskQuery::workspace(workspace),
        })
    }

    /// The UI state file, defaulting to `~/.config/taskboard/ui-state.json`
    /// (or the temp dir when no config dir exists).
    #[must_use]
    pub fn state_file_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| {
            dirs::config_dir().map_or_else(
                || std::env::temp_dir().join("taskboard-ui-state.json"),
                |dir| dir.join("taskboard").join("ui-state.json"),
            )
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban and list views over a remote task API")]
pub struct CliArgs {
    /// Base url of the task API (omit for offline demo data).
    #[arg(long, env = "TASKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the task API.
    #[arg(long, env = "TASKBOARD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Workspace id.
    #[arg(long, env = "TASKBOARD_WORKSPACE")]
    pub workspace: Option<String>,

    /// Project id (omit to show the whole workspace).
    #[arg(long, env = "TASKBOARD_PROJECT")]
    pub project: Option<String>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the UI state file that remembers the active view.
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Server-side filters.
    #[command(flatten)]
    pub filters: FilterArgs,

    /// What to do; without a command the last used view is shown.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Filters applied to `get-tasks`.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only tasks with this status (todo, in_progress, in_review, done).
    #[arg(long, global = true)]
    pub status: Option<TaskStatus>,

    /// Only tasks with this priority (low, medium, high).
    #[arg(long, global = true)]
    pub priority: Option<TaskPriority>,

    /// Only tasks due on this day (YYYY-MM-DD).
    #[arg(long, global = true)]
    pub due_date: Option<NaiveDate>,

    /// Case-insensitive name search.
    #[arg(long, global = true)]
    pub search: Option<String>,

    /// Sort field (name, position, dueDate, priority, status, createdAt).
    #[arg(long, global = true)]
    pub sort_by: Option<SortField>,

    /// Sort direction (asc, desc).
    #[arg(long, global = true)]
    pub sort_order: Option<SortOrder>,
}

impl FilterArgs {
    /// The filters as a query component.
    #[must_use]
    pub fn to_filters(&self) -> TaskFilters {
        TaskFilters {
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// Subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the kanban columns.
    Board,
    /// Show the flat list.
    List,
    /// Show the table.
    Table,
    /// Show tasks grouped by due date.
    Calendar,
    /// Move a task to another column.
    Move {
        /// Task to move.
        task: String,
        /// Destination column.
        #[arg(long)]
        to: TaskStatus,
        /// Destination index (default: end of the column).
        #[arg(long)]
        index: Option<usize>,
    },
    /// Swap a task with the one above it in its column.
    Up {
        /// Task to move.
        task: String,
    },
    /// Swap a task with the one below it in its column.
    Down {
        /// Task to move.
        task: String,
    },
    /// Mark a task done.
    Done {
        /// Task to complete.
        task: String,
    },
    /// Create a task in the configured project.
    Add {
        /// Task name.
        name: String,
        /// Member the task is assigned to.
        #[arg(long)]
        assignee: String,
        /// Column to create it in (default: todo).
        #[arg(long)]
        column: Option<TaskStatus>,
    },
    /// Rename a task or change its description.
    Edit {
        /// Task to edit.
        task: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a task.
    Delete {
        /// Task to delete.
        task: String,
    },
    /// List the projects of the configured workspace.
    Projects,
}

impl Command {
    /// The task a mutating command addresses.
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Move { task, .. }
            | Self::Up { task }
            | Self::Down { task }
            | Self::Done { task }
            | Self::Edit { task, .. }
            | Self::Delete { task } => Some(TaskId::new(task.as_str())),
            Self::Board
            | Self::List
            | Self::Table
            | Self::Calendar
            | Self::Add { .. }
            | Self::Projects => None,
        }
    }

    /// The view a display command switches to.
    #[must_use]
    pub const fn tab(&self) -> Option<ViewTab> {
        match self {
            Self::Board => Some(ViewTab::Kanban),
            Self::List => Some(ViewTab::List),
            Self::Table => Some(ViewTab::Table),
            Self::Calendar => Some(ViewTab::Calendar),
            Self::Move { .. }
            | Self::Up { .. }
            | Self::Down { .. }
            | Self::Done { .. }
            | Self::Add { .. }
            | Self::Edit { .. }
            | Self::Delete { .. }
            | Self::Projects => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

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
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
