//! UI state container.
//!
//! Holds the active view tab, which modals are open, and the initial
//! values handed to the task form. One [`UiStore`] is created by the
//! front end and passed by reference to whatever needs it. The active tab
//! survives restarts through a small JSON state file.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use taskboard_proto::request::CreateTaskRequest;
use taskboard_proto::task::{ParseTaxonomyError, TaskId, TaskStatus};

/// Errors reading or writing the state file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The state file could not be read or written.
    #[error("state file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The state file is not valid JSON.
    #[error("malformed state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which rendering of the task collection is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTab {
    /// Flat list with move up/down and mark done.
    #[default]
    List,
    /// Status columns with drag and drop.
    Kanban,
    /// Sortable table.
    Table,
    /// Tasks grouped by due date.
    Calendar,
}

impl ViewTab {
    /// All tabs in switcher order.
    pub const ALL: [Self; 4] = [Self::List, Self::Kanban, Self::Table, Self::Calendar];

    /// Persisted name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Kanban => "kanban",
            Self::Table => "table",
            Self::Calendar => "calendar",
        }
    }
}

impl fmt::Display for ViewTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewTab {
    type Err = ParseTaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The dashboard also called the kanban tab "board".
        if s == "board" {
            return Ok(Self::Kanban);
        }
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| ParseTaxonomyError {
                kind: "view",
                value: s.to_string(),
            })
    }
}

/// Dialogs the front end can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    /// New task form.
    CreateTask,
    /// Edit task form.
    UpdateTask,
    /// Delete task confirmation.
    DeleteTask,
}

/// Values the task form opens with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInitialValues {
    /// Task being edited or deleted.
    pub task_id: Option<TaskId>,
    /// Status preset by the column's "+" button.
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default)]
    active_tab: ViewTab,
}

/// View switcher and dialog state.
#[derive(Debug, Default)]
pub struct UiStore {
    active_tab: ViewTab,
    open: HashSet<Modal>,
    initial: TaskInitialValues,
    state_file: Option<PathBuf>,
}

impl UiStore {
    /// A store with defaults and no state file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the persisted tab from `path`. A missing file yields defaults;
    /// later tab changes are written back to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let persisted = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<PersistedState>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ui state file, using defaults");
                PersistedState::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            active_tab: persisted.active_tab,
            state_file: Some(path),
            ..Self::default()
        })
    }

    /// Where the tab is persisted, if anywhere.
    #[must_use]
    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    /// Writes the persisted part of the state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&PersistedState {
            active_tab: self.active_tab,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }

    /// The visible tab.
    #[must_use]
    pub const fn active_tab(&self) -> ViewTab {
        self.active_tab
    }

    /// Switches tabs and persists the choice.
    ///
    /// The switch takes effect even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the state file cannot be written.
    pub fn set_active_tab(&mut self, tab: ViewTab) -> Result<(), StoreError> {
        if self.active_tab == tab {
            return Ok(());
        }
        self.active_tab = tab;
        self.save().inspect_err(|e| warn!("failed to persist view tab: {e}"))
    }

    /// Shows a dialog.
    pub fn open(&mut self, modal: Modal) {
        self.open.insert(modal);
    }

    /// Hides a dialog. Closing a task form clears its initial values.
    pub fn close(&mut self, modal: Modal) {
        self.open.remove(&modal);
        if matches!(modal, Modal::CreateTask | Modal::UpdateTask | Modal::DeleteTask) {
            self.initial = TaskInitialValues::default();
        }
    }

    /// True when the dialog is shown.
    #[must_use]
    pub fn is_open(&self, modal: Modal) -> bool {
        self.open.contains(&modal)
    }

    /// Opens the new task form, optionally preset to a column's status.
    pub fn open_create_task(&mut self, status: Option<TaskStatus>) {
        self.initial = TaskInitialValues {
            task_id: None,
            status,
        };
        self.open(Modal::CreateTask);
    }

    /// Opens the edit form for a task.
    pub fn open_update_task(&mut self, task_id: TaskId) {
        self.initial = TaskInitialValues {
            task_id: Some(task_id),
            status: None,
        };
        self.open(Modal::UpdateTask);
    }

    /// Opens the delete confirmation for a task.
    pub fn open_delete_task(&mut self, task_id: TaskId) {
        self.initial = TaskInitialValues {
            task_id: Some(task_id),
            status: None,
        };
        self.open(Modal::DeleteTask);
    }

    /// Values the open task form starts from.
    #[must_use]
    pub const fn initial_values(&self) -> &TaskInitialValues {
        &self.initial
    }

    /// A create request prefilled from the form's initial values.
    #[must_use]
    pub fn create_task_request(
        &self,
        name: &str,
        workspace_id: &str,
        project_id: &str,
        assignee_id: &str,
    ) -> CreateTaskRequest {
        let mut request = CreateTaskRequest::new(name, workspace_id, project_id, assignee_id);
        if let Some(status) = self.initial.status {
            request.status = status;
        }
        request
    }
}
