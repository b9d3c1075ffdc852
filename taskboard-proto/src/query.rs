//! Query parameters for listing tasks.
//!
//! A [`TaskQuery`] is a scope (workspace, optionally narrowed to one
//! project) plus [`TaskFilters`]. It is also the cache key for fetched
//! collections, so it is `Eq + Hash`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::task::{ParseTaxonomyError, TaskPriority, TaskStatus};

/// Wire format for the `dueDate` filter.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Field the server sorts the collection by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Task name.
    Name,
    /// Bucket position.
    Position,
    /// Deadline.
    DueDate,
    /// Priority.
    Priority,
    /// Status.
    Status,
    /// Creation time.
    CreatedAt,
}

impl SortField {
    const ALL: [Self; 6] = [
        Self::Name,
        Self::Position,
        Self::DueDate,
        Self::Priority,
        Self::Status,
        Self::CreatedAt,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Position => "position",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseTaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ParseTaxonomyError {
                kind: "sort field",
                value: s.to_string(),
            })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseTaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ParseTaxonomyError {
                kind: "sort order",
                value: other.to_string(),
            }),
        }
    }
}

/// Optional filters applied server-side. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskFilters {
    /// Only tasks in this bucket.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<TaskPriority>,
    /// Only tasks due on this day.
    pub due_date: Option<NaiveDate>,
    /// Case-insensitive name search.
    pub search: Option<String>,
    /// Server-side sort key.
    pub sort_by: Option<SortField>,
    /// Server-side sort direction.
    pub sort_order: Option<SortOrder>,
}

impl TaskFilters {
    /// True when no filter or sort is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which tasks to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskQuery {
    /// Workspace the tasks belong to.
    pub workspace_id: String,
    /// Restrict to one project; `None` lists the whole workspace.
    pub project_id: Option<String>,
    /// Filters and sort.
    pub filters: TaskFilters,
}

impl TaskQuery {
    /// All tasks of a workspace.
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            project_id: None,
            filters: TaskFilters::default(),
        }
    }

    /// All tasks of one project.
    pub fn project(workspace_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            project_id: Some(project_id.into()),
            filters: TaskFilters::default(),
        }
    }

    /// Replaces the filters.
    #[must_use]
    pub fn with_filters(mut self, filters: TaskFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Encodes the query as `get-tasks` parameters, skipping unset filters.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("workspaceId", self.workspace_id.clone())];
        if let Some(project_id) = &self.project_id {
            params.push(("projectId", project_id.clone()));
        }
        let f = &self.filters;
        if let Some(status) = f.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = f.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(due) = f.due_date {
            params.push(("dueDate", due.format(DUE_DATE_FORMAT).to_string()));
        }
        if let Some(search) = f.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(sort_by) = f.sort_by {
            params.push(("sortBy", sort_by.as_str().to_string()));
        }
        if let Some(order) = f.sort_order {
            params.push(("sortOrder", order.as_str().to_string()));
        }
        params
    }
}
