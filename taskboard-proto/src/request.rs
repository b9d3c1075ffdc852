//! Request payloads for creating and updating tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{MediaType, Task, TaskPriority, TaskStatus};

/// Prefix a `document` media url must carry.
pub const DOCUMENT_URL_PREFIX: &str = "https://docs.google.com/document/d/";

/// Errors found while validating a request before it is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("{0} is required")]
    Required(&'static str),
    /// The due date lies in the past.
    #[error("due date must be in the future")]
    DueDateInPast,
    /// A document attachment is not a Google Docs url.
    #[error("media url must be a Google Docs url")]
    DocumentUrl,
}

/// Body of `PUT update-task/{id}`. Unset fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// New position inside the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// New deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// New assignee (member id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    /// Owning project id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Attachment url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Attachment kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
}

impl UpdateTaskRequest {
    /// A reposition update: the new `position` and `status`, plus the
    /// name, assignee, and project the API requires to be echoed back.
    #[must_use]
    pub fn reposition(task: &Task, status: TaskStatus, position: f64) -> Self {
        Self {
            name: Some(task.name.clone()),
            status: Some(status),
            position: Some(position),
            assignee_id: Some(task.assignee.id.clone()),
            project_id: Some(task.project.id.clone()),
            ..Self::default()
        }
    }

    /// Applies the set fields to a local copy of the task.
    ///
    /// Used to mirror an accepted update without a refetch. Assignee and
    /// project changes are not mirrored since only ids are known here.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(position) = self.position {
            task.position = position;
        }
        if let Some(due) = self.due_date {
            task.due_date = Some(due);
        }
        if let Some(media) = &self.media {
            task.media = Some(media.clone());
        }
        if let Some(kind) = self.media_type {
            task.media_type = Some(kind);
        }
    }
}

/// Body of `POST create-task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attachment url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    /// Attachment kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Owning project.
    pub project_id: String,
    /// Owning workspace.
    pub workspace_id: String,
    /// Assigned member.
    pub assignee_id: String,
    /// Initial bucket.
    pub status: TaskStatus,
    /// Priority.
    pub priority: TaskPriority,
    /// Initial position; the server picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// Deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// A request with required fields set, status `todo` and priority `medium`.
    pub fn new(
        name: impl Into<String>,
        workspace_id: impl Into<String>,
        project_id: impl Into<String>,
        assignee_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            media: None,
            media_type: None,
            project_id: project_id.into(),
            workspace_id: workspace_id.into(),
            assignee_id: assignee_id.into(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            position: None,
            due_date: None,
        }
    }

    /// Checks the request against the form rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let required = [
            ("name", &self.name),
            ("project id", &self.project_id),
            ("workspace id", &self.workspace_id),
            ("assignee id", &self.assignee_id),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError::Required(field));
        }
        if self.due_date.is_some_and(|due| due < now) {
            return Err(ValidationError::DueDateInPast);
        }
        if self.media_type == Some(MediaType::Document)
            && !self
                .media
                .as_deref()
                .is_some_and(|url| url.starts_with(DOCUMENT_URL_PREFIX))
        {
            return Err(ValidationError::DocumentUrl);
        }
        Ok(())
    }
}
