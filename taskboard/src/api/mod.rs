//! Remote task API abstraction.
//!
//! Defines the [`TaskApi`] trait the sync layer talks to, and the read-only
//! [`WorkspaceApi`] for workspace and project metadata. Implementations:
//! - [`http::HttpTaskApi`]: JSON over HTTP with bearer authentication
//! - [`memory::InMemoryTaskApi`]: in-process store for tests and offline demo mode

pub mod http;
pub mod memory;

use std::future::Future;

use taskboard_proto::codec::CodecError;
use taskboard_proto::query::TaskQuery;
use taskboard_proto::request::{CreateTaskRequest, UpdateTaskRequest, ValidationError};
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::workspace::Workspace;

use crate::session::Session;

/// Errors returned by remote task operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (connection, timeout, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// The payload was rejected, locally or by the server.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, expired, or insufficient credentials.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The addressed task does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status line.
        message: String,
    },

    /// A success response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Codec(#[from] CodecError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl ApiError {
    /// True for authorization failures.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Async interface to the remote task collection.
///
/// Every call takes the caller's [`Session`] explicitly. Implementations
/// must not cache: freshness is the job of [`crate::cache::QueryCache`].
pub trait TaskApi: Send + Sync {
    /// Lists tasks in a workspace or project, filtered and sorted server-side.
    fn list_tasks(
        &self,
        session: &Session,
        query: &TaskQuery,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// Fetches one task.
    fn get_task(
        &self,
        session: &Session,
        id: &TaskId,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Creates a task and returns it as stored.
    fn create_task(
        &self,
        session: &Session,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Applies a partial update and returns the updated task.
    fn update_task(
        &self,
        session: &Session,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Deletes a task.
    fn delete_task(
        &self,
        session: &Session,
        id: &TaskId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Read access to workspaces and their projects.
pub trait WorkspaceApi: Send + Sync {
    /// Fetches a workspace with its project list.
    fn get_workspace(
        &self,
        session: &Session,
        workspace_id: &str,
    ) -> impl Future<Output = Result<Workspace, ApiError>> + Send;
}
