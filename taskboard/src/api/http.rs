//! HTTP implementation of [`TaskApi`].
//!
//! Plain JSON over HTTP. Every request carries `Authorization: Bearer
//! <token>` from the caller's [`Session`]; a session without a token fails
//! before any I/O. Responses are unwrapped from the `{ "result": ... }`
//! envelope and non-success statuses are mapped onto [`ApiError`].

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use taskboard_proto::codec;
use taskboard_proto::query::TaskQuery;
use taskboard_proto::request::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_proto::task::{Task, TaskId};
use taskboard_proto::workspace::Workspace;

use super::{ApiError, TaskApi, WorkspaceApi};
use crate::session::Session;

const LIST_TASKS: &str = "api/get-tasks";
const GET_TASK: &str = "api/get-task";
const CREATE_TASK: &str = "api/create-task";
const UPDATE_TASK: &str = "api/update-task";
const DELETE_TASK: &str = "api/delete-task";
const GET_WORKSPACE: &str = "api/get-workspace";

/// Connection settings for [`HttpTaskApi`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base url of the API server, e.g. `https://tasks.example.com`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl HttpConfig {
    /// Settings with default timeout and user agent.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("taskboard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`TaskApi`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
}

impl HttpTaskApi {
    /// Builds a client for the given server.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the base url does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Network(format!("invalid api url {}: {e}", config.base_url)))?;
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// The normalized base url.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("invalid endpoint {path}: {e}")))
    }

    fn task_endpoint(&self, path: &str, id: &TaskId) -> Result<Url, ApiError> {
        self.item_endpoint(path, id.as_str())
    }

    fn item_endpoint(&self, path: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network(format!("cannot address {id} under {path}")))?
            .push(id);
        Ok(url)
    }

    /// Sends a request and returns the raw success body.
    async fn execute(
        &self,
        session: &Session,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ApiError> {
        let bearer = session.bearer()?;
        let response = request
            .header(AUTHORIZATION, bearer)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?;
        if status.is_success() {
            return Ok(body.to_vec());
        }
        let err = error_for_status(status, &body);
        warn!(status = status.as_u16(), "task api request failed: {err}");
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &Session,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.execute(session, request).await?;
        Ok(codec::decode_result(&body)?)
    }
}

/// Maps a non-success status onto the error taxonomy.
fn error_for_status(status: StatusCode, body: &[u8]) -> ApiError {
    let message = codec::error_message(body).unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

impl TaskApi for HttpTaskApi {
    async fn list_tasks(
        &self,
        session: &Session,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint(LIST_TASKS)?;
        debug!(workspace = %query.workspace_id, project = ?query.project_id, "listing tasks");
        let request = self.client.get(url).query(&query.to_params());
        self.fetch(session, request).await
    }

    async fn get_task(&self, session: &Session, id: &TaskId) -> Result<Task, ApiError> {
        let url = self.task_endpoint(GET_TASK, id)?;
        self.fetch(session, self.client.get(url)).await
    }

    async fn create_task(
        &self,
        session: &Session,
        request: &CreateTaskRequest,
    ) -> Result<Task, ApiError> {
        request.validate(chrono::Utc::now())?;
        let url = self.endpoint(CREATE_TASK)?;
        self.fetch(session, self.client.post(url).json(request)).await
    }

    async fn update_task(
        &self,
        session: &Session,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<Task, ApiError> {
        let url = self.task_endpoint(UPDATE_TASK, id)?;
        debug!(task = %id, "updating task");
        self.fetch(session, self.client.put(url).json(request)).await
    }

    async fn delete_task(&self, session: &Session, id: &TaskId) -> Result<(), ApiError> {
        let url = self.task_endpoint(DELETE_TASK, id)?;
        self.execute(session, self.client.delete(url)).await?;
        Ok(())
    }
}

impl WorkspaceApi for HttpTaskApi {
    async fn get_workspace(
        &self,
        session: &Session,
        workspace_id: &str,
    ) -> Result<Workspace, ApiError> {
        let url = self.item_endpoint(GET_WORKSPACE, workspace_id)?;
        self.fetch(session, self.client.get(url)).await
    }
}
