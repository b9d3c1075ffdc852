//! In-process task store for tests and offline demo mode.
//!
//! [`InMemoryTaskApi`] behaves like the remote API closely enough for the
//! sync layer: server-side filtering and sorting, bearer checks, and
//! partial updates. Clones share state, so a test can keep a handle and
//! inspect what the adapter sent.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

use taskboard_proto::query::{SortField, SortOrder, TaskFilters, TaskQuery};
use taskboard_proto::request::{CreateTaskRequest, DOCUMENT_URL_PREFIX, UpdateTaskRequest};
use taskboard_proto::task::{
    Account, Member, MediaType, ProjectRef, Task, TaskId, TaskPriority, TaskStatus, WorkspaceRef,
};
use taskboard_proto::workspace::{Project, Workspace};

use super::{ApiError, TaskApi, WorkspaceApi};
use crate::board::{POSITION_STEP, slot};
use crate::session::Session;

/// Workspace seeded by [`InMemoryTaskApi::demo`].
pub const DEMO_WORKSPACE_ID: &str = "demo-workspace";
/// Project seeded by [`InMemoryTaskApi::demo`].
pub const DEMO_PROJECT_ID: &str = "demo-project";

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    workspaces: Vec<Workspace>,
    required_token: Option<String>,
    failing_updates: usize,
    updates: Vec<(TaskId, UpdateTaskRequest)>,
    list_calls: usize,
    next_id: u64,
}

/// [`TaskApi`] over a shared in-memory task list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryTaskApi {
    /// An empty store that accepts any non-blank token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with tasks, kept in the given order.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let api = Self::new();
        api.state.lock().tasks = tasks;
        api
    }

    /// Registers a workspace for [`WorkspaceApi::get_workspace`].
    #[must_use]
    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.state.lock().workspaces.push(workspace);
        self
    }

    /// Rejects every session whose token is not `token`.
    #[must_use]
    pub fn require_token(self, token: impl Into<String>) -> Self {
        self.state.lock().required_token = Some(token.into());
        self
    }

    /// Makes the next `count` updates fail with a server error.
    pub fn fail_next_updates(&self, count: usize) {
        self.state.lock().failing_updates = count;
    }

    /// Every update received, in arrival order, including failed ones.
    #[must_use]
    pub fn updates(&self) -> Vec<(TaskId, UpdateTaskRequest)> {
        self.state.lock().updates.clone()
    }

    /// How many list requests were served.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    /// Snapshot of the stored tasks.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// A store with a small project spread over every bucket.
    #[must_use]
    pub fn demo() -> Self {
        let ada = demo_member("m-ada", "Ada", "Lovelace");
        let lin = demo_member("m-lin", "Lin", "Okafor");
        let now = Utc::now();
        let rows = [
            ("Draft launch checklist", TaskStatus::Todo, TaskPriority::High, &ada, Some(3)),
            ("Collect beta feedback", TaskStatus::Todo, TaskPriority::Medium, &lin, None),
            ("Fix login redirect", TaskStatus::Todo, TaskPriority::Low, &ada, Some(10)),
            ("Migrate billing tables", TaskStatus::InProgress, TaskPriority::High, &lin, Some(1)),
            ("Write API docs", TaskStatus::InProgress, TaskPriority::Medium, &ada, None),
            ("Review onboarding copy", TaskStatus::InReview, TaskPriority::Low, &lin, Some(2)),
            ("Set up CI cache", TaskStatus::Done, TaskPriority::Medium, &ada, None),
        ];
        let mut tasks = Vec::with_capacity(rows.len());
        let mut per_bucket = [0_u32; 4];
        for (n, (name, status, priority, member, due_in_days)) in rows.into_iter().enumerate() {
            let column = slot(status);
            let position = f64::from(per_bucket[column]) * POSITION_STEP;
            per_bucket[column] += 1;
            tasks.push(Task {
                id: TaskId::new(format!("demo-{}", n + 1)),
                name: name.to_string(),
                description: None,
                status,
                priority,
                position,
                due_date: due_in_days.map(|days| now + Duration::days(days)),
                assignee: member.clone(),
                project: ProjectRef {
                    id: DEMO_PROJECT_ID.to_string(),
                    name: "Website relaunch".to_string(),
                },
                workspace: WorkspaceRef {
                    id: DEMO_WORKSPACE_ID.to_string(),
                    name: "Demo".to_string(),
                },
                media: None,
                media_type: None,
                created_at: Some(now),
                updated_at: Some(now),
            });
        }
        if let Some(docs) = tasks.iter_mut().find(|t| t.name == "Write API docs") {
            docs.media = Some(format!("{DOCUMENT_URL_PREFIX}demo-api-outline"));
            docs.media_type = Some(MediaType::Document);
        }
        Self::with_tasks(tasks).with_workspace(Workspace {
            id: DEMO_WORKSPACE_ID.to_string(),
            name: "Demo".to_string(),
            description: None,
            image_url: None,
            projects: vec![Project {
                id: DEMO_PROJECT_ID.to_string(),
                name: "Website relaunch".to_string(),
                description: None,
                color: None,
            }],
            admin: Some(ada.account),
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    fn authorize(&self, session: &Session) -> Result<(), ApiError> {
        session.bearer()?;
        match &self.state.lock().required_token {
            Some(token) if token != session.access_token() => {
                Err(ApiError::Unauthorized("invalid access token".to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn demo_member(id: &str, first: &str, last: &str) -> Member {
    Member {
        id: id.to_string(),
        account: Account {
            id: format!("acc-{id}"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.com", first.to_lowercase()),
            image_url: None,
        },
    }
}

fn matches(task: &Task, query: &TaskQuery) -> bool {
    let TaskFilters {
        status,
        priority,
        due_date,
        search,
        ..
    } = &query.filters;
    task.workspace.id == query.workspace_id
        && query.project_id.as_ref().is_none_or(|p| *p == task.project.id)
        && status.is_none_or(|s| s == task.status)
        && priority.is_none_or(|p| p == task.priority)
        && due_date.is_none_or(|d| task.due_date.map(|due| due.date_naive()) == Some(d))
        && search.as_deref().is_none_or(|needle| {
            task.name.to_lowercase().contains(&needle.to_lowercase())
        })
}

fn compare(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Position => a.position.total_cmp(&b.position),
        SortField::DueDate => a.due_date.cmp(&b.due_date),
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::Status => slot(a.status).cmp(&slot(b.status)),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

impl TaskApi for InMemoryTaskApi {
    async fn list_tasks(
        &self,
        session: &Session,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, ApiError> {
        self.authorize(session)?;
        let mut state = self.state.lock();
        state.list_calls += 1;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| matches(task, query))
            .cloned()
            .collect();
        if let Some(field) = query.filters.sort_by {
            let order = query.filters.sort_order.unwrap_or_default();
            tasks.sort_by(|a, b| {
                let ord = compare(a, b, field);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        debug!(count = tasks.len(), "served task list");
        Ok(tasks)
    }

    async fn get_task(&self, session: &Session, id: &TaskId) -> Result<Task, ApiError> {
        self.authorize(session)?;
        self.state
            .lock()
            .tasks
            .iter()
            .find(|task| task.id == *id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("task {id}")))
    }

    async fn create_task(
        &self,
        session: &Session,
        request: &CreateTaskRequest,
    ) -> Result<Task, ApiError> {
        self.authorize(session)?;
        request.validate(Utc::now())?;
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TaskId::new(format!("task-{}", state.next_id));

        let assignee = state
            .tasks
            .iter()
            .find(|task| task.assignee.id == request.assignee_id)
            .map_or_else(
                || demo_member(&request.assignee_id, "", ""),
                |task| task.assignee.clone(),
            );
        let project = state
            .tasks
            .iter()
            .find(|task| task.project.id == request.project_id)
            .map_or_else(
                || ProjectRef {
                    id: request.project_id.clone(),
                    name: String::new(),
                },
                |task| task.project.clone(),
            );
        let position = request.position.unwrap_or_else(|| {
            state
                .tasks
                .iter()
                .filter(|t| t.project.id == request.project_id && t.status == request.status)
                .map(|t| t.position)
                .max_by(f64::total_cmp)
                .map_or(0.0, |max| max + POSITION_STEP)
        });

        let now = Utc::now();
        let task = Task {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            position,
            due_date: request.due_date,
            assignee,
            project,
            workspace: WorkspaceRef {
                id: request.workspace_id.clone(),
                name: String::new(),
            },
            media: request.media.clone(),
            media_type: request.media_type,
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        session: &Session,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<Task, ApiError> {
        self.authorize(session)?;
        let mut state = self.state.lock();
        state.updates.push((id.clone(), request.clone()));
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(ApiError::Server {
                status: 500,
                message: "injected update failure".to_string(),
            });
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("task {id}")))?;
        request.apply_to(task);
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete_task(&self, session: &Session, id: &TaskId) -> Result<(), ApiError> {
        self.authorize(session)?;
        let mut state = self.state.lock();
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != *id);
        if state.tasks.len() == before {
            return Err(ApiError::NotFound(format!("task {id}")));
        }
        Ok(())
    }
}

impl WorkspaceApi for InMemoryTaskApi {
    async fn get_workspace(
        &self,
        session: &Session,
        workspace_id: &str,
    ) -> Result<Workspace, ApiError> {
        self.authorize(session)?;
        self.state
            .lock()
            .workspaces
            .iter()
            .find(|workspace| workspace.id == workspace_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("workspace {workspace_id}")))
    }
}
