//! Remote sync adapter.
//!
//! Sends the updates planned by the reorder engine through a [`TaskApi`],
//! keeps the [`QueryCache`] coherent, and reports progress as
//! [`SyncEvent`]s on an mpsc channel for the front end to drain.
//!
//! Local state is already updated when a move reaches this layer. A
//! successful persist invalidates the owning project's cached collections.
//! Creating, editing, and deleting tasks go through the adapter for the
//! same reason.
//! A failed persist is reported and the collection is refetched
//! unconditionally; server state replaces the optimistic board.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use taskboard_proto::request::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_proto::task::{Task, TaskId, TaskStatus};

use crate::api::{ApiError, TaskApi};
use crate::board::{MoveId, PlannedMove, PlannedPersist, ReorderError};
use crate::cache::{CacheKey, QueryCache};
use crate::session::Session;

/// Errors surfaced to view controllers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The requested move does not fit the current board.
    #[error(transparent)]
    Reorder(#[from] ReorderError),

    /// Fetching the collection failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Progress notifications for the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The server accepted an update.
    Persisted {
        /// Move the update belongs to.
        move_id: MoveId,
        /// Updated task.
        task_id: TaskId,
        /// Status the server now holds.
        status: TaskStatus,
        /// Position the server now holds.
        position: f64,
    },
    /// The server rejected an update or could not be reached.
    PersistFailed {
        /// Move the update belongs to.
        move_id: MoveId,
        /// Task that was not updated.
        task_id: TaskId,
        /// User-facing reason.
        message: String,
    },
    /// The collection was refetched after a failure.
    Reconciled {
        /// Move whose failure triggered the refetch.
        move_id: MoveId,
        /// Tasks in the authoritative collection.
        count: usize,
    },
    /// The refetch after a failure failed too.
    ReconcileFailed {
        /// Move whose failure triggered the refetch.
        move_id: MoveId,
        /// User-facing reason.
        message: String,
    },
}

/// What happened to one committed move.
#[derive(Debug)]
pub struct MoveOutcome {
    /// Correlation id of the move.
    pub move_id: MoveId,
    /// Tasks as returned by accepted updates.
    pub persisted: Vec<Task>,
    /// Errors of rejected updates.
    pub failed: Vec<ApiError>,
    /// Authoritative collection fetched after a failure.
    pub reconciled: Option<Arc<Vec<Task>>>,
}

impl MoveOutcome {
    /// True when every update was accepted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Persists planned moves and keeps cached collections fresh.
pub struct SyncAdapter<A: TaskApi> {
    api: A,
    cache: Arc<QueryCache>,
    event_tx: mpsc::Sender<SyncEvent>,
}

impl<A: TaskApi> SyncAdapter<A> {
    /// Creates an adapter and the receiver for its [`SyncEvent`]s.
    ///
    /// Events are dropped when the receiver lags more than `event_buffer`
    /// behind.
    pub fn new(
        api: A,
        cache: Arc<QueryCache>,
        event_buffer: usize,
    ) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
        (
            Self {
                api,
                cache,
                event_tx,
            },
            event_rx,
        )
    }

    /// The underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The shared cache.
    pub const fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// The cached collection for `key`, fetching it when missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed fetch.
    pub async fn fetch(
        &self,
        session: &Session,
        key: &CacheKey,
    ) -> Result<Arc<Vec<Task>>, ApiError> {
        if let Some(tasks) = self.cache.get(key) {
            return Ok(tasks);
        }
        self.refetch(session, key).await
    }

    /// Fetches the collection for `key` regardless of the cache.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a failed fetch.
    pub async fn refetch(
        &self,
        session: &Session,
        key: &CacheKey,
    ) -> Result<Arc<Vec<Task>>, ApiError> {
        let tasks = self.api.list_tasks(session, &key.query).await?;
        Ok(self.cache.insert(key.clone(), tasks))
    }

    /// Sends one planned update.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a rejected update after emitting
    /// [`SyncEvent::PersistFailed`].
    pub async fn persist(
        &self,
        session: &Session,
        move_id: MoveId,
        planned: &PlannedPersist,
    ) -> Result<Task, ApiError> {
        match self
            .api
            .update_task(session, &planned.task_id, &planned.request)
            .await
        {
            Ok(task) => {
                self.cache
                    .invalidate_project(&planned.workspace_id, &planned.project_id);
                info!(
                    move_id = %move_id,
                    task = %task.id,
                    status = %task.status,
                    position = task.position,
                    "persisted task position"
                );
                self.emit(SyncEvent::Persisted {
                    move_id,
                    task_id: task.id.clone(),
                    status: task.status,
                    position: task.position,
                });
                Ok(task)
            }
            Err(err) => {
                warn!(move_id = %move_id, task = %planned.task_id, "persist failed: {err}");
                self.emit(SyncEvent::PersistFailed {
                    move_id,
                    task_id: planned.task_id.clone(),
                    message: format!("Failed to update task: {err}"),
                });
                Err(err)
            }
        }
    }

    /// Persists every update of a move and reconciles on failure.
    ///
    /// A neighbor swap sends both updates concurrently; neither waits for
    /// the other. If any update fails the collection for `key` is refetched
    /// and returned in [`MoveOutcome::reconciled`].
    pub async fn commit(
        &self,
        session: &Session,
        key: &CacheKey,
        planned: PlannedMove,
    ) -> MoveOutcome {
        let move_id = planned.id;
        let results = match planned.persists.as_slice() {
            [first, second] => {
                let (a, b) = tokio::join!(
                    self.persist(session, move_id, first),
                    self.persist(session, move_id, second)
                );
                vec![a, b]
            }
            persists => {
                let mut results = Vec::with_capacity(persists.len());
                for persist in persists {
                    results.push(self.persist(session, move_id, persist).await);
                }
                results
            }
        };

        let mut outcome = MoveOutcome {
            move_id,
            persisted: Vec::new(),
            failed: Vec::new(),
            reconciled: None,
        };
        for result in results {
            match result {
                Ok(task) => outcome.persisted.push(task),
                Err(err) => outcome.failed.push(err),
            }
        }

        if !outcome.is_success() {
            outcome.reconciled = self.reconcile(session, key, move_id).await;
        }
        outcome
    }

    async fn reconcile(
        &self,
        session: &Session,
        key: &CacheKey,
        move_id: MoveId,
    ) -> Option<Arc<Vec<Task>>> {
        match self.refetch(session, key).await {
            Ok(tasks) => {
                warn!(
                    move_id = %move_id,
                    count = tasks.len(),
                    "reconciled board with server state"
                );
                self.emit(SyncEvent::Reconciled {
                    move_id,
                    count: tasks.len(),
                });
                Some(tasks)
            }
            Err(err) => {
                warn!(move_id = %move_id, "reconcile fetch failed: {err}");
                self.emit(SyncEvent::ReconcileFailed {
                    move_id,
                    message: format!("Failed to reload tasks: {err}"),
                });
                None
            }
        }
    }

    /// Creates a task and invalidates its project's collections.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a rejected or invalid request.
    pub async fn create(
        &self,
        session: &Session,
        request: &CreateTaskRequest,
    ) -> Result<Task, ApiError> {
        let task = self.api.create_task(session, request).await?;
        self.cache
            .invalidate_project(&request.workspace_id, &request.project_id);
        info!(task = %task.id, status = %task.status, "created task");
        Ok(task)
    }

    /// Edits a task and invalidates its project's collections.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a rejected update.
    pub async fn update(
        &self,
        session: &Session,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<Task, ApiError> {
        let task = self.api.update_task(session, id, request).await?;
        self.cache
            .invalidate_project(&task.workspace.id, &task.project.id);
        info!(task = %task.id, "updated task");
        Ok(task)
    }

    /// Deletes a task. The server does not say which project it belonged
    /// to, so every cached collection goes stale.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] of a rejected delete.
    pub async fn delete(&self, session: &Session, id: &TaskId) -> Result<(), ApiError> {
        self.api.delete_task(session, id).await?;
        self.cache.invalidate_all();
        info!(task = %id, "deleted task");
        Ok(())
    }

    fn emit(&self, event: SyncEvent) {
        // A full or closed channel only loses a notification.
        let _ = self.event_tx.try_send(event);
    }
}
