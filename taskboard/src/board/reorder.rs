//! Local reorder engine.
//!
//! Applies a drag result or a neighbor swap to the board in place and
//! returns the remote updates to send. Local state changes before anything
//! is persisted, so the caller can render the new arrangement immediately.
//!
//! Position rule: a repositioned task gets `index * POSITION_STEP`. Only
//! tasks that are persisted change position; siblings keep the values the
//! server reported, so a later no-op drop never sends an invented position.

use std::fmt;

use taskboard_proto::request::UpdateTaskRequest;
use taskboard_proto::task::{Task, TaskId, TaskStatus};
use tracing::debug;
use uuid::Uuid;

use super::Board;

/// Distance between consecutive persisted positions.
pub const POSITION_STEP: f64 = 1000.0;

/// Persisted position for a task shown at `index`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn position_for_index(index: usize) -> f64 {
    index as f64 * POSITION_STEP
}

/// A slot on the board: bucket plus index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropLocation {
    /// Bucket.
    pub status: TaskStatus,
    /// Index within the bucket.
    pub index: usize,
}

impl DropLocation {
    /// Creates a location.
    #[must_use]
    pub const fn new(status: TaskStatus, index: usize) -> Self {
        Self { status, index }
    }
}

/// Outcome of a drag gesture. `destination` is `None` when the task was
/// dropped outside any bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    /// Where the drag started.
    pub source: DropLocation,
    /// Where the task was dropped.
    pub destination: Option<DropLocation>,
}

impl DragResult {
    /// A drop from `source` onto `destination`.
    #[must_use]
    pub const fn new(source: DropLocation, destination: DropLocation) -> Self {
        Self {
            source,
            destination: Some(destination),
        }
    }

    /// A drag released outside every bucket.
    #[must_use]
    pub const fn cancelled(source: DropLocation) -> Self {
        Self {
            source,
            destination: None,
        }
    }
}

/// Errors raised before any local mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    /// The source index does not address a task.
    #[error("source index {index} out of range ({len} tasks)")]
    SourceOutOfRange {
        /// Requested index.
        index: usize,
        /// Bucket length.
        len: usize,
    },
    /// The destination index is past the end of the bucket.
    #[error("destination index {index} out of range ({len} tasks)")]
    DestinationOutOfRange {
        /// Requested index.
        index: usize,
        /// Bucket length before insertion.
        len: usize,
    },
    /// No task with this id is shown.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
}

/// Correlates a planned move with its log lines and sync events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoveId(Uuid);

impl MoveId {
    /// A new time-ordered id (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MoveId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One remote update produced by a move.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPersist {
    /// Task to update.
    pub task_id: TaskId,
    /// Workspace owning the task.
    pub workspace_id: String,
    /// Project owning the task; its cached collections are invalidated.
    pub project_id: String,
    /// The update body.
    pub request: UpdateTaskRequest,
}

impl PlannedPersist {
    /// Persists the task's current status and position.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            workspace_id: task.workspace.id.clone(),
            project_id: task.project.id.clone(),
            request: UpdateTaskRequest::reposition(task, task.status, task.position),
        }
    }

    /// Position being persisted.
    #[must_use]
    pub const fn position(&self) -> Option<f64> {
        self.request.position
    }

    /// Status being persisted.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.request.status
    }
}

/// Updates to send for one user action, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    /// Correlation id.
    pub id: MoveId,
    /// The moved task first, then any displaced neighbor.
    pub persists: Vec<PlannedPersist>,
}

impl PlannedMove {
    pub(crate) fn new(persists: Vec<PlannedPersist>) -> Self {
        Self {
            id: MoveId::new(),
            persists,
        }
    }
}

/// Gives the task at `index` its persisted position.
pub(crate) fn place(tasks: &mut [Task], index: usize) {
    tasks[index].position = position_for_index(index);
}

/// Moves the task at `from` to `to` within one sequence.
pub(crate) fn splice(tasks: &mut Vec<Task>, from: usize, to: usize) {
    let task = tasks.remove(from);
    tasks.insert(to, task);
}

/// Swaps `index` with `neighbor` and places both. The moved task is
/// persisted first, then the displaced neighbor.
pub(crate) fn swap_neighbors(tasks: &mut [Task], index: usize, neighbor: usize) -> PlannedMove {
    tasks.swap(index, neighbor);
    place(tasks, index);
    place(tasks, neighbor);
    PlannedMove::new(vec![
        PlannedPersist::for_task(&tasks[neighbor]),
        PlannedPersist::for_task(&tasks[index]),
    ])
}

impl Board {
    /// Applies a finished drag.
    ///
    /// Returns `Ok(None)` when the task was dropped outside the board.
    /// Dropping a task back onto its own slot changes nothing and persists
    /// its current position.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError`] if either index is out of range; the board
    /// is left untouched.
    pub fn reorder(&mut self, drag: DragResult) -> Result<Option<PlannedMove>, ReorderError> {
        let Some(destination) = drag.destination else {
            return Ok(None);
        };
        let source = drag.source;
        let source_len = self.bucket(source.status).count();
        if source.index >= source_len {
            return Err(ReorderError::SourceOutOfRange {
                index: source.index,
                len: source_len,
            });
        }
        let same_bucket = source.status == destination.status;
        let dest_len = self.bucket(destination.status).count();
        // Within a bucket the task itself is removed first, so the last
        // valid slot is len - 1.
        let dest_max = if same_bucket { dest_len - 1 } else { dest_len };
        if destination.index > dest_max {
            return Err(ReorderError::DestinationOutOfRange {
                index: destination.index,
                len: dest_len,
            });
        }

        if same_bucket && source.index == destination.index {
            let task = &self.bucket(source.status).tasks()[source.index];
            return Ok(Some(PlannedMove::new(vec![PlannedPersist::for_task(task)])));
        }

        let moved = if same_bucket {
            let tasks = self.bucket_mut(source.status).tasks_mut();
            splice(tasks, source.index, destination.index);
            place(tasks, destination.index);
            PlannedPersist::for_task(&tasks[destination.index])
        } else {
            let mut task = self.bucket_mut(source.status).tasks_mut().remove(source.index);
            task.status = destination.status;
            let tasks = self.bucket_mut(destination.status).tasks_mut();
            tasks.insert(destination.index, task);
            place(tasks, destination.index);
            PlannedPersist::for_task(&tasks[destination.index])
        };

        let planned = PlannedMove::new(vec![moved]);
        debug!(
            move_id = %planned.id,
            from = %source.status,
            from_index = source.index,
            to = %destination.status,
            to_index = destination.index,
            "reordered board"
        );
        Ok(Some(planned))
    }

    /// Swaps a task with the one above it in its bucket.
    ///
    /// Returns `Ok(None)` for the first task in a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownTask`] if the task is not on the board.
    pub fn move_up(&mut self, id: &TaskId) -> Result<Option<PlannedMove>, ReorderError> {
        let at = self
            .locate(id)
            .ok_or_else(|| ReorderError::UnknownTask(id.clone()))?;
        if at.index == 0 {
            return Ok(None);
        }
        let tasks = self.bucket_mut(at.status).tasks_mut();
        Ok(Some(swap_neighbors(tasks, at.index, at.index - 1)))
    }

    /// Swaps a task with the one below it in its bucket.
    ///
    /// Returns `Ok(None)` for the last task in a bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownTask`] if the task is not on the board.
    pub fn move_down(&mut self, id: &TaskId) -> Result<Option<PlannedMove>, ReorderError> {
        let at = self
            .locate(id)
            .ok_or_else(|| ReorderError::UnknownTask(id.clone()))?;
        let tasks = self.bucket_mut(at.status).tasks_mut();
        if at.index + 1 >= tasks.len() {
            return Ok(None);
        }
        Ok(Some(swap_neighbors(tasks, at.index, at.index + 1)))
    }
}
