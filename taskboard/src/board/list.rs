//! Flat list view of a task collection.
//!
//! Same splice and swap semantics as the board, without buckets: tasks
//! keep their status when dragged, and "mark done" changes status in place.

use taskboard_proto::task::{Task, TaskId, TaskStatus};
use tracing::debug;

use super::reorder::{PlannedMove, PlannedPersist, ReorderError, place, splice, swap_neighbors};

/// Tasks in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Shows tasks in the order given (the server's sort).
    #[must_use]
    pub const fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Index of a task in the list.
    #[must_use]
    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    fn index_of(&self, id: &TaskId) -> Result<usize, ReorderError> {
        self.position_of(id)
            .ok_or_else(|| ReorderError::UnknownTask(id.clone()))
    }

    /// Applies a finished drag from `from` to `to`.
    ///
    /// `None` for `to` means the drop was cancelled. Dropping onto the same
    /// index persists the current position unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError`] if an index is out of range.
    pub fn drag(
        &mut self,
        from: usize,
        to: Option<usize>,
    ) -> Result<Option<PlannedMove>, ReorderError> {
        let Some(to) = to else {
            return Ok(None);
        };
        let len = self.tasks.len();
        if from >= len {
            return Err(ReorderError::SourceOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(ReorderError::DestinationOutOfRange { index: to, len });
        }
        if from == to {
            return Ok(Some(PlannedMove::new(vec![PlannedPersist::for_task(
                &self.tasks[from],
            )])));
        }
        splice(&mut self.tasks, from, to);
        place(&mut self.tasks, to);
        let planned = PlannedMove::new(vec![PlannedPersist::for_task(&self.tasks[to])]);
        debug!(move_id = %planned.id, from, to, "reordered list");
        Ok(Some(planned))
    }

    /// Swaps a task with the one above it.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownTask`] if the task is not listed.
    pub fn move_up(&mut self, id: &TaskId) -> Result<Option<PlannedMove>, ReorderError> {
        let index = self.index_of(id)?;
        if index == 0 {
            return Ok(None);
        }
        Ok(Some(swap_neighbors(&mut self.tasks, index, index - 1)))
    }

    /// Swaps a task with the one below it.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownTask`] if the task is not listed.
    pub fn move_down(&mut self, id: &TaskId) -> Result<Option<PlannedMove>, ReorderError> {
        let index = self.index_of(id)?;
        if index + 1 >= self.tasks.len() {
            return Ok(None);
        }
        Ok(Some(swap_neighbors(&mut self.tasks, index, index + 1)))
    }

    /// Moves a task to `done`, keeping its position.
    ///
    /// Returns `Ok(None)` if the task is already done.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::UnknownTask`] if the task is not listed.
    pub fn mark_done(&mut self, id: &TaskId) -> Result<Option<PlannedMove>, ReorderError> {
        let index = self.index_of(id)?;
        let task = &mut self.tasks[index];
        if task.status == TaskStatus::Done {
            return Ok(None);
        }
        task.status = TaskStatus::Done;
        Ok(Some(PlannedMove::new(vec![PlannedPersist::for_task(task)])))
    }
}
