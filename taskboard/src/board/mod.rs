//! Kanban board derived from a flat task collection.
//!
//! [`Board::partition`] buckets tasks by status and orders each bucket by
//! `position`. The board is derived state: rebuild it whenever the source
//! collection changes. Reordering lives in [`reorder`]; the flat list view
//! in [`list`].

pub mod list;
pub mod reorder;

pub use list::TaskList;
pub use reorder::{
    DragResult, DropLocation, MoveId, POSITION_STEP, PlannedMove, PlannedPersist, ReorderError,
};

use taskboard_proto::task::{Task, TaskId, TaskStatus};
use tracing::debug;

/// Index of a status in column order.
pub(crate) const fn slot(status: TaskStatus) -> usize {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::InReview => 2,
        TaskStatus::Done => 3,
    }
}

/// Sorts ascending by position, keeping input order for ties.
pub(crate) fn sort_by_position(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.position.total_cmp(&b.position));
}

/// One status column.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    status: TaskStatus,
    tasks: Vec<Task>,
}

impl Bucket {
    const fn new(status: TaskStatus) -> Self {
        Self {
            status,
            tasks: Vec::new(),
        }
    }

    /// The status every task in this bucket has.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Column header, e.g. "In Progress".
    #[must_use]
    pub const fn header(&self) -> &'static str {
        self.status.label()
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks shown in the column badge.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    /// True when the column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) const fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }
}

/// Status buckets in column order. All four are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    buckets: [Bucket; 4],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            buckets: TaskStatus::ALL.map(Bucket::new),
        }
    }
}

impl Board {
    /// Partitions tasks into status buckets, each sorted by position.
    #[must_use]
    pub fn partition(tasks: &[Task]) -> Self {
        let mut board = Self::default();
        for task in tasks {
            board.buckets[slot(task.status)].tasks.push(task.clone());
        }
        for bucket in &mut board.buckets {
            sort_by_position(&mut bucket.tasks);
        }
        debug!(
            todo = board.buckets[0].count(),
            in_progress = board.buckets[1].count(),
            in_review = board.buckets[2].count(),
            done = board.buckets[3].count(),
            "partitioned board"
        );
        board
    }

    /// The bucket for `status`.
    #[must_use]
    pub const fn bucket(&self, status: TaskStatus) -> &Bucket {
        &self.buckets[slot(status)]
    }

    pub(crate) const fn bucket_mut(&mut self, status: TaskStatus) -> &mut Bucket {
        &mut self.buckets[slot(status)]
    }

    /// All buckets in column order.
    #[must_use]
    pub const fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Total number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Bucket::count).sum()
    }

    /// True when no bucket holds a task.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    /// Where a task currently sits.
    #[must_use]
    pub fn locate(&self, id: &TaskId) -> Option<DropLocation> {
        self.buckets.iter().find_map(|bucket| {
            bucket
                .tasks
                .iter()
                .position(|task| task.id == *id)
                .map(|index| DropLocation::new(bucket.status, index))
        })
    }

    /// Looks a task up by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks().find(|task| task.id == *id)
    }

    /// Every task, bucket by bucket.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.buckets.iter().flat_map(|bucket| bucket.tasks.iter())
    }
}
