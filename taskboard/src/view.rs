//! View controllers over a shared task collection.
//!
//! [`KanbanBoard`] and [`TaskListView`] pair derived local state with a
//! [`SyncAdapter`]: user actions mutate the local arrangement first, then
//! the planned updates are committed. After a failed commit the
//! reconciled server collection replaces local state. [`CalendarView`]
//! and [`TableView`] are read-only renderings of the same collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use taskboard_proto::query::TaskQuery;
use taskboard_proto::task::{Task, TaskId};

use crate::api::TaskApi;
use crate::board::{Board, DragResult, PlannedMove, TaskList};
use crate::cache::CacheKey;
use crate::session::Session;
use crate::store::ViewTab;
use crate::sync::{MoveOutcome, SyncAdapter, SyncError};

/// True when `next` is the collection already shown.
fn unchanged(current: Option<&Arc<Vec<Task>>>, next: &Arc<Vec<Task>>) -> bool {
    current.is_some_and(|current| Arc::ptr_eq(current, next))
}

/// Kanban columns with drag and drop.
pub struct KanbanBoard<A: TaskApi> {
    sync: Arc<SyncAdapter<A>>,
    key: CacheKey,
    source: Option<Arc<Vec<Task>>>,
    board: Board,
}

impl<A: TaskApi> KanbanBoard<A> {
    /// A board for `query`; call [`load`](Self::load) before use.
    #[must_use]
    pub fn new(sync: Arc<SyncAdapter<A>>, query: TaskQuery) -> Self {
        Self {
            sync,
            key: CacheKey::new(query, ViewTab::Kanban),
            source: None,
            board: Board::default(),
        }
    }

    /// Current local arrangement.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Cache key of the shown collection.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Loads the collection, from cache when fresh. The board is only
    /// re-partitioned when the collection changed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] if the fetch fails.
    pub async fn load(&mut self, session: &Session) -> Result<&Board, SyncError> {
        let tasks = self.sync.fetch(session, &self.key).await?;
        self.apply(tasks);
        Ok(&self.board)
    }

    /// Refetches the collection and rebuilds the board.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] if the fetch fails.
    pub async fn refresh(&mut self, session: &Session) -> Result<&Board, SyncError> {
        let tasks = self.sync.refetch(session, &self.key).await?;
        self.apply(tasks);
        Ok(&self.board)
    }

    /// Handles the end of a drag gesture.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the drag does not fit the board.
    /// Remote failures are reported in the outcome instead.
    pub async fn on_drag_end(
        &mut self,
        session: &Session,
        drag: DragResult,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.board.reorder(drag)?;
        Ok(self.commit(session, planned).await)
    }

    /// Moves a task one slot up in its column.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the task is not on the board.
    pub async fn move_up(
        &mut self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.board.move_up(id)?;
        Ok(self.commit(session, planned).await)
    }

    /// Moves a task one slot down in its column.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the task is not on the board.
    pub async fn move_down(
        &mut self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.board.move_down(id)?;
        Ok(self.commit(session, planned).await)
    }

    async fn commit(
        &mut self,
        session: &Session,
        planned: Option<PlannedMove>,
    ) -> Option<MoveOutcome> {
        let planned = planned?;
        let outcome = self.sync.commit(session, &self.key, planned).await;
        if let Some(tasks) = &outcome.reconciled {
            self.apply(Arc::clone(tasks));
        }
        Some(outcome)
    }

    fn apply(&mut self, tasks: Arc<Vec<Task>>) {
        if unchanged(self.source.as_ref(), &tasks) {
            return;
        }
        debug!(count = tasks.len(), "rebuilding kanban board");
        self.board = Board::partition(&tasks);
        self.source = Some(tasks);
    }
}

/// Flat task list with move up/down and mark done.
pub struct TaskListView<A: TaskApi> {
    sync: Arc<SyncAdapter<A>>,
    key: CacheKey,
    source: Option<Arc<Vec<Task>>>,
    list: TaskList,
}

impl<A: TaskApi> TaskListView<A> {
    /// A list for `query`; call [`load`](Self::load) before use.
    #[must_use]
    pub fn new(sync: Arc<SyncAdapter<A>>, query: TaskQuery) -> Self {
        Self {
            sync,
            key: CacheKey::new(query, ViewTab::List),
            source: None,
            list: TaskList::default(),
        }
    }

    /// Current local order.
    #[must_use]
    pub const fn list(&self) -> &TaskList {
        &self.list
    }

    /// Loads the collection, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] if the fetch fails.
    pub async fn load(&mut self, session: &Session) -> Result<&TaskList, SyncError> {
        let tasks = self.sync.fetch(session, &self.key).await?;
        self.apply(tasks);
        Ok(&self.list)
    }

    /// Refetches the collection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Api`] if the fetch fails.
    pub async fn refresh(&mut self, session: &Session) -> Result<&TaskList, SyncError> {
        let tasks = self.sync.refetch(session, &self.key).await?;
        self.apply(tasks);
        Ok(&self.list)
    }

    /// Handles a drag from `from` to `to` (`None` when cancelled).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if an index is out of range.
    pub async fn on_drag_end(
        &mut self,
        session: &Session,
        from: usize,
        to: Option<usize>,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.list.drag(from, to)?;
        Ok(self.commit(session, planned).await)
    }

    /// Moves a task one row up.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the task is not listed.
    pub async fn move_up(
        &mut self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.list.move_up(id)?;
        Ok(self.commit(session, planned).await)
    }

    /// Moves a task one row down.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the task is not listed.
    pub async fn move_down(
        &mut self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.list.move_down(id)?;
        Ok(self.commit(session, planned).await)
    }

    /// Marks a task done.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Reorder`] if the task is not listed.
    pub async fn mark_done(
        &mut self,
        session: &Session,
        id: &TaskId,
    ) -> Result<Option<MoveOutcome>, SyncError> {
        let planned = self.list.mark_done(id)?;
        Ok(self.commit(session, planned).await)
    }

    async fn commit(
        &mut self,
        session: &Session,
        planned: Option<PlannedMove>,
    ) -> Option<MoveOutcome> {
        let planned = planned?;
        let outcome = self.sync.commit(session, &self.key, planned).await;
        if let Some(tasks) = &outcome.reconciled {
            self.apply(Arc::clone(tasks));
        }
        Some(outcome)
    }

    fn apply(&mut self, tasks: Arc<Vec<Task>>) {
        if unchanged(self.source.as_ref(), &tasks) {
            return;
        }
        self.list = TaskList::new(tasks.as_ref().clone());
        self.source = Some(tasks);
    }
}

/// Tasks grouped by due day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarView {
    /// Tasks per due day, earliest day first.
    pub days: BTreeMap<NaiveDate, Vec<Task>>,
    /// Tasks without a due date.
    pub undated: Vec<Task>,
}

impl CalendarView {
    /// Groups by the UTC day of each due date.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut view = Self::default();
        for task in tasks {
            match task.due_date {
                Some(due) => view
                    .days
                    .entry(due.date_naive())
                    .or_default()
                    .push(task.clone()),
                None => view.undated.push(task.clone()),
            }
        }
        view
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Task id.
    pub id: String,
    /// Task name.
    pub name: String,
    /// Project name.
    pub project: String,
    /// Assignee display name.
    pub assignee: String,
    /// Due day, `YYYY-MM-DD`, or empty.
    pub due_date: String,
    /// Status label.
    pub status: &'static str,
    /// Priority label.
    pub priority: &'static str,
}

/// Rows of the table view, in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    /// Rows.
    pub rows: Vec<TableRow>,
}

impl TableView {
    /// Builds one row per task.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let rows = tasks
            .iter()
            .map(|task| TableRow {
                id: task.id.to_string(),
                name: task.name.clone(),
                project: task.project.name.clone(),
                assignee: task.assignee.account.display_name(),
                due_date: task
                    .due_date
                    .map(|due| due.date_naive().to_string())
                    .unwrap_or_default(),
                status: task.status.label(),
                priority: task.priority.label(),
            })
            .collect();
        Self { rows }
    }
}

/// Rendering selected by the view switcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    /// Flat list.
    List(TaskList),
    /// Status columns.
    Kanban(Board),
    /// Table rows.
    Table(TableView),
    /// Due-date groups.
    Calendar(CalendarView),
}

impl Rendering {
    /// Renders `tasks` the way `tab` shows them.
    #[must_use]
    pub fn for_tab(tab: ViewTab, tasks: &[Task]) -> Self {
        match tab {
            ViewTab::List => Self::List(TaskList::new(tasks.to_vec())),
            ViewTab::Kanban => Self::Kanban(Board::partition(tasks)),
            ViewTab::Table => Self::Table(TableView::from_tasks(tasks)),
            ViewTab::Calendar => Self::Calendar(CalendarView::from_tasks(tasks)),
        }
    }
}
