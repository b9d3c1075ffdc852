//! Client-side cache of fetched task collections.
//!
//! Entries are keyed by query (scope plus filters) and view tab, and hold
//! the collection behind an `Arc` so callers can tell by pointer whether
//! anything changed. Mutations mark entries stale rather than removing
//! them; a stale entry is refetched on the next load.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use taskboard_proto::query::TaskQuery;
use taskboard_proto::task::Task;

use crate::store::ViewTab;

/// Identity of one cached collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// What was fetched.
    pub query: TaskQuery,
    /// Which view asked for it.
    pub tab: ViewTab,
}

impl CacheKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(query: TaskQuery, tab: ViewTab) -> Self {
        Self { query, tab }
    }

    fn covers(&self, workspace_id: &str, project_id: &str) -> bool {
        self.query.workspace_id == workspace_id
            && self
                .query
                .project_id
                .as_deref()
                .is_none_or(|p| p == project_id)
    }
}

#[derive(Debug)]
struct Entry {
    tasks: Arc<Vec<Task>>,
    stale: bool,
}

/// Shared query cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl QueryCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached collection, unless missing or stale.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Task>>> {
        self.entries
            .lock()
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| Arc::clone(&entry.tasks))
    }

    /// Stores a fresh collection and returns the shared handle.
    pub fn insert(&self, key: CacheKey, tasks: Vec<Task>) -> Arc<Vec<Task>> {
        let tasks = Arc::new(tasks);
        debug!(tab = %key.tab, count = tasks.len(), "cached task collection");
        self.entries.lock().insert(
            key,
            Entry {
                tasks: Arc::clone(&tasks),
                stale: false,
            },
        );
        tasks
    }

    /// Marks every entry for the project, and every workspace-wide entry of
    /// its workspace, stale. Returns how many entries were marked.
    pub fn invalidate_project(&self, workspace_id: &str, project_id: &str) -> usize {
        let mut entries = self.entries.lock();
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if key.covers(workspace_id, project_id) {
                entry.stale = true;
                marked += 1;
            }
        }
        debug!(workspace_id, project_id, marked, "invalidated project queries");
        marked
    }

    /// Marks everything stale.
    pub fn invalidate_all(&self) {
        for entry in self.entries.lock().values_mut() {
            entry.stale = true;
        }
    }

    /// True when the key is cached but stale.
    #[must_use]
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries.lock().get(key).is_some_and(|entry| entry.stale)
    }

    /// Number of entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
