//! Integration tests for the remote sync adapter and view controllers.
//!
//! Runs the kanban and list controllers against the in-memory task API:
//! persisted updates, cache invalidation and refetch, reconciliation after
//! a failed update, server-side filters, and authorization failures.
//!
//! Verification command: `cargo test --test remote_sync`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use tokio::sync::mpsc;

use taskboard::api::memory::InMemoryTaskApi;
use taskboard::api::{ApiError, TaskApi};
use taskboard::board::{DragResult, DropLocation};
use taskboard::cache::{CacheKey, QueryCache};
use taskboard::session::Session;
use taskboard::store::ViewTab;
use taskboard::sync::{SyncAdapter, SyncError, SyncEvent};
use taskboard::view::{KanbanBoard, TaskListView};
use taskboard_proto::query::{TaskFilters, TaskQuery};
use taskboard_proto::request::CreateTaskRequest;
use taskboard_proto::task::{
    Account, Member, ProjectRef, Task, TaskId, TaskPriority, TaskStatus, WorkspaceRef,
};

// =============================================================================
// Test helpers
// =============================================================================

const WORKSPACE: &str = "ws-1";
const PROJECT: &str = "proj-1";
const TOKEN: &str = "token-123";

fn task(id: &str, status: TaskStatus, position: f64) -> Task {
    Task {
        id: TaskId::new(id),
        name: format!("Task {id}"),
        description: None,
        status,
        priority: TaskPriority::Low,
        position,
        due_date: None,
        assignee: Member {
            id: "member-1".to_string(),
            account: Account {
                id: "acc-1".to_string(),
                first_name: "Kim".to_string(),
                last_name: "Lee".to_string(),
                email: "kim@example.com".to_string(),
                image_url: None,
            },
        },
        project: ProjectRef {
            id: PROJECT.to_string(),
            name: "Roadmap".to_string(),
        },
        workspace: WorkspaceRef {
            id: WORKSPACE.to_string(),
            name: "Team".to_string(),
        },
        media: None,
        media_type: None,
        created_at: None,
        updated_at: None,
    }
}

fn seeded() -> InMemoryTaskApi {
    InMemoryTaskApi::with_tasks(vec![
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1000.0),
        task("c", TaskStatus::Todo, 2000.0),
        task("d", TaskStatus::Done, 0.0),
    ])
    .require_token(TOKEN)
}

fn adapter(
    api: &InMemoryTaskApi,
) -> (Arc<SyncAdapter<InMemoryTaskApi>>, mpsc::Receiver<SyncEvent>) {
    let (sync, events) = SyncAdapter::new(api.clone(), Arc::new(QueryCache::new()), 32);
    (Arc::new(sync), events)
}

fn query() -> TaskQuery {
    TaskQuery::project(WORKSPACE, PROJECT)
}

fn session() -> Session {
    Session::new(TOKEN)
}

fn drain(events: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn stored(api: &InMemoryTaskApi, id: &str) -> Task {
    api.tasks()
        .into_iter()
        .find(|t| t.id.as_str() == id)
        .expect("task is stored")
}

// =============================================================================
// Persist and invalidate
// =============================================================================

#[tokio::test]
async fn drag_persists_status_and_position() {
    let api = seeded();
    let (sync, mut events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());
    view.load(&session()).await.unwrap();

    let outcome = view
        .on_drag_end(
            &session(),
            DragResult::new(
                DropLocation::new(TaskStatus::Todo, 0),
                DropLocation::new(TaskStatus::Done, 0),
            ),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.is_success());

    let a = stored(&api, "a");
    assert_eq!(a.status, TaskStatus::Done);
    assert_eq!(a.position, 0.0);
    assert_eq!(api.updates().len(), 1);

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        SyncEvent::Persisted { task_id, status: TaskStatus::Done, .. } if task_id.as_str() == "a"
    ));
}

#[tokio::test]
async fn persist_invalidates_and_next_load_refetches() {
    let api = seeded();
    let (sync, _events) = adapter(&api);
    let key = CacheKey::new(query(), ViewTab::Kanban);
    let mut view = KanbanBoard::new(Arc::clone(&sync), query());

    view.load(&session()).await.unwrap();
    view.load(&session()).await.unwrap();
    assert_eq!(api.list_calls(), 1, "second load is served from cache");

    view.move_down(&session(), &TaskId::new("a"))
        .await
        .unwrap()
        .unwrap();
    assert!(sync.cache().is_stale(&key));

    let board = view.load(&session()).await.unwrap();
    assert_eq!(api.list_calls(), 2);
    let todo: Vec<&str> = board
        .bucket(TaskStatus::Todo)
        .tasks()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(todo, ["b", "a", "c"]);
}

#[tokio::test]
async fn swap_issues_moved_task_first() {
    let api = seeded();
    let (sync, _events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());
    view.load(&session()).await.unwrap();

    view.move_up(&session(), &TaskId::new("b"))
        .await
        .unwrap()
        .unwrap();

    let updates: Vec<(String, Option<f64>)> = api
        .updates()
        .into_iter()
        .map(|(id, req)| (id.to_string(), req.position))
        .collect();
    assert_eq!(
        updates,
        [
            ("b".to_string(), Some(0.0)),
            ("a".to_string(), Some(1000.0))
        ]
    );
}

#[tokio::test]
async fn noop_drop_after_a_move_keeps_server_order() {
    let api = InMemoryTaskApi::with_tasks(vec![
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1.0),
        task("d", TaskStatus::Todo, 2.0),
        task("c", TaskStatus::Todo, 3.0),
    ])
    .require_token(TOKEN);
    let (sync, _events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());
    view.load(&session()).await.unwrap();

    view.on_drag_end(
        &session(),
        DragResult::new(
            DropLocation::new(TaskStatus::Todo, 3),
            DropLocation::new(TaskStatus::Done, 0),
        ),
    )
    .await
    .unwrap()
    .unwrap();
    view.on_drag_end(
        &session(),
        DragResult::new(
            DropLocation::new(TaskStatus::Todo, 1),
            DropLocation::new(TaskStatus::Todo, 1),
        ),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(stored(&api, "b").position, 1.0);
    let board = view.load(&session()).await.unwrap();
    let todo: Vec<&str> = board
        .bucket(TaskStatus::Todo)
        .tasks()
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(todo, ["a", "b", "d"]);
}

#[tokio::test]
async fn workspace_wide_views_are_invalidated_too() {
    let api = seeded();
    let (sync, _events) = adapter(&api);
    let workspace_key = CacheKey::new(TaskQuery::workspace(WORKSPACE), ViewTab::Table);
    sync.fetch(&session(), &workspace_key).await.unwrap();

    let mut view = KanbanBoard::new(Arc::clone(&sync), query());
    view.load(&session()).await.unwrap();
    view.move_down(&session(), &TaskId::new("b"))
        .await
        .unwrap()
        .unwrap();

    assert!(sync.cache().is_stale(&workspace_key));
}

// =============================================================================
// Failure and reconciliation
// =============================================================================

#[tokio::test]
async fn failed_persist_reconciles_to_server_state() {
    let api = seeded();
    api.fail_next_updates(1);
    let (sync, mut events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());
    view.load(&session()).await.unwrap();

    let outcome = view
        .on_drag_end(
            &session(),
            DragResult::new(
                DropLocation::new(TaskStatus::Todo, 2),
                DropLocation::new(TaskStatus::InReview, 0),
            ),
        )
        .await
        .unwrap()
        .unwrap();

    assert!(!outcome.is_success());
    assert!(matches!(outcome.failed[0], ApiError::Server { status: 500, .. }));
    assert_eq!(outcome.reconciled.as_ref().map(|t| t.len()), Some(4));

    // Server never accepted the move, so the board snaps back.
    assert!(view.board().bucket(TaskStatus::InReview).is_empty());
    assert_eq!(view.board().bucket(TaskStatus::Todo).count(), 3);
    assert_eq!(stored(&api, "c").status, TaskStatus::Todo);

    let events = drain(&mut events);
    assert!(matches!(
        &events[0],
        SyncEvent::PersistFailed { message, .. } if message.contains("injected update failure")
    ));
    assert!(matches!(
        events[1],
        SyncEvent::Reconciled { count: 4, move_id } if move_id == outcome.move_id
    ));
}

#[tokio::test]
async fn partial_swap_failure_still_refetches() {
    let api = seeded();
    api.fail_next_updates(1);
    let (sync, mut events) = adapter(&api);
    let mut view = TaskListView::new(sync, query());
    view.load(&session()).await.unwrap();

    let outcome = view
        .move_down(&session(), &TaskId::new("a"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.persisted.len(), 1);
    assert!(outcome.reconciled.is_some());
    let ids: Vec<&str> = view.list().tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c", "d"]);
    assert!(
        drain(&mut events)
            .iter()
            .any(|e| matches!(e, SyncEvent::Reconciled { .. }))
    );
}

// =============================================================================
// Filters and authorization
// =============================================================================

#[tokio::test]
async fn status_filter_populates_only_that_bucket() {
    let api = seeded();
    let (sync, _events) = adapter(&api);
    let filtered = query().with_filters(TaskFilters {
        status: Some(TaskStatus::Todo),
        ..TaskFilters::default()
    });
    let mut view = KanbanBoard::new(sync, filtered);
    let board = view.load(&session()).await.unwrap();

    assert_eq!(board.bucket(TaskStatus::Todo).count(), 3);
    for status in [TaskStatus::InProgress, TaskStatus::InReview, TaskStatus::Done] {
        assert!(board.bucket(status).is_empty(), "{status} should be empty");
    }
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let api = seeded();
    let (sync, mut events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());

    let err = view.load(&Session::new("")).await.unwrap_err();
    assert!(matches!(err, SyncError::Api(ApiError::Unauthorized(_))));
    assert_eq!(api.list_calls(), 0);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let api = seeded();
    let err = api
        .list_tasks(&Session::new("stolen"), &query())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn created_task_lands_at_end_of_its_bucket() {
    let api = seeded();
    let mut request = CreateTaskRequest::new("Follow up", WORKSPACE, PROJECT, "member-1");
    request.status = TaskStatus::Done;

    let created = api.create_task(&session(), &request).await.unwrap();
    assert_eq!(created.status, TaskStatus::Done);
    assert_eq!(created.position, 1000.0);
    assert_eq!(created.assignee.account.first_name, "Kim");

    let (sync, _events) = adapter(&api);
    let mut view = KanbanBoard::new(sync, query());
    let board = view.load(&session()).await.unwrap();
    let done = board.bucket(TaskStatus::Done).tasks();
    assert_eq!(done.last().map(|t| t.id.clone()), Some(created.id));
}
