//! Integration tests for board partitioning and the local reorder engine.
//!
//! Covers kanban drag and drop across and within buckets, neighbor swaps,
//! and the flat list view, checking both the local arrangement and the
//! updates planned for the server.
//!
//! Verification command: `cargo test --test board_reorder`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use taskboard::board::reorder::position_for_index;
use taskboard::board::{Board, DragResult, DropLocation, POSITION_STEP, ReorderError, TaskList};
use taskboard_proto::task::{
    Account, Member, ProjectRef, Task, TaskId, TaskPriority, TaskStatus, WorkspaceRef,
};

// =============================================================================
// Test helpers
// =============================================================================

fn task(id: &str, status: TaskStatus, position: f64) -> Task {
    Task {
        id: TaskId::new(id),
        name: id.to_uppercase(),
        description: None,
        status,
        priority: TaskPriority::Medium,
        position,
        due_date: None,
        assignee: Member {
            id: format!("member-of-{id}"),
            account: Account {
                id: "acc-1".to_string(),
                first_name: "Kim".to_string(),
                last_name: "Lee".to_string(),
                email: "kim@example.com".to_string(),
                image_url: None,
            },
        },
        project: ProjectRef {
            id: "proj-1".to_string(),
            name: "Roadmap".to_string(),
        },
        workspace: WorkspaceRef {
            id: "ws-1".to_string(),
            name: "Team".to_string(),
        },
        media: None,
        media_type: None,
        created_at: None,
        updated_at: None,
    }
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

fn slot(status: TaskStatus, index: usize) -> DropLocation {
    DropLocation::new(status, index)
}

// =============================================================================
// Kanban drag and drop
// =============================================================================

#[test]
fn cross_bucket_drop_onto_top_of_done() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1.0),
        task("c", TaskStatus::Done, 0.0),
    ]);

    let planned = board
        .reorder(DragResult::new(slot(TaskStatus::Todo, 0), slot(TaskStatus::Done, 0)))
        .unwrap()
        .expect("a drop onto a bucket plans an update");

    let todo = board.bucket(TaskStatus::Todo).tasks();
    assert_eq!(ids(todo), ["b"]);
    assert_eq!(todo[0].position, 1.0);
    let done = board.bucket(TaskStatus::Done).tasks();
    assert_eq!(ids(done), ["a", "c"]);
    assert_eq!(done[0].position, 0.0);
    assert_eq!(done[0].status, TaskStatus::Done);
    // C sits at index 1 but is not persisted, so it keeps the server's value.
    assert_eq!(done[1].position, 0.0);

    assert_eq!(planned.persists.len(), 1);
    let persist = &planned.persists[0];
    assert_eq!(persist.task_id, TaskId::new("a"));
    assert_eq!(persist.position(), Some(0.0));
    assert_eq!(persist.status(), Some(TaskStatus::Done));
}

#[test]
fn update_body_echoes_required_fields() {
    let mut board = Board::partition(&[task("a", TaskStatus::Todo, 0.0)]);
    let planned = board
        .reorder(DragResult::new(slot(TaskStatus::Todo, 0), slot(TaskStatus::InProgress, 0)))
        .unwrap()
        .unwrap();
    let body = serde_json::to_value(&planned.persists[0].request).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "name": "A",
            "status": "in_progress",
            "position": 0.0,
            "assigneeId": "member-of-a",
            "projectId": "proj-1",
        })
    );
}

#[test]
fn dropping_on_own_slot_round_trips_position() {
    let tasks = [
        task("a", TaskStatus::InReview, 250.0),
        task("b", TaskStatus::InReview, 900.0),
    ];
    let mut board = Board::partition(&tasks);
    let before = board.clone();

    let planned = board
        .reorder(DragResult::new(
            slot(TaskStatus::InReview, 0),
            slot(TaskStatus::InReview, 0),
        ))
        .unwrap()
        .unwrap();

    assert_eq!(board, before);
    assert_eq!(planned.persists[0].position(), Some(250.0));
    assert_eq!(planned.persists[0].status(), Some(TaskStatus::InReview));
}

#[test]
fn dropping_outside_the_board_plans_nothing() {
    let mut board = Board::partition(&[task("a", TaskStatus::Todo, 0.0)]);
    let before = board.clone();
    assert!(
        board
            .reorder(DragResult::cancelled(slot(TaskStatus::Todo, 0)))
            .unwrap()
            .is_none()
    );
    assert_eq!(board, before);
}

#[test]
fn drop_into_empty_bucket_gets_position_zero() {
    let mut board = Board::partition(&[task("a", TaskStatus::Todo, 7000.0)]);
    let planned = board
        .reorder(DragResult::new(slot(TaskStatus::Todo, 0), slot(TaskStatus::InReview, 0)))
        .unwrap()
        .unwrap();
    assert!(board.bucket(TaskStatus::Todo).is_empty());
    assert_eq!(board.bucket(TaskStatus::InReview).count(), 1);
    assert_eq!(planned.persists[0].position(), Some(0.0));
}

#[test]
fn within_bucket_reorder_uses_destination_index() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::InProgress, 0.0),
        task("b", TaskStatus::InProgress, 1000.0),
        task("c", TaskStatus::InProgress, 2000.0),
        task("d", TaskStatus::InProgress, 3000.0),
    ]);
    let planned = board
        .reorder(DragResult::new(
            slot(TaskStatus::InProgress, 3),
            slot(TaskStatus::InProgress, 1),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(
        ids(board.bucket(TaskStatus::InProgress).tasks()),
        ["a", "d", "b", "c"]
    );
    assert_eq!(planned.persists[0].position(), Some(position_for_index(1)));
    assert_eq!(planned.persists[0].status(), Some(TaskStatus::InProgress));
}

#[test]
fn later_noop_drop_sends_the_server_position() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1.0),
        task("d", TaskStatus::Todo, 2.0),
        task("c", TaskStatus::Todo, 3.0),
    ]);
    board
        .reorder(DragResult::new(slot(TaskStatus::Todo, 3), slot(TaskStatus::Done, 0)))
        .unwrap();

    let planned = board
        .reorder(DragResult::new(slot(TaskStatus::Todo, 1), slot(TaskStatus::Todo, 1)))
        .unwrap()
        .unwrap();

    assert_eq!(ids(board.bucket(TaskStatus::Todo).tasks()), ["a", "b", "d"]);
    assert_eq!(planned.persists[0].task_id, TaskId::new("b"));
    assert_eq!(planned.persists[0].position(), Some(1.0));
}

#[test]
fn out_of_range_drag_is_rejected_without_mutation() {
    let mut board = Board::partition(&[task("a", TaskStatus::Todo, 0.0)]);
    let before = board.clone();
    assert_eq!(
        board.reorder(DragResult::new(slot(TaskStatus::Todo, 4), slot(TaskStatus::Done, 0))),
        Err(ReorderError::SourceOutOfRange { index: 4, len: 1 })
    );
    assert_eq!(
        board.reorder(DragResult::new(slot(TaskStatus::Todo, 0), slot(TaskStatus::Done, 1))),
        Err(ReorderError::DestinationOutOfRange { index: 1, len: 0 })
    );
    assert_eq!(board, before);
}

// =============================================================================
// Neighbor swaps
// =============================================================================

#[test]
fn move_up_in_three_item_bucket() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1000.0),
        task("c", TaskStatus::Todo, 2000.0),
    ]);
    let planned = board.move_up(&TaskId::new("b")).unwrap().unwrap();

    assert_eq!(ids(board.bucket(TaskStatus::Todo).tasks()), ["b", "a", "c"]);
    assert_eq!(planned.persists.len(), 2);
    assert_eq!(planned.persists[0].task_id, TaskId::new("b"));
    assert_eq!(planned.persists[0].position(), Some(0.0));
    assert_eq!(planned.persists[1].task_id, TaskId::new("a"));
    assert_eq!(planned.persists[1].position(), Some(POSITION_STEP));
}

#[test]
fn move_down_at_bottom_is_noop() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::Done, 0.0),
        task("b", TaskStatus::Done, 1000.0),
    ]);
    let before = board.clone();
    assert!(board.move_down(&TaskId::new("b")).unwrap().is_none());
    assert!(board.move_up(&TaskId::new("a")).unwrap().is_none());
    assert_eq!(board, before);
}

#[test]
fn swap_never_crosses_buckets() {
    let mut board = Board::partition(&[
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::InProgress, 0.0),
    ]);
    assert!(board.move_down(&TaskId::new("a")).unwrap().is_none());
    assert_eq!(board.bucket(TaskStatus::InProgress).count(), 1);
}

// =============================================================================
// Flat list view
// =============================================================================

#[test]
fn list_move_up_and_down() {
    let mut list = TaskList::new(vec![
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Done, 1000.0),
        task("c", TaskStatus::InReview, 2000.0),
    ]);

    let up = list.move_up(&TaskId::new("c")).unwrap().unwrap();
    assert_eq!(ids(list.tasks()), ["a", "c", "b"]);
    let persisted: Vec<(String, Option<f64>)> = up
        .persists
        .iter()
        .map(|p| (p.task_id.to_string(), p.position()))
        .collect();
    assert_eq!(
        persisted,
        [
            ("c".to_string(), Some(1000.0)),
            ("b".to_string(), Some(2000.0))
        ]
    );
    assert_eq!(up.persists[0].status(), Some(TaskStatus::InReview));

    assert!(list.move_down(&TaskId::new("b")).unwrap().is_none());
    assert!(list.move_up(&TaskId::new("a")).unwrap().is_none());
}

#[test]
fn list_drag_and_mark_done() {
    let mut list = TaskList::new(vec![
        task("a", TaskStatus::Todo, 0.0),
        task("b", TaskStatus::Todo, 1000.0),
    ]);
    let planned = list.drag(0, Some(1)).unwrap().unwrap();
    assert_eq!(ids(list.tasks()), ["b", "a"]);
    assert_eq!(planned.persists[0].position(), Some(1000.0));

    let done = list.mark_done(&TaskId::new("a")).unwrap().unwrap();
    assert_eq!(done.persists[0].status(), Some(TaskStatus::Done));
    assert_eq!(done.persists[0].position(), Some(1000.0));
    assert_eq!(list.position_of(&TaskId::new("a")), Some(1));
}

#[test]
fn unknown_task_is_an_error() {
    let mut list = TaskList::new(vec![task("a", TaskStatus::Todo, 0.0)]);
    assert_eq!(
        list.mark_done(&TaskId::new("nope")),
        Err(ReorderError::UnknownTask(TaskId::new("nope")))
    );
}
