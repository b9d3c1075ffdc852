//! Integration tests for the HTTP task API against a mock server.
//!
//! Checks request shape (paths, query parameters, bearer header, update
//! body), envelope decoding, the workspace read, and the mapping of error
//! statuses, plus one drag committed end to end through the sync adapter.
//!
//! Verification command: `cargo test --test http_api`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskboard::api::http::{HttpConfig, HttpTaskApi};
use taskboard::api::{ApiError, TaskApi, WorkspaceApi};
use taskboard::board::{DragResult, DropLocation};
use taskboard::cache::QueryCache;
use taskboard::session::Session;
use taskboard::sync::SyncAdapter;
use taskboard::view::KanbanBoard;
use taskboard_proto::query::{SortField, SortOrder, TaskFilters, TaskQuery};
use taskboard_proto::request::{CreateTaskRequest, UpdateTaskRequest};
use taskboard_proto::task::{TaskId, TaskStatus};

// =============================================================================
// Test helpers
// =============================================================================

const TOKEN: &str = "secret-token";

fn task_json(id: &str, status: &str, position: f64) -> Value {
    json!({
        "_id": id,
        "name": format!("Task {id}"),
        "status": status,
        "priority": "high",
        "position": position,
        "assignee": {
            "_id": "member-1",
            "account": { "_id": "acc-1", "firstName": "Kim", "lastName": "Lee" }
        },
        "project": { "_id": "proj-1", "name": "Roadmap" },
        "workspace": { "_id": "ws-1", "name": "Team" }
    })
}

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
}

fn client(server: &MockServer) -> HttpTaskApi {
    HttpTaskApi::new(&HttpConfig::new(server.uri())).unwrap()
}

fn session() -> Session {
    Session::new(TOKEN)
}

fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn list_sends_scope_filters_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-tasks"))
        .and(query_param("workspaceId", "ws-1"))
        .and(query_param("projectId", "proj-1"))
        .and(query_param("status", "in_review"))
        .and(query_param("sortBy", "dueDate"))
        .and(query_param("sortOrder", "desc"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ok(json!([
            task_json("t-1", "in_review", 0.0),
            task_json("t-2", "in_review", 1000.0)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = TaskQuery::project("ws-1", "proj-1").with_filters(TaskFilters {
        status: Some(TaskStatus::InReview),
        sort_by: Some(SortField::DueDate),
        sort_order: Some(SortOrder::Desc),
        ..TaskFilters::default()
    });
    let tasks = client(&server).list_tasks(&session(), &query).await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1].id, TaskId::new("t-2"));
    assert_eq!(tasks[1].position, 1000.0);
    assert_eq!(tasks[0].assignee.account.display_name(), "Kim Lee");
}

#[tokio::test]
async fn get_task_addresses_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-task/t-9"))
        .respond_with(ok(task_json("t-9", "done", 3000.0)))
        .expect(1)
        .mount(&server)
        .await;

    let task = client(&server)
        .get_task(&session(), &TaskId::new("t-9"))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Done);
}

#[tokio::test]
async fn missing_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .list_tasks(&Session::new("  "), &TaskQuery::workspace("ws-1"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn body_without_result_is_a_codec_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tasks": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_tasks(&session(), &TaskQuery::workspace("ws-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Codec(_)));
}

#[tokio::test]
async fn get_workspace_decodes_projects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-workspace/ws-1"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ok(json!({
            "_id": "ws-1",
            "name": "Team",
            "projects": [
                { "_id": "proj-1", "name": "Roadmap", "color": "#3366ff" },
                { "_id": "proj-2", "name": "Support" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-workspace/ws-gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client(&server);
    let workspace = api.get_workspace(&session(), "ws-1").await.unwrap();
    assert_eq!(workspace.name, "Team");
    let names: Vec<&str> = workspace.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Roadmap", "Support"]);

    let err = api.get_workspace(&session(), "ws-gone").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn update_puts_reposition_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/update-task/t-1"))
        .and(header("authorization", bearer().as_str()))
        .and(body_json(json!({
            "name": "Task t-1",
            "status": "done",
            "position": 2000.0,
            "assigneeId": "member-1",
            "projectId": "proj-1"
        })))
        .respond_with(ok(task_json("t-1", "done", 2000.0)))
        .expect(1)
        .mount(&server)
        .await;

    let current: taskboard_proto::task::Task =
        serde_json::from_value(task_json("t-1", "todo", 0.0)).unwrap();
    let request = UpdateTaskRequest::reposition(&current, TaskStatus::Done, 2000.0);
    let updated = client(&server)
        .update_task(&session(), &current.id, &request)
        .await
        .unwrap();
    assert_eq!(updated.position, 2000.0);
}

#[tokio::test]
async fn create_validates_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(task_json("t-new", "todo", 0.0)))
        .expect(0)
        .mount(&server)
        .await;

    let request = CreateTaskRequest::new(" ", "ws-1", "proj-1", "member-1");
    let err = client(&server)
        .create_task(&session(), &request)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn create_posts_the_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create-task"))
        .respond_with(ok(task_json("t-new", "in_progress", 0.0)))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = CreateTaskRequest::new("Write docs", "ws-1", "proj-1", "member-1");
    request.status = TaskStatus::InProgress;
    let created = client(&server)
        .create_task(&session(), &request)
        .await
        .unwrap();
    assert_eq!(created.id, TaskId::new("t-new"));
}

#[tokio::test]
async fn delete_accepts_empty_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/delete-task/t-3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_task(&session(), &TaskId::new("t-3"))
        .await
        .unwrap();
}

// =============================================================================
// Error statuses
// =============================================================================

#[tokio::test]
async fn error_statuses_map_onto_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-task/expired"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-task/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-task/boom"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "database unavailable" })),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    let get = |id: &'static str| {
        let api = api.clone();
        async move { api.get_task(&session(), &TaskId::new(id)).await.unwrap_err() }
    };

    assert!(matches!(get("expired").await, ApiError::Unauthorized(m) if m == "Unauthorized"));
    assert!(matches!(get("gone").await, ApiError::NotFound(_)));
    assert!(matches!(
        get("boom").await,
        ApiError::Server { status: 500, message } if message == "database unavailable"
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let api = HttpTaskApi::new(&HttpConfig::new("http://127.0.0.1:9")).unwrap();
    let err = api
        .list_tasks(&session(), &TaskQuery::workspace("ws-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn kanban_drag_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-tasks"))
        .respond_with(ok(json!([
            task_json("t-1", "todo", 0.0),
            task_json("t-2", "todo", 1000.0),
            task_json("t-3", "done", 0.0)
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/update-task/t-2"))
        .and(body_json(json!({
            "name": "Task t-2",
            "status": "done",
            "position": 1000.0,
            "assigneeId": "member-1",
            "projectId": "proj-1"
        })))
        .respond_with(ok(task_json("t-2", "done", 1000.0)))
        .expect(1)
        .mount(&server)
        .await;

    let (sync, _events) = SyncAdapter::new(client(&server), Arc::new(QueryCache::new()), 8);
    let mut view = KanbanBoard::new(Arc::new(sync), TaskQuery::project("ws-1", "proj-1"));
    view.load(&session()).await.unwrap();

    let outcome = view
        .on_drag_end(
            &session(),
            DragResult::new(
                DropLocation::new(TaskStatus::Todo, 1),
                DropLocation::new(TaskStatus::Done, 1),
            ),
        )
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.persisted[0].status, TaskStatus::Done);
    assert_eq!(view.board().bucket(TaskStatus::Done).count(), 2);
    assert_eq!(view.board().bucket(TaskStatus::Todo).count(), 1);
}
