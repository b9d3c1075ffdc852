//! `taskboard`: kanban and list views over a remote task API.
//!
//! Prints the board, list, table, or calendar view of a project's tasks,
//! applies moves (drag to column, move up/down, mark done) through the sync
//! adapter, and creates, edits, or deletes tasks. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Offline demo data
//! cargo run --bin taskboard -- board
//!
//! # Against a server
//! cargo run --bin taskboard -- --api-url https://tasks.example.com \
//!     --token "$TOKEN" --workspace w-1 --project p-1 move t-42 --to done
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::api::http::HttpTaskApi;
use taskboard::api::memory::{DEMO_PROJECT_ID, DEMO_WORKSPACE_ID, InMemoryTaskApi};
use taskboard::api::{ApiError, TaskApi, WorkspaceApi};
use taskboard::board::{Board, DragResult, DropLocation, ReorderError, TaskList};
use taskboard::cache::{CacheKey, QueryCache};
use taskboard::config::{CliArgs, ClientConfig, Command};
use taskboard::session::Session;
use taskboard::store::{Modal, StoreError, UiStore, ViewTab};
use taskboard::sync::{MoveOutcome, SyncAdapter, SyncError, SyncEvent};
use taskboard::view::{CalendarView, KanbanBoard, Rendering, TableView, TaskListView};
use taskboard_proto::query::TaskQuery;
use taskboard_proto::request::UpdateTaskRequest;
use taskboard_proto::task::{Task, TaskId};

/// Errors that end the program.
#[derive(Debug, thiserror::Error)]
enum AppError {
    /// A server is configured but no workspace to show.
    #[error("no workspace configured (use --workspace or [scope] workspace_id)")]
    MissingScope,

    /// New tasks need a project.
    #[error("no project configured (use --project or [scope] project_id)")]
    MissingProject,

    /// Talking to the task API failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A view operation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The requested move does not fit the board.
    #[error(transparent)]
    Reorder(#[from] ReorderError),

    /// The UI state file is unusable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; stdout is reserved for views.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("taskboard starting");

    let result = match config.to_http_config() {
        Some(http) => match (HttpTaskApi::new(&http), config.scope()) {
            (Ok(api), Some(scope)) => run(api, config.to_session(), scope, &config, &cli).await,
            (Err(e), _) => Err(e.into()),
            (_, None) => Err(AppError::MissingScope),
        },
        None => {
            println!("(offline demo data: set --api-url to use a server)");
            let scope = config
                .scope()
                .unwrap_or_else(|| TaskQuery::project(DEMO_WORKSPACE_ID, DEMO_PROJECT_ID));
            run(InMemoryTaskApi::demo(), Session::new("demo"), scope, &config, &cli).await
        }
    };

    tracing::info!("taskboard exiting");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Executes one command against the given API.
async fn run<A: TaskApi + WorkspaceApi>(
    api: A,
    session: Session,
    scope: TaskQuery,
    config: &ClientConfig,
    cli: &CliArgs,
) -> Result<(), AppError> {
    let query = scope.with_filters(cli.filters.to_filters());
    let cache = Arc::new(QueryCache::new());
    let (sync, mut events) = SyncAdapter::new(api, cache, config.event_buffer);
    let sync = Arc::new(sync);

    let mut store = UiStore::load(config.state_file_path()).unwrap_or_else(|e| {
        tracing::warn!("ignoring ui state: {e}");
        UiStore::new()
    });

    match &cli.command {
        None => show(&sync, &session, &query, store.active_tab()).await?,
        Some(command) => {
            if let Some(tab) = command.tab() {
                if let Err(e) = store.set_active_tab(tab) {
                    eprintln!("Warning: could not remember view: {e}");
                }
                show(&sync, &session, &query, tab).await?;
            } else if let Command::Projects = command {
                print_projects(sync.api(), &session, &query).await?;
            } else if matches!(
                command,
                Command::Add { .. } | Command::Edit { .. } | Command::Delete { .. }
            ) {
                manage(command, &sync, &session, &query, &mut store).await?;
                show(&sync, &session, &query, store.active_tab()).await?;
            } else {
                apply(command, &sync, &session, &query).await?;
            }
        }
    }

    drain_sync_events(&mut events);
    Ok(())
}

/// Renders the collection the way `tab` shows it.
async fn show<A: TaskApi>(
    sync: &SyncAdapter<A>,
    session: &Session,
    query: &TaskQuery,
    tab: ViewTab,
) -> Result<(), AppError> {
    let tasks = sync
        .fetch(session, &CacheKey::new(query.clone(), tab))
        .await?;
    match Rendering::for_tab(tab, &tasks) {
        Rendering::List(list) => print_list(&list),
        Rendering::Kanban(board) => print_board(&board),
        Rendering::Table(table) => print_table(&table),
        Rendering::Calendar(calendar) => print_calendar(&calendar),
    }
    Ok(())
}

/// Runs a mutating command and prints the resulting view.
async fn apply<A: TaskApi>(
    command: &Command,
    sync: &Arc<SyncAdapter<A>>,
    session: &Session,
    query: &TaskQuery,
) -> Result<(), AppError> {
    let Some(id) = command.task_id() else {
        return Ok(());
    };

    if let Command::Done { .. } = command {
        let mut view = TaskListView::new(Arc::clone(sync), query.clone());
        view.load(session).await?;
        let outcome = view.mark_done(session, &id).await?;
        report(outcome.as_ref(), "already done");
        print_list(view.list());
        return Ok(());
    }

    let mut view = KanbanBoard::new(Arc::clone(sync), query.clone());
    view.load(session).await?;
    let outcome = match command {
        Command::Move { to, index, .. } => {
            let source = view
                .board()
                .locate(&id)
                .ok_or_else(|| ReorderError::UnknownTask(id.clone()))?;
            let len = view.board().bucket(*to).count();
            let last = if source.status == *to { len.saturating_sub(1) } else { len };
            let destination = DropLocation::new(*to, index.unwrap_or(last));
            view.on_drag_end(session, DragResult::new(source, destination))
                .await?
        }
        Command::Up { .. } => view.move_up(session, &id).await?,
        Command::Down { .. } => view.move_down(session, &id).await?,
        _ => None,
    };
    report(outcome.as_ref(), "nothing to move");
    print_board(view.board());
    Ok(())
}

/// Runs a create, edit, or delete through the matching task dialog.
async fn manage<A: TaskApi>(
    command: &Command,
    sync: &SyncAdapter<A>,
    session: &Session,
    query: &TaskQuery,
    store: &mut UiStore,
) -> Result<(), AppError> {
    match command {
        Command::Add {
            name,
            assignee,
            column,
        } => {
            let project_id = query
                .project_id
                .as_deref()
                .ok_or(AppError::MissingProject)?;
            store.open_create_task(*column);
            let request =
                store.create_task_request(name, &query.workspace_id, project_id, assignee);
            store.close(Modal::CreateTask);
            let task = sync.create(session, &request).await?;
            println!("created {}", task_line(&task));
        }
        Command::Edit {
            task,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                println!("nothing to change");
                return Ok(());
            }
            store.open_update_task(TaskId::new(task.as_str()));
            let request = UpdateTaskRequest {
                name: name.clone(),
                description: description.clone(),
                ..UpdateTaskRequest::default()
            };
            let result = edit_open_task(sync, session, store, &request).await;
            store.close(Modal::UpdateTask);
            println!("updated {}", task_line(&result?));
        }
        Command::Delete { task } => {
            store.open_delete_task(TaskId::new(task.as_str()));
            let id = store.initial_values().task_id.clone();
            store.close(Modal::DeleteTask);
            if let Some(id) = id {
                sync.delete(session, &id).await?;
                println!("deleted {id}");
            }
        }
        _ => {}
    }
    Ok(())
}

/// Sends an edit for the task the update dialog was opened on.
async fn edit_open_task<A: TaskApi>(
    sync: &SyncAdapter<A>,
    session: &Session,
    store: &UiStore,
    request: &UpdateTaskRequest,
) -> Result<Task, AppError> {
    let Some(id) = store.initial_values().task_id.as_ref() else {
        return Err(ApiError::NotFound("no task selected".to_string()).into());
    };
    Ok(sync.update(session, id, request).await?)
}

/// Prints the workspace's projects, marking the one in scope.
async fn print_projects<A: WorkspaceApi>(
    api: &A,
    session: &Session,
    query: &TaskQuery,
) -> Result<(), AppError> {
    let workspace = api.get_workspace(session, &query.workspace_id).await?;
    println!("{} ({} projects)", workspace.name, workspace.projects.len());
    for project in &workspace.projects {
        let marker = if query.project_id.as_deref() == Some(project.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!("{marker} [{}] {}", project.id, project.name);
    }
    Ok(())
}

fn report(outcome: Option<&MoveOutcome>, noop: &str) {
    match outcome {
        None => println!("{noop}"),
        Some(outcome) if outcome.is_success() => {}
        Some(outcome) if outcome.reconciled.is_some() => {
            println!("update failed; showing the server's arrangement");
        }
        Some(_) => println!("update failed; the board may be out of date"),
    }
}

/// Prints pending sync notifications.
fn drain_sync_events(events: &mut mpsc::Receiver<SyncEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SyncEvent::Persisted {
                task_id,
                status,
                position,
                ..
            } => println!("saved {task_id}: {} at {position}", status.label()),
            SyncEvent::PersistFailed { message, .. }
            | SyncEvent::ReconcileFailed { message, .. } => eprintln!("{message}"),
            SyncEvent::Reconciled { count, .. } => {
                println!("reloaded {count} tasks from the server");
            }
        }
    }
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "[{}] {} ({}, {})",
        task.id,
        task.name,
        task.priority.label(),
        task.assignee.account.display_name()
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.date_naive()));
    }
    if let Some(media) = task.attachment() {
        line.push_str(&format!(" [{}: {}]", media.kind, media.url));
    }
    line
}

fn print_board(board: &Board) {
    for bucket in board.buckets() {
        println!("{} ({})", bucket.header(), bucket.count());
        for task in bucket.tasks() {
            println!("  {}", task_line(task));
        }
    }
}

fn print_list(list: &TaskList) {
    if list.is_empty() {
        println!("no tasks");
    }
    for (n, task) in list.tasks().iter().enumerate() {
        println!("{:>3}. {:<11} {}", n + 1, task.status.label(), task_line(task));
    }
}

fn print_table(table: &TableView) {
    println!(
        "{:<14} {:<28} {:<18} {:<18} {:<10} {:<11} {}",
        "ID", "NAME", "PROJECT", "ASSIGNEE", "DUE", "STATUS", "PRIORITY"
    );
    for row in &table.rows {
        println!(
            "{:<14} {:<28} {:<18} {:<18} {:<10} {:<11} {}",
            row.id, row.name, row.project, row.assignee, row.due_date, row.status, row.priority
        );
    }
}

fn print_calendar(calendar: &CalendarView) {
    for (day, tasks) in &calendar.days {
        println!("{day}");
        for task in tasks {
            println!("  {}", task_line(task));
        }
    }
    if !calendar.undated.is_empty() {
        println!("No due date");
        for task in &calendar.undated {
            println!("  {}", task_line(task));
        }
    }
}
