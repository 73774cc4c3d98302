//! Shared test helpers for `PostgreSQL` integration tests.
//!
//! Tests run only when `KANBAN_TEST_DATABASE_URL` names a reachable
//! database; otherwise the fixture yields `None` and each test returns
//! early. The schema is applied once per test binary when missing. Every
//! test works on boards it creates, so tests share the database safely.

use std::sync::{Arc, Mutex, PoisonError};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use kanban::board::{
    adapters::postgres::{BoardPgPool, PostgresBoardRepository},
    domain::{BoardSnapshot, Position},
    services::{BoardService, BoardServiceError, CreateTaskRequest, ReorderService},
};
use kanban::config::KanbanConfig;
use mockable::DefaultClock;
use rstest::fixture;

/// Boxed error type for test setup failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Variable naming the database used by these tests.
pub const TEST_DATABASE_URL_VAR: &str = "KANBAN_TEST_DATABASE_URL";

/// SQL to create the kanban schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_kanban_tables/up.sql");

static SCHEMA_READY: Mutex<bool> = Mutex::new(false);

#[derive(diesel::QueryableByName)]
struct SchemaPresence {
    #[diesel(sql_type = diesel::sql_types::Bool)]
    present: bool,
}

/// Applies the schema unless the `boards` table already exists.
///
/// # Errors
///
/// Returns an error if the connection or migration fails.
fn ensure_schema(url: &str) -> Result<(), BoxError> {
    let mut ready = SCHEMA_READY.lock().unwrap_or_else(PoisonError::into_inner);
    if *ready {
        return Ok(());
    }
    let mut conn = PgConnection::establish(url)?;
    let presence: SchemaPresence =
        diesel::sql_query("SELECT to_regclass('public.boards') IS NOT NULL AS present")
            .get_result(&mut conn)?;
    if !presence.present {
        conn.batch_execute(CREATE_SCHEMA_SQL)?;
    }
    *ready = true;
    Ok(())
}

/// Board service over the `PostgreSQL` repository.
pub type PgBoards = BoardService<PostgresBoardRepository, DefaultClock>;
/// Reorder service over the `PostgreSQL` repository.
pub type PgReorder = ReorderService<PostgresBoardRepository, DefaultClock>;

/// Services sharing one connection pool.
pub struct PgBackend {
    /// Repository shared by both services.
    pub repository: Arc<PostgresBoardRepository>,
    /// Lifecycle service.
    pub boards: Arc<PgBoards>,
    /// Reorder service.
    pub reorder: Arc<PgReorder>,
}

impl PgBackend {
    /// Creates a board and fills its default columns with the given titles.
    ///
    /// # Errors
    ///
    /// Returns an error if board or task creation fails.
    pub async fn seed(
        &self,
        tasks_per_column: &[&[&str]],
    ) -> Result<BoardSnapshot, BoardServiceError> {
        let board = self.boards.create_board("Release").await?;
        for (column, titles) in board.columns.iter().zip(tasks_per_column) {
            for title in *titles {
                self.boards
                    .add_task(CreateTaskRequest::new(column.column.id(), *title))
                    .await?;
            }
        }
        self.boards.load_board(board.board.id()).await
    }
}

/// Provides services over the test database, or `None` when no database is
/// configured.
///
/// # Errors
///
/// Returns an error if the schema or pool cannot be prepared.
#[fixture]
pub fn pg_backend() -> Result<Option<PgBackend>, BoxError> {
    let Ok(url) = std::env::var(TEST_DATABASE_URL_VAR) else {
        return Ok(None);
    };
    ensure_schema(&url)?;
    let pool: BoardPgPool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    let repository = Arc::new(PostgresBoardRepository::new(pool));
    let clock = Arc::new(DefaultClock);
    Ok(Some(PgBackend {
        boards: Arc::new(BoardService::new(
            Arc::clone(&repository),
            Arc::clone(&clock),
            Arc::new(KanbanConfig::default()),
        )),
        reorder: Arc::new(ReorderService::new(Arc::clone(&repository), clock)),
        repository,
    }))
}

/// Returns the task titles of column `column` in display order.
#[must_use]
pub fn task_titles(board: &BoardSnapshot, column: usize) -> Vec<String> {
    board
        .columns
        .get(column)
        .map(|snapshot| {
            snapshot
                .tasks
                .iter()
                .map(|task| task.title().to_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Checks that every scope of the board holds positions `0..count`.
///
/// # Errors
///
/// Returns an error naming the first scope that is not dense.
pub fn ensure_dense(board: &BoardSnapshot) -> Result<(), BoxError> {
    for (index, column) in board.columns.iter().enumerate() {
        if Position::from_index(index) != Some(column.column.position()) {
            return Err(format!("column {} is not at {index}", column.column.title()).into());
        }
        for (task_index, task) in column.tasks.iter().enumerate() {
            if Position::from_index(task_index) != Some(task.position()) {
                return Err(format!("task {} is not at {task_index}", task.title()).into());
            }
        }
    }
    Ok(())
}
