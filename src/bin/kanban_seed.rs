//! Replaces the contents of the configured `PostgreSQL` database with one
//! sample board.
//!
//! Usage:
//!
//! ```text
//! KANBAN_DATABASE_URL=postgres://localhost/kanban kanban_seed
//! ```
//!
//! The schema in `migrations/` must already be applied. Every existing board
//! is deleted first. The sample board receives the configured default
//! columns and four tasks spread across the first three of them. Log
//! verbosity follows `RUST_LOG` and defaults to `info`.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use kanban::board::adapters::postgres::{BoardPgPool, PostgresBoardRepository};
use kanban::board::domain::Priority;
use kanban::board::services::{BoardService, BoardServiceError, CreateTaskRequest};
use kanban::config::{ConfigError, DATABASE_URL_VAR, KanbanConfig};
use mockable::DefaultClock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Errors that abort seeding.
#[derive(Debug, Error)]
enum SeedError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{DATABASE_URL_VAR} must be set")]
    MissingDatabaseUrl,
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Service(#[from] BoardServiceError),
}

/// Sample tasks as `(column index, title, description, priority)`.
const SAMPLE_TASKS: [(usize, &str, &str, Priority); 4] = [
    (
        0,
        "Implement authentication",
        "Add sign-in with an external identity provider",
        Priority::High,
    ),
    (0, "Polish the UI", "Add light and dark themes", Priority::Medium),
    (
        1,
        "Drag and drop",
        "Let users drag tasks between columns",
        Priority::High,
    ),
    (
        2,
        "Initial setup",
        "Scaffold the project and tooling",
        Priority::Low,
    ),
];

#[tokio::main]
async fn main() -> Result<(), SeedError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = KanbanConfig::from_env()?;
    let url = config
        .database_url()
        .ok_or(SeedError::MissingDatabaseUrl)?
        .to_owned();
    let pool: BoardPgPool = Pool::builder()
        .max_size(config.pool_size())
        .build(ConnectionManager::<PgConnection>::new(url))?;
    let service = BoardService::new(
        Arc::new(PostgresBoardRepository::new(pool)),
        Arc::new(DefaultClock),
        Arc::new(config),
    );

    for summary in service.list_boards().await? {
        service.delete_board(summary.board.id()).await?;
    }

    let board = service.create_board("My First Board").await?;
    for (column_index, title, description, priority) in SAMPLE_TASKS {
        let Some(column) = board.columns.get(column_index) else {
            warn!(title, column_index, "no column for sample task, skipping");
            continue;
        };
        service
            .add_task(
                CreateTaskRequest::new(column.column.id(), title)
                    .with_description(description)
                    .with_priority(priority),
            )
            .await?;
    }

    info!(board_id = %board.board.id(), title = board.board.title(), "sample board seeded");
    Ok(())
}
