//! Service layer for creating, loading, and deleting boards, columns, and
//! tasks.
//!
//! Inserts append at the next free position and deletes close the gap they
//! leave, each inside one repository transaction, so every scope stays dense.

use crate::board::{
    domain::{
        Board, BoardDomainError, BoardId, BoardSnapshot, BoardSummary, Column, ColumnId, NewTask,
        OrderingError, Position, Priority, Task, TaskId,
        ordering::{check_density, next_position, plan_removal},
    },
    ports::{BoardRepository, BoardRepositoryError},
};
use super::locking::{lock_task_parent, lock_task_scopes};
use crate::config::KanbanConfig;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Request payload for adding a task to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    column_id: ColumnId,
    title: String,
    description: Option<String>,
    priority: Priority,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(column_id: ColumnId, title: impl Into<String>) -> Self {
        Self {
            column_id,
            title: title.into(),
            description: None,
            priority: Priority::default(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the task priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Service-level errors for board lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum BoardServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// Position planning failed.
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
}

impl BoardServiceError {
    /// Returns `true` when the error reports a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_not_found(),
            Self::Ordering(OrderingError::ItemNotFound { .. }) => true,
            Self::Domain(_) | Self::Ordering(_) => false,
        }
    }
}

/// Result type for board lifecycle operations.
pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// Board lifecycle orchestration service.
#[derive(Clone)]
pub struct BoardService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: Arc<KanbanConfig>,
}

impl<R, C> BoardService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new board service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>, config: Arc<KanbanConfig>) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    /// Creates a board seeded with the configured default columns.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when the title or a default
    /// column title is blank, or [`BoardServiceError::Repository`] when
    /// persistence fails.
    pub async fn create_board(&self, title: impl Into<String>) -> BoardServiceResult<BoardSnapshot> {
        let board = Board::new(title, &*self.clock)?;
        let columns = self
            .config
            .default_columns()
            .iter()
            .enumerate()
            .map(|(index, column_title)| {
                let position = Position::from_index(index).ok_or(OrderingError::ScopeOverflow)?;
                Ok(Column::new(board.id(), column_title.as_str(), position)?)
            })
            .collect::<BoardServiceResult<Vec<_>>>()?;

        self.repository.store_board(&board, &columns).await?;
        info!(board_id = %board.id(), columns = columns.len(), "board created");
        Ok(BoardSnapshot::assemble(board, columns, Vec::new()))
    }

    /// Loads a board with its columns and tasks in display order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::BoardNotFound`] wrapped in
    /// [`BoardServiceError::Repository`] when the board does not exist.
    pub async fn load_board(&self, board_id: BoardId) -> BoardServiceResult<BoardSnapshot> {
        self.repository
            .find_board(board_id)
            .await?
            .ok_or(BoardServiceError::Repository(
                BoardRepositoryError::BoardNotFound(board_id),
            ))
    }

    /// Lists boards, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Repository`] when persistence fails.
    pub async fn list_boards(&self) -> BoardServiceResult<Vec<BoardSummary>> {
        Ok(self.repository.list_boards().await?)
    }

    /// Deletes a board together with its columns and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Repository`] when the board does not
    /// exist or persistence fails.
    pub async fn delete_board(&self, board_id: BoardId) -> BoardServiceResult<()> {
        self.repository.delete_board(board_id).await?;
        info!(board_id = %board_id, "board deleted");
        Ok(())
    }

    /// Appends a column to the end of a board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] for a blank title and
    /// [`BoardServiceError::Repository`] when the board does not exist or
    /// persistence fails.
    #[instrument(skip(self, title), fields(board_id = %board_id))]
    pub async fn add_column(
        &self,
        board_id: BoardId,
        title: impl Into<String> + Send,
    ) -> BoardServiceResult<Column> {
        let mut column = Column::new(board_id, title, Position::FIRST)?;
        let timestamp = self.clock.utc();
        let created = self
            .repository
            .transaction(move |tx| -> BoardServiceResult<Column> {
                tx.lock_board(board_id)?;
                column.reposition(next_position(&tx.column_siblings(board_id)?)?);
                tx.insert_column(&column)?;
                tx.touch_board(board_id, timestamp)?;
                Ok(column)
            })
            .await?;
        info!(column_id = %created.id(), position = %created.position(), "column added");
        Ok(created)
    }

    /// Deletes a column and its tasks, shifting later columns down by one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Repository`] when the column does not
    /// exist or persistence fails.
    #[instrument(skip(self), fields(column_id = %column_id))]
    pub async fn delete_column(&self, column_id: ColumnId) -> BoardServiceResult<()> {
        let timestamp = self.clock.utc();
        self.repository
            .transaction(move |tx| -> BoardServiceResult<()> {
                let board_id = tx
                    .find_column(column_id)?
                    .ok_or(BoardRepositoryError::ColumnNotFound(column_id))?
                    .board_id();
                tx.lock_board(board_id)?;
                if tx.find_column(column_id)?.is_none() {
                    return Err(BoardRepositoryError::ColumnNotFound(column_id).into());
                }
                let updates = plan_removal(&tx.column_siblings(board_id)?, column_id)?;
                tx.delete_column(column_id)?;
                tx.update_column_orders(board_id, &updates)?;
                check_density(&tx.column_siblings(board_id)?)?;
                tx.touch_board(board_id, timestamp)?;
                Ok(())
            })
            .await?;
        info!("column deleted");
        Ok(())
    }

    /// Appends a task to the end of a column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] for a blank title and
    /// [`BoardServiceError::Repository`] when the column does not exist or
    /// persistence fails.
    pub async fn add_task(&self, request: CreateTaskRequest) -> BoardServiceResult<Task> {
        let column_id = request.column_id;
        let mut task = Task::new(
            NewTask {
                column_id,
                title: request.title,
                description: request.description,
                priority: request.priority,
            },
            Position::FIRST,
            &*self.clock,
        )?;
        let timestamp = task.created_at();
        let created = self
            .repository
            .transaction(move |tx| -> BoardServiceResult<Task> {
                let locked = lock_task_scopes(tx, &[column_id])?;
                task.reposition(next_position(&tx.task_siblings(column_id)?)?);
                tx.insert_task(&task)?;
                for column in &locked {
                    tx.touch_board(column.board_id(), timestamp)?;
                }
                Ok(task)
            })
            .await?;
        info!(
            task_id = %created.id(),
            column_id = %column_id,
            position = %created.position(),
            "task added"
        );
        Ok(created)
    }

    /// Deletes a task, shifting later tasks in its column down by one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Repository`] when the task does not
    /// exist or persistence fails.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn delete_task(&self, task_id: TaskId) -> BoardServiceResult<()> {
        let timestamp = self.clock.utc();
        self.repository
            .transaction(move |tx| -> BoardServiceResult<()> {
                let column = lock_task_parent(tx, task_id)?;
                let column_id = column.id();
                let updates = plan_removal(&tx.task_siblings(column_id)?, task_id)?;
                tx.delete_task(task_id)?;
                tx.update_task_orders(column_id, &updates)?;
                check_density(&tx.task_siblings(column_id)?)?;
                tx.touch_board(column.board_id(), timestamp)?;
                Ok(())
            })
            .await?;
        info!("task deleted");
        Ok(())
    }
}
