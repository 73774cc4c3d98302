//! Repository port for board persistence and transactional sibling ordering.

use crate::board::domain::{
    Board, BoardId, BoardSnapshot, BoardSummary, Column, ColumnId, OrderUpdate, Position, Sibling,
    Task, TaskId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Board persistence contract.
///
/// Reads that do not feed a write are exposed directly. Everything that
/// changes sibling positions runs through [`BoardRepository::transaction`],
/// which gives the work closure an [`OrderingTransaction`] and commits only
/// when the closure returns `Ok`.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new board together with its initial columns.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateBoard`] when the board ID
    /// already exists.
    async fn store_board(&self, board: &Board, columns: &[Column]) -> BoardRepositoryResult<()>;

    /// Loads a board with its columns and tasks in display order.
    ///
    /// Returns `None` when the board does not exist.
    async fn find_board(&self, id: BoardId) -> BoardRepositoryResult<Option<BoardSnapshot>>;

    /// Lists boards, most recently updated first.
    async fn list_boards(&self) -> BoardRepositoryResult<Vec<BoardSummary>>;

    /// Deletes a board and, by cascade, its columns and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::BoardNotFound`] when the board does
    /// not exist.
    async fn delete_board(&self, id: BoardId) -> BoardRepositoryResult<()>;

    /// Runs `work` inside a single storage transaction.
    ///
    /// All writes issued through the transaction become visible together
    /// when `work` returns `Ok`; none of them persist when it returns `Err`.
    /// Transactions that touch the same scope are serialized.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a persistence failure
    /// converted into `E` when the transaction cannot begin or commit.
    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn OrderingTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardRepositoryError> + Send + 'static;
}

/// Operations available inside a board repository transaction.
///
/// Lock methods must be called before reading a scope's siblings so that
/// concurrent transactions over the same scope observe each other's
/// committed results. Board locks are always taken before column locks.
pub trait OrderingTransaction {
    /// Locks the board's column scope and returns the board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::BoardNotFound`] when the board does
    /// not exist.
    fn lock_board(&mut self, board_id: BoardId) -> BoardRepositoryResult<Board>;

    /// Locks the task scopes of the given columns and returns them in the
    /// order requested.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::ColumnNotFound`] for the first column
    /// that does not exist.
    fn lock_columns(&mut self, column_ids: &[ColumnId]) -> BoardRepositoryResult<Vec<Column>>;

    /// Finds a column without locking its scope.
    fn find_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Option<Column>>;

    /// Finds a task without locking its scope.
    fn find_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<Option<Task>>;

    /// Returns the column positions of a board in display order.
    fn column_siblings(&mut self, board_id: BoardId) -> BoardRepositoryResult<Vec<Sibling<ColumnId>>>;

    /// Returns the task positions of a column in display order.
    fn task_siblings(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Vec<Sibling<TaskId>>>;

    /// Writes new column positions within a board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::ColumnNotFound`] when an update
    /// names a column outside the board.
    fn update_column_orders(
        &mut self,
        board_id: BoardId,
        updates: &[OrderUpdate<ColumnId>],
    ) -> BoardRepositoryResult<()>;

    /// Writes new task positions within a column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::TaskNotFound`] when an update names a
    /// task outside the column.
    fn update_task_orders(
        &mut self,
        column_id: ColumnId,
        updates: &[OrderUpdate<TaskId>],
    ) -> BoardRepositoryResult<()>;

    /// Reassigns a task to `column_id` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    fn move_task(
        &mut self,
        task_id: TaskId,
        column_id: ColumnId,
        position: Position,
        timestamp: DateTime<Utc>,
    ) -> BoardRepositoryResult<()>;

    /// Inserts a new column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateColumn`] when the column ID
    /// already exists.
    fn insert_column(&mut self, column: &Column) -> BoardRepositoryResult<()>;

    /// Inserts a new task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    fn insert_task(&mut self, task: &Task) -> BoardRepositoryResult<()>;

    /// Deletes a column and its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::ColumnNotFound`] when the column does
    /// not exist.
    fn delete_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<()>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    fn delete_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<()>;

    /// Records a modification of the board at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::BoardNotFound`] when the board does
    /// not exist.
    fn touch_board(&mut self, board_id: BoardId, timestamp: DateTime<Utc>)
    -> BoardRepositoryResult<()>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// The board was not found.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The column was not found, or is not part of the expected board.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The task was not found, or is not part of the expected column.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A board with the same identifier already exists.
    #[error("duplicate board identifier: {0}")]
    DuplicateBoard(BoardId),

    /// A column with the same identifier already exists.
    #[error("duplicate column identifier: {0}")]
    DuplicateColumn(ColumnId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when the error reports a missing board, column, or
    /// task.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BoardNotFound(_) | Self::ColumnNotFound(_) | Self::TaskNotFound(_)
        )
    }
}
