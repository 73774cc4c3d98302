//! Lock acquisition shared by the board services.
//!
//! Every transaction takes board locks before column locks, and
//! `lock_columns` orders its own locks by id. Column operations and task
//! operations on the same board therefore queue on the board row instead of
//! waiting on each other in opposite orders.

use crate::board::{
    domain::{BoardId, Column, ColumnId, TaskId},
    ports::{BoardRepositoryError, BoardRepositoryResult, OrderingTransaction},
};

/// Lookups of a task's column before giving up on a task that keeps moving.
const PARENT_LOCK_ATTEMPTS: usize = 2;

/// Locks the boards owning `column_ids`, then the columns themselves.
///
/// A column never changes board, so reading the owner before taking the
/// board lock is safe. Columns are returned in the order requested.
///
/// # Errors
///
/// Returns [`BoardRepositoryError::ColumnNotFound`] for the first column
/// that does not exist.
pub(crate) fn lock_task_scopes(
    tx: &mut dyn OrderingTransaction,
    column_ids: &[ColumnId],
) -> BoardRepositoryResult<Vec<Column>> {
    let mut boards: Vec<BoardId> = Vec::with_capacity(column_ids.len());
    for &column_id in column_ids {
        let column = tx
            .find_column(column_id)?
            .ok_or(BoardRepositoryError::ColumnNotFound(column_id))?;
        boards.push(column.board_id());
    }
    boards.sort_unstable();
    boards.dedup();
    for board_id in boards {
        tx.lock_board(board_id)?;
    }
    tx.lock_columns(column_ids)
}

/// Locks the scope of the column currently holding `task_id` and returns
/// that column.
///
/// The task's column is read before the lock is taken. When a concurrent
/// move relocated the task in between, the new column is locked instead.
///
/// # Errors
///
/// Returns [`BoardRepositoryError::TaskNotFound`] when the task does not
/// exist or is still moving after the last attempt.
pub(crate) fn lock_task_parent(
    tx: &mut dyn OrderingTransaction,
    task_id: TaskId,
) -> BoardRepositoryResult<Column> {
    let mut column_id = task_column(tx, task_id)?;
    for _ in 0..PARENT_LOCK_ATTEMPTS {
        let locked = lock_task_scopes(tx, &[column_id])?
            .into_iter()
            .next()
            .ok_or(BoardRepositoryError::ColumnNotFound(column_id))?;
        let current = task_column(tx, task_id)?;
        if current == column_id {
            return Ok(locked);
        }
        column_id = current;
    }
    Err(BoardRepositoryError::TaskNotFound(task_id))
}

fn task_column(
    tx: &mut dyn OrderingTransaction,
    task_id: TaskId,
) -> BoardRepositoryResult<ColumnId> {
    tx.find_task(task_id)?
        .map(|task| task.column_id())
        .ok_or(BoardRepositoryError::TaskNotFound(task_id))
}
