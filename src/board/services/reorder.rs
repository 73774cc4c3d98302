//! Transactional reordering of columns within a board and tasks within and
//! across columns.
//!
//! Each operation locks its scope, reads the sibling snapshot, plans the
//! renumbering, writes it, and re-checks density before commit. Any failure
//! aborts the transaction so storage never holds a partial renumbering.

use crate::board::{
    domain::{
        BoardId, Column, ColumnId, OrderingError, TaskId,
        ordering::{check_density, plan_move, plan_reorder},
    },
    ports::{BoardRepository, BoardRepositoryError, OrderingTransaction},
};
use super::locking::lock_task_scopes;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Validated reorder request, one variant per mutation the board accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReorderRequest {
    /// Move a column to a new index within its board.
    ColumnReorder {
        /// Board whose columns are reordered.
        board_id: BoardId,
        /// Column being moved.
        column_id: ColumnId,
        /// Zero-based destination index.
        target_index: usize,
    },
    /// Move a task to a new index within its column.
    TaskReorder {
        /// Column whose tasks are reordered.
        column_id: ColumnId,
        /// Task being moved.
        task_id: TaskId,
        /// Zero-based destination index.
        target_index: usize,
    },
    /// Move a task into another column, or within its own.
    TaskMove {
        /// Task being moved.
        task_id: TaskId,
        /// Column the task currently belongs to.
        source_column_id: ColumnId,
        /// Column receiving the task.
        destination_column_id: ColumnId,
        /// Zero-based destination index; the destination count appends.
        destination_index: usize,
    },
}

/// Result of a committed reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The item already sat at the requested index; nothing was written.
    Unchanged,
    /// Positions were rewritten.
    Applied {
        /// Number of rows whose position or parent changed.
        updated: usize,
    },
}

/// Failure class of a reorder, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderErrorKind {
    /// The scope or item does not exist, or the item is outside the scope.
    NotFound,
    /// The requested index is out of range. Nothing was written.
    InvalidIndex,
    /// The transaction failed and was rolled back.
    TransactionFailure,
}

/// Errors returned by reorder operations.
#[derive(Debug, Clone, Error)]
pub enum ReorderError {
    /// Planning or post-write verification failed.
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    /// Storage rejected or failed the operation.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
}

impl ReorderError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ReorderErrorKind {
        match self {
            Self::Ordering(OrderingError::ItemNotFound { .. }) => ReorderErrorKind::NotFound,
            Self::Ordering(OrderingError::InvalidIndex { .. }) => ReorderErrorKind::InvalidIndex,
            Self::Ordering(
                OrderingError::DensityViolation { .. } | OrderingError::ScopeOverflow,
            ) => ReorderErrorKind::TransactionFailure,
            Self::Repository(err) if err.is_not_found() => ReorderErrorKind::NotFound,
            Self::Repository(_) => ReorderErrorKind::TransactionFailure,
        }
    }
}

/// Result type for reorder operations.
pub type ReorderResult<T> = Result<T, ReorderError>;

/// Reorders columns and tasks while keeping every scope dense.
#[derive(Clone)]
pub struct ReorderService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ReorderService<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new reorder service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Executes a validated reorder request.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError`] from the operation the request selects.
    pub async fn handle(&self, request: ReorderRequest) -> ReorderResult<ReorderOutcome> {
        match request {
            ReorderRequest::ColumnReorder {
                board_id,
                column_id,
                target_index,
            } => self.reorder_columns(board_id, column_id, target_index).await,
            ReorderRequest::TaskReorder {
                column_id,
                task_id,
                target_index,
            } => self.reorder_tasks(column_id, task_id, target_index).await,
            ReorderRequest::TaskMove {
                task_id,
                source_column_id,
                destination_column_id,
                destination_index,
            } => {
                self.move_task(
                    task_id,
                    source_column_id,
                    destination_column_id,
                    destination_index,
                )
                .await
            }
        }
    }

    /// Moves `column_id` to `target_index` among the board's columns.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderErrorKind::NotFound`] when the board does not exist
    /// or the column is not on it, [`ReorderErrorKind::InvalidIndex`] when
    /// `target_index` is not below the column count, and
    /// [`ReorderErrorKind::TransactionFailure`] when storage fails.
    #[instrument(skip(self), fields(board_id = %board_id, column_id = %column_id))]
    pub async fn reorder_columns(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        target_index: usize,
    ) -> ReorderResult<ReorderOutcome> {
        let timestamp = self.clock.utc();
        let result = self
            .repository
            .transaction(move |tx| -> ReorderResult<ReorderOutcome> {
                tx.lock_board(board_id)?;
                let siblings = tx.column_siblings(board_id)?;
                let updates = plan_reorder(&siblings, column_id, target_index)?;
                if updates.is_empty() {
                    return Ok(ReorderOutcome::Unchanged);
                }

                tx.update_column_orders(board_id, &updates)?;
                check_density(&tx.column_siblings(board_id)?)?;
                tx.touch_board(board_id, timestamp)?;
                Ok(ReorderOutcome::Applied {
                    updated: updates.len(),
                })
            })
            .await;
        log_outcome("column_reorder", &result);
        result
    }

    /// Moves `task_id` to `target_index` among the column's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderErrorKind::NotFound`] when the column does not exist
    /// or the task is not in it, [`ReorderErrorKind::InvalidIndex`] when
    /// `target_index` is not below the task count, and
    /// [`ReorderErrorKind::TransactionFailure`] when storage fails.
    #[instrument(skip(self), fields(column_id = %column_id, task_id = %task_id))]
    pub async fn reorder_tasks(
        &self,
        column_id: ColumnId,
        task_id: TaskId,
        target_index: usize,
    ) -> ReorderResult<ReorderOutcome> {
        let timestamp = self.clock.utc();
        let result = self
            .repository
            .transaction(move |tx| -> ReorderResult<ReorderOutcome> {
                let locked = lock_task_scopes(tx, &[column_id])?;
                let siblings = tx.task_siblings(column_id)?;
                let updates = plan_reorder(&siblings, task_id, target_index)?;
                if updates.is_empty() {
                    return Ok(ReorderOutcome::Unchanged);
                }

                tx.update_task_orders(column_id, &updates)?;
                check_density(&tx.task_siblings(column_id)?)?;
                touch_owning_boards(tx, &locked, timestamp)?;
                Ok(ReorderOutcome::Applied {
                    updated: updates.len(),
                })
            })
            .await;
        log_outcome("task_reorder", &result);
        result
    }

    /// Moves `task_id` out of `source_column_id` and into
    /// `destination_column_id` at `destination_index`.
    ///
    /// When both columns are the same this is a reorder within the column.
    ///
    /// # Errors
    ///
    /// Returns [`ReorderErrorKind::NotFound`] when either column does not
    /// exist or the task is not in the source column,
    /// [`ReorderErrorKind::InvalidIndex`] when `destination_index` exceeds
    /// the destination count, and [`ReorderErrorKind::TransactionFailure`]
    /// when storage fails.
    pub async fn move_task(
        &self,
        task_id: TaskId,
        source_column_id: ColumnId,
        destination_column_id: ColumnId,
        destination_index: usize,
    ) -> ReorderResult<ReorderOutcome> {
        if source_column_id == destination_column_id {
            return self
                .reorder_tasks(source_column_id, task_id, destination_index)
                .await;
        }
        self.move_across_columns(
            task_id,
            source_column_id,
            destination_column_id,
            destination_index,
        )
        .await
    }

    #[instrument(
        skip(self),
        fields(task_id = %task_id, source = %source, destination = %destination)
    )]
    async fn move_across_columns(
        &self,
        task_id: TaskId,
        source: ColumnId,
        destination: ColumnId,
        destination_index: usize,
    ) -> ReorderResult<ReorderOutcome> {
        let timestamp = self.clock.utc();
        let result = self
            .repository
            .transaction(move |tx| -> ReorderResult<ReorderOutcome> {
                let locked = lock_task_scopes(tx, &[source, destination])?;
                let source_siblings = tx.task_siblings(source)?;
                let destination_siblings = tx.task_siblings(destination)?;
                let plan = plan_move(
                    &source_siblings,
                    &destination_siblings,
                    task_id,
                    destination_index,
                )?;

                tx.update_task_orders(source, &plan.source_updates)?;
                tx.move_task(task_id, destination, plan.position, timestamp)?;
                tx.update_task_orders(destination, &plan.destination_updates)?;

                check_density(&tx.task_siblings(source)?)?;
                check_density(&tx.task_siblings(destination)?)?;
                touch_owning_boards(tx, &locked, timestamp)?;
                Ok(ReorderOutcome::Applied {
                    updated: plan.write_count(),
                })
            })
            .await;
        log_outcome("task_move", &result);
        result
    }
}

/// Touches each distinct board owning one of `columns`.
fn touch_owning_boards(
    tx: &mut dyn OrderingTransaction,
    columns: &[Column],
    timestamp: DateTime<Utc>,
) -> Result<(), BoardRepositoryError> {
    let mut touched: Vec<BoardId> = Vec::with_capacity(columns.len());
    for board_id in columns.iter().map(Column::board_id) {
        if !touched.contains(&board_id) {
            tx.touch_board(board_id, timestamp)?;
            touched.push(board_id);
        }
    }
    Ok(())
}

fn log_outcome(operation: &'static str, result: &ReorderResult<ReorderOutcome>) {
    match result {
        Ok(ReorderOutcome::Unchanged) => debug!(operation, "position unchanged, nothing written"),
        Ok(ReorderOutcome::Applied { updated }) => {
            info!(operation, updated, "reorder committed");
        }
        Err(err) if err.kind() == ReorderErrorKind::TransactionFailure => {
            error!(operation, error = %err, "reorder transaction rolled back");
        }
        Err(err) => warn!(operation, error = %err, "reorder rejected"),
    }
}
