//! `PostgreSQL` repository implementation for board storage.
//!
//! Ordering transactions lock the parent scope rows with `SELECT ... FOR
//! UPDATE` before reading siblings: the board row for column ordering, and
//! the column rows (in identifier order) for task ordering. Unique position
//! constraints are deferred to commit, so renumbering may pass through
//! duplicate positions mid-transaction.

use super::{
    models::{BoardRow, ColumnRow, TaskRow, position_from_sql, position_to_sql},
    schema::{board_columns, boards, tasks},
};
use crate::board::{
    domain::{
        Board, BoardId, BoardSnapshot, BoardSummary, Column, ColumnId, OrderUpdate, Position,
        Sibling, Task, TaskId,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult, OrderingTransaction},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count, count_star};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed board repository.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    /// Runs `f` on a pooled connection inside a database transaction on the
    /// blocking thread pool.
    async fn run_in_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardRepositoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut pooled = pool
                .get()
                .map_err(|err| E::from(BoardRepositoryError::persistence(err)))?;
            let connection: &mut PgConnection = &mut pooled;
            connection
                .transaction::<T, TransactionFailure<E>, _>(|conn| {
                    f(conn).map_err(TransactionFailure::Work)
                })
                .map_err(|failure| match failure {
                    TransactionFailure::Work(err) => err,
                    TransactionFailure::Database(err) => {
                        E::from(BoardRepositoryError::persistence(err))
                    }
                })
        })
        .await
        .map_err(|err| E::from(BoardRepositoryError::persistence(err)))?
    }
}

/// Separates database failures raised by diesel from errors returned by the
/// transaction body.
enum TransactionFailure<E> {
    Database(DieselError),
    Work(E),
}

impl<E> From<DieselError> for TransactionFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

fn count_to_usize(value: i64) -> BoardRepositoryResult<usize> {
    usize::try_from(value).map_err(BoardRepositoryError::persistence)
}

#[async_trait]
impl BoardRepository for PostgresBoardRepository {
    async fn store_board(&self, board: &Board, columns: &[Column]) -> BoardRepositoryResult<()> {
        let board_id = board.id();
        let board_row = BoardRow::from_domain(board);
        let column_rows = columns
            .iter()
            .map(ColumnRow::from_domain)
            .collect::<BoardRepositoryResult<Vec<_>>>()?;

        self.run_in_transaction(move |connection| {
            diesel::insert_into(boards::table)
                .values(&board_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateBoard(board_id)
                    }
                    other => BoardRepositoryError::persistence(other),
                })?;
            for row in &column_rows {
                insert_column_row(connection, row)?;
            }
            Ok(())
        })
        .await
    }

    async fn find_board(&self, id: BoardId) -> BoardRepositoryResult<Option<BoardSnapshot>> {
        self.run_in_transaction(move |connection| load_snapshot(connection, id))
            .await
    }

    async fn list_boards(&self) -> BoardRepositoryResult<Vec<BoardSummary>> {
        self.run_in_transaction(|connection| {
            let board_rows = boards::table
                .order((boards::updated_at.desc(), boards::id.asc()))
                .select(BoardRow::as_select())
                .load::<BoardRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;

            let column_counts: HashMap<uuid::Uuid, i64> = board_columns::table
                .group_by(board_columns::board_id)
                .select((board_columns::board_id, count_star()))
                .load::<(uuid::Uuid, i64)>(connection)
                .map_err(BoardRepositoryError::persistence)?
                .into_iter()
                .collect();

            let task_counts: HashMap<uuid::Uuid, i64> = tasks::table
                .inner_join(board_columns::table)
                .group_by(board_columns::board_id)
                .select((board_columns::board_id, count(tasks::id)))
                .load::<(uuid::Uuid, i64)>(connection)
                .map_err(BoardRepositoryError::persistence)?
                .into_iter()
                .collect();

            board_rows
                .into_iter()
                .map(|row| {
                    let column_count =
                        count_to_usize(column_counts.get(&row.id).copied().unwrap_or(0))?;
                    let task_count = count_to_usize(task_counts.get(&row.id).copied().unwrap_or(0))?;
                    Ok(BoardSummary {
                        board: row.into_domain(),
                        column_count,
                        task_count,
                    })
                })
                .collect()
        })
        .await
    }

    async fn delete_board(&self, id: BoardId) -> BoardRepositoryResult<()> {
        self.run_in_transaction(move |connection| {
            let deleted = diesel::delete(boards::table.find(id.into_inner()))
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(BoardRepositoryError::BoardNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn OrderingTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardRepositoryError> + Send + 'static,
    {
        self.run_in_transaction(move |connection| {
            let mut transaction = PgOrderingTransaction { connection };
            work(&mut transaction)
        })
        .await
    }
}

fn load_snapshot(
    connection: &mut PgConnection,
    id: BoardId,
) -> BoardRepositoryResult<Option<BoardSnapshot>> {
    let Some(board_row) = boards::table
        .find(id.into_inner())
        .select(BoardRow::as_select())
        .first::<BoardRow>(connection)
        .optional()
        .map_err(BoardRepositoryError::persistence)?
    else {
        return Ok(None);
    };

    let columns = board_columns::table
        .filter(board_columns::board_id.eq(id.into_inner()))
        .select(ColumnRow::as_select())
        .load::<ColumnRow>(connection)
        .map_err(BoardRepositoryError::persistence)?
        .into_iter()
        .map(ColumnRow::into_domain)
        .collect::<BoardRepositoryResult<Vec<_>>>()?;

    let task_rows = tasks::table
        .inner_join(board_columns::table)
        .filter(board_columns::board_id.eq(id.into_inner()))
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)
        .map_err(BoardRepositoryError::persistence)?
        .into_iter()
        .map(TaskRow::into_domain)
        .collect::<BoardRepositoryResult<Vec<_>>>()?;

    Ok(Some(BoardSnapshot::assemble(
        board_row.into_domain(),
        columns,
        task_rows,
    )))
}

fn insert_column_row(connection: &mut PgConnection, row: &ColumnRow) -> BoardRepositoryResult<()> {
    diesel::insert_into(board_columns::table)
        .values(row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                BoardRepositoryError::DuplicateColumn(ColumnId::from_uuid(row.id))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                BoardRepositoryError::BoardNotFound(BoardId::from_uuid(row.board_id))
            }
            other => BoardRepositoryError::persistence(other),
        })?;
    Ok(())
}

/// Ordering transaction bound to one open database transaction.
struct PgOrderingTransaction<'c> {
    connection: &'c mut PgConnection,
}

impl OrderingTransaction for PgOrderingTransaction<'_> {
    fn lock_board(&mut self, board_id: BoardId) -> BoardRepositoryResult<Board> {
        boards::table
            .find(board_id.into_inner())
            .select(BoardRow::as_select())
            .for_update()
            .first::<BoardRow>(self.connection)
            .optional()
            .map_err(BoardRepositoryError::persistence)?
            .map(BoardRow::into_domain)
            .ok_or(BoardRepositoryError::BoardNotFound(board_id))
    }

    fn lock_columns(&mut self, column_ids: &[ColumnId]) -> BoardRepositoryResult<Vec<Column>> {
        let mut lock_order: Vec<uuid::Uuid> =
            column_ids.iter().map(|id| id.into_inner()).collect();
        lock_order.sort_unstable();
        lock_order.dedup();

        let locked = board_columns::table
            .filter(board_columns::id.eq_any(lock_order))
            .order(board_columns::id.asc())
            .select(ColumnRow::as_select())
            .for_update()
            .load::<ColumnRow>(self.connection)
            .map_err(BoardRepositoryError::persistence)?
            .into_iter()
            .map(ColumnRow::into_domain)
            .collect::<BoardRepositoryResult<Vec<_>>>()?;

        column_ids
            .iter()
            .map(|id| {
                locked
                    .iter()
                    .find(|column| column.id() == *id)
                    .cloned()
                    .ok_or(BoardRepositoryError::ColumnNotFound(*id))
            })
            .collect()
    }

    fn find_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Option<Column>> {
        board_columns::table
            .find(column_id.into_inner())
            .select(ColumnRow::as_select())
            .first::<ColumnRow>(self.connection)
            .optional()
            .map_err(BoardRepositoryError::persistence)?
            .map(ColumnRow::into_domain)
            .transpose()
    }

    fn find_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<Option<Task>> {
        tasks::table
            .find(task_id.into_inner())
            .select(TaskRow::as_select())
            .first::<TaskRow>(self.connection)
            .optional()
            .map_err(BoardRepositoryError::persistence)?
            .map(TaskRow::into_domain)
            .transpose()
    }

    fn column_siblings(&mut self, board_id: BoardId) -> BoardRepositoryResult<Vec<Sibling<ColumnId>>> {
        board_columns::table
            .filter(board_columns::board_id.eq(board_id.into_inner()))
            .order((board_columns::position.asc(), board_columns::id.asc()))
            .select((board_columns::id, board_columns::position))
            .load::<(uuid::Uuid, i32)>(self.connection)
            .map_err(BoardRepositoryError::persistence)?
            .into_iter()
            .map(|(id, position)| {
                Ok(Sibling::new(
                    ColumnId::from_uuid(id),
                    position_from_sql(position)?,
                ))
            })
            .collect()
    }

    fn task_siblings(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Vec<Sibling<TaskId>>> {
        tasks::table
            .filter(tasks::column_id.eq(column_id.into_inner()))
            .order((tasks::position.asc(), tasks::id.asc()))
            .select((tasks::id, tasks::position))
            .load::<(uuid::Uuid, i32)>(self.connection)
            .map_err(BoardRepositoryError::persistence)?
            .into_iter()
            .map(|(id, position)| Ok(Sibling::new(TaskId::from_uuid(id), position_from_sql(position)?)))
            .collect()
    }

    fn update_column_orders(
        &mut self,
        board_id: BoardId,
        updates: &[OrderUpdate<ColumnId>],
    ) -> BoardRepositoryResult<()> {
        for update in updates {
            let affected = diesel::update(
                board_columns::table
                    .filter(board_columns::id.eq(update.id.into_inner()))
                    .filter(board_columns::board_id.eq(board_id.into_inner())),
            )
            .set(board_columns::position.eq(position_to_sql(update.position)?))
            .execute(self.connection)
            .map_err(BoardRepositoryError::persistence)?;
            if affected == 0 {
                return Err(BoardRepositoryError::ColumnNotFound(update.id));
            }
        }
        Ok(())
    }

    fn update_task_orders(
        &mut self,
        column_id: ColumnId,
        updates: &[OrderUpdate<TaskId>],
    ) -> BoardRepositoryResult<()> {
        for update in updates {
            let affected = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(update.id.into_inner()))
                    .filter(tasks::column_id.eq(column_id.into_inner())),
            )
            .set(tasks::position.eq(position_to_sql(update.position)?))
            .execute(self.connection)
            .map_err(BoardRepositoryError::persistence)?;
            if affected == 0 {
                return Err(BoardRepositoryError::TaskNotFound(update.id));
            }
        }
        Ok(())
    }

    fn move_task(
        &mut self,
        task_id: TaskId,
        column_id: ColumnId,
        position: Position,
        timestamp: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let affected = diesel::update(tasks::table.find(task_id.into_inner()))
            .set((
                tasks::column_id.eq(column_id.into_inner()),
                tasks::position.eq(position_to_sql(position)?),
                tasks::updated_at.eq(timestamp),
            ))
            .execute(self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    BoardRepositoryError::ColumnNotFound(column_id)
                }
                other => BoardRepositoryError::persistence(other),
            })?;
        if affected == 0 {
            return Err(BoardRepositoryError::TaskNotFound(task_id));
        }
        Ok(())
    }

    fn insert_column(&mut self, column: &Column) -> BoardRepositoryResult<()> {
        let row = ColumnRow::from_domain(column)?;
        insert_column_row(self.connection, &row)
    }

    fn insert_task(&mut self, task: &Task) -> BoardRepositoryResult<()> {
        let row = TaskRow::from_domain(task)?;
        diesel::insert_into(tasks::table)
            .values(&row)
            .execute(self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    BoardRepositoryError::DuplicateTask(task.id())
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    BoardRepositoryError::ColumnNotFound(task.column_id())
                }
                other => BoardRepositoryError::persistence(other),
            })?;
        Ok(())
    }

    fn delete_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<()> {
        let deleted = diesel::delete(board_columns::table.find(column_id.into_inner()))
            .execute(self.connection)
            .map_err(BoardRepositoryError::persistence)?;
        if deleted == 0 {
            return Err(BoardRepositoryError::ColumnNotFound(column_id));
        }
        Ok(())
    }

    fn delete_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<()> {
        let deleted = diesel::delete(tasks::table.find(task_id.into_inner()))
            .execute(self.connection)
            .map_err(BoardRepositoryError::persistence)?;
        if deleted == 0 {
            return Err(BoardRepositoryError::TaskNotFound(task_id));
        }
        Ok(())
    }

    fn touch_board(
        &mut self,
        board_id: BoardId,
        timestamp: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let affected = diesel::update(boards::table.find(board_id.into_inner()))
            .set(boards::updated_at.eq(timestamp))
            .execute(self.connection)
            .map_err(BoardRepositoryError::persistence)?;
        if affected == 0 {
            return Err(BoardRepositoryError::BoardNotFound(board_id));
        }
        Ok(())
    }
}
