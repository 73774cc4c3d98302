//! Diesel row models for board persistence.

use super::schema::{board_columns, boards, tasks};
use crate::board::{
    domain::{
        Board, BoardId, Column, ColumnId, PersistedBoardData, PersistedTaskData, Position,
        Priority, Task, TaskId,
    },
    ports::{BoardRepositoryError, BoardRepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Board table row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = boards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BoardRow {
    /// Board identifier.
    pub id: uuid::Uuid,
    /// Board title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Column table row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = board_columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnRow {
    /// Column identifier.
    pub id: uuid::Uuid,
    /// Owning board.
    pub board_id: uuid::Uuid,
    /// Column title.
    pub title: String,
    /// Position within the board.
    pub position: i32,
}

/// Task table row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning column.
    pub column_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority level.
    pub priority: String,
    /// Position within the column.
    pub position: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Converts a domain position into the persisted integer.
pub fn position_to_sql(position: Position) -> BoardRepositoryResult<i32> {
    i32::try_from(position.value()).map_err(BoardRepositoryError::persistence)
}

/// Converts a persisted integer into a domain position.
pub fn position_from_sql(value: i32) -> BoardRepositoryResult<Position> {
    u32::try_from(value)
        .map(Position::new)
        .map_err(BoardRepositoryError::persistence)
}

impl BoardRow {
    /// Builds a row from a domain board.
    pub fn from_domain(board: &Board) -> Self {
        Self {
            id: board.id().into_inner(),
            title: board.title().to_owned(),
            created_at: board.created_at(),
            updated_at: board.updated_at(),
        }
    }

    /// Converts the row into a domain board.
    pub fn into_domain(self) -> Board {
        Board::from_persisted(PersistedBoardData {
            id: BoardId::from_uuid(self.id),
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ColumnRow {
    /// Builds a row from a domain column.
    pub fn from_domain(column: &Column) -> BoardRepositoryResult<Self> {
        Ok(Self {
            id: column.id().into_inner(),
            board_id: column.board_id().into_inner(),
            title: column.title().to_owned(),
            position: position_to_sql(column.position())?,
        })
    }

    /// Converts the row into a domain column.
    pub fn into_domain(self) -> BoardRepositoryResult<Column> {
        Ok(Column::from_persisted(
            ColumnId::from_uuid(self.id),
            BoardId::from_uuid(self.board_id),
            self.title,
            position_from_sql(self.position)?,
        ))
    }
}

impl TaskRow {
    /// Builds a row from a domain task.
    pub fn from_domain(task: &Task) -> BoardRepositoryResult<Self> {
        Ok(Self {
            id: task.id().into_inner(),
            column_id: task.column_id().into_inner(),
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            priority: task.priority().as_str().to_owned(),
            position: position_to_sql(task.position())?,
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        })
    }

    /// Converts the row into a domain task.
    pub fn into_domain(self) -> BoardRepositoryResult<Task> {
        let priority =
            Priority::try_from(self.priority.as_str()).map_err(BoardRepositoryError::persistence)?;
        Ok(Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            column_id: ColumnId::from_uuid(self.column_id),
            title: self.title,
            description: self.description,
            priority,
            position: position_from_sql(self.position)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}
