//! Board aggregate and read models assembled from persisted rows.

use super::{BoardDomainError, BoardId, Column, ColumnId, Sibling, Task, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Board owning an ordered set of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    id: BoardId,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBoardData {
    /// Persisted board identifier.
    pub id: BoardId,
    /// Persisted title.
    pub title: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Creates a new board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyBoardTitle`] when the title is blank.
    pub fn new(title: impl Into<String>, clock: &impl Clock) -> Result<Self, BoardDomainError> {
        let title = normalized_title(title.into()).ok_or(BoardDomainError::EmptyBoardTitle)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: BoardId::new(),
            title,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a board from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBoardData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the board identifier.
    #[must_use]
    pub const fn id(&self) -> BoardId {
        self.id
    }

    /// Returns the board title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a modification at `timestamp`.
    pub fn touch(&mut self, timestamp: DateTime<Utc>) {
        self.updated_at = timestamp;
    }
}

/// Column together with its tasks in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    /// Column record.
    pub column: Column,
    /// Tasks sorted by position.
    pub tasks: Vec<Task>,
}

impl ColumnSnapshot {
    /// Returns task siblings for ordering checks.
    #[must_use]
    pub fn task_siblings(&self) -> Vec<Sibling<TaskId>> {
        self.tasks
            .iter()
            .map(|task| Sibling::new(task.id(), task.position()))
            .collect()
    }
}

/// Fully loaded board with columns and tasks in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Board record.
    pub board: Board,
    /// Columns sorted by position.
    pub columns: Vec<ColumnSnapshot>,
}

impl BoardSnapshot {
    /// Assembles a snapshot, sorting columns and tasks by position.
    #[must_use]
    pub fn assemble(board: Board, columns: Vec<Column>, tasks: Vec<Task>) -> Self {
        let mut columns = columns;
        columns.sort_by_key(|column| (column.position(), column.id()));
        let mut tasks = tasks;
        tasks.sort_by_key(|task| (task.position(), task.id()));

        let columns = columns
            .into_iter()
            .map(|column| {
                let column_tasks = tasks
                    .iter()
                    .filter(|task| task.column_id() == column.id())
                    .cloned()
                    .collect();
                ColumnSnapshot {
                    column,
                    tasks: column_tasks,
                }
            })
            .collect();
        Self { board, columns }
    }

    /// Returns column siblings for ordering checks.
    #[must_use]
    pub fn column_siblings(&self) -> Vec<Sibling<ColumnId>> {
        self.columns
            .iter()
            .map(|snapshot| Sibling::new(snapshot.column.id(), snapshot.column.position()))
            .collect()
    }

    /// Finds a column snapshot by identifier.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&ColumnSnapshot> {
        self.columns.iter().find(|snapshot| snapshot.column.id() == id)
    }

    /// Returns the total number of tasks across all columns.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|snapshot| snapshot.tasks.len()).sum()
    }
}

/// Board listing entry with aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    /// Board record.
    pub board: Board,
    /// Number of columns on the board.
    pub column_count: usize,
    /// Number of tasks across all columns.
    pub task_count: usize,
}

/// Trims a title, returning `None` when nothing remains.
pub(crate) fn normalized_title(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_owned())
    }
}
