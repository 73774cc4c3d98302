//! Column entity.

use super::{BoardDomainError, BoardId, ColumnId, Position, board::normalized_title};
use serde::{Deserialize, Serialize};

/// Column belonging to exactly one board, positioned among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    board_id: BoardId,
    title: String,
    position: Position,
}

impl Column {
    /// Creates a column at `position` within `board_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyColumnTitle`] when the title is blank.
    pub fn new(
        board_id: BoardId,
        title: impl Into<String>,
        position: Position,
    ) -> Result<Self, BoardDomainError> {
        let title = normalized_title(title.into()).ok_or(BoardDomainError::EmptyColumnTitle)?;
        Ok(Self {
            id: ColumnId::new(),
            board_id,
            title,
            position,
        })
    }

    /// Reconstructs a column from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: ColumnId,
        board_id: BoardId,
        title: String,
        position: Position,
    ) -> Self {
        Self {
            id,
            board_id,
            title,
            position,
        }
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> ColumnId {
        self.id
    }

    /// Returns the owning board identifier.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the column title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the column position within its board.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Moves the column to a new position within its board.
    pub const fn reposition(&mut self, position: Position) {
        self.position = position;
    }
}
