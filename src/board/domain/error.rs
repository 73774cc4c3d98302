//! Error types for board domain validation and ordering.

use thiserror::Error;

/// Errors returned while constructing board, column, and task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The board title is empty after trimming.
    #[error("board title must not be empty")]
    EmptyBoardTitle,

    /// The column title is empty after trimming.
    #[error("column title must not be empty")]
    EmptyColumnTitle,

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,
}

/// Error returned while parsing task priorities from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Errors raised by the sibling ordering planner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderingError {
    /// The item is not a member of the scope being reordered.
    #[error("item {item} is not part of the ordered scope")]
    ItemNotFound {
        /// Display form of the missing item identifier.
        item: String,
    },

    /// The requested index lies outside the scope's valid range.
    #[error("index {index} is out of range, expected 0..={max}")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Largest accepted index for the request.
        max: usize,
    },

    /// Sibling positions are not the contiguous range `0..count`.
    #[error("sibling positions are not dense: expected {expected:?}, found {found:?}")]
    DensityViolation {
        /// Positions a dense scope of this size would hold.
        expected: Vec<u32>,
        /// Positions actually observed, sorted.
        found: Vec<u32>,
    },

    /// The scope holds more siblings than a position can address.
    #[error("scope exceeds the maximum number of positions")]
    ScopeOverflow,
}

impl OrderingError {
    pub(crate) fn item_not_found(item: impl std::fmt::Display) -> Self {
        Self::ItemNotFound {
            item: item.to_string(),
        }
    }
}
