//! Remote board API used by the optimistic controller.

use crate::board::domain::{BoardId, BoardSnapshot};
use crate::board::services::ReorderRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Server operations the client depends on.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Sends a reorder request and waits for the server's verdict.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the server rejects the request or cannot be
    /// reached.
    async fn reorder(&self, request: ReorderRequest) -> Result<(), ApiError>;

    /// Fetches the authoritative board state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the board cannot be loaded.
    async fn fetch_board(&self, board_id: BoardId) -> Result<BoardSnapshot, ApiError>;
}

/// Errors reported by a [`BoardApi`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a failure status.
    #[error("server rejected request with status {status}: {message}")]
    Rejected {
        /// Status code returned.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The request could not be delivered.
    #[error("request could not be delivered: {0}")]
    Transport(String),
}
