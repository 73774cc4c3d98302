//! In-process [`BoardApi`] that runs requests through the wire contract
//! against the board services.

use crate::board::{
    domain::{BoardId, BoardSnapshot},
    ports::BoardRepository,
    services::{BoardService, ReorderRequest, ReorderService},
    wire::{self, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND, WireResponse},
};
use crate::client::ports::{ApiError, BoardApi};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Board API served by services in the same process.
///
/// Requests are encoded to JSON bodies and decoded again so the in-process
/// path exercises the same validation as a remote caller.
#[derive(Clone)]
pub struct LocalBoardApi<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    boards: Arc<BoardService<R, C>>,
    reorder: Arc<ReorderService<R, C>>,
}

impl<R, C> LocalBoardApi<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates an API over the given services.
    #[must_use]
    pub const fn new(boards: Arc<BoardService<R, C>>, reorder: Arc<ReorderService<R, C>>) -> Self {
        Self { boards, reorder }
    }
}

fn rejected(response: &WireResponse) -> ApiError {
    ApiError::Rejected {
        status: response.status,
        message: response
            .error_message()
            .unwrap_or("could not complete action")
            .to_owned(),
    }
}

#[async_trait]
impl<R, C> BoardApi for LocalBoardApi<R, C>
where
    R: BoardRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn reorder(&self, request: ReorderRequest) -> Result<(), ApiError> {
        let (route, body) =
            wire::encode(&request).map_err(|err| ApiError::Transport(err.to_string()))?;
        let response = wire::respond(&self.reorder, route, &body).await;
        if response.is_success() {
            Ok(())
        } else {
            Err(rejected(&response))
        }
    }

    async fn fetch_board(&self, board_id: BoardId) -> Result<BoardSnapshot, ApiError> {
        self.boards.load_board(board_id).await.map_err(|err| {
            let status = if err.is_not_found() {
                STATUS_NOT_FOUND
            } else {
                STATUS_INTERNAL_ERROR
            };
            ApiError::Rejected {
                status,
                message: err.to_string(),
            }
        })
    }
}
