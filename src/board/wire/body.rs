//! JSON request bodies for the three reorder endpoints.

use crate::board::domain::{BoardId, ColumnId, TaskId};
use crate::board::services::ReorderRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `PUT /boards/{boardId}/columns/reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnReorderBody {
    /// Column being moved.
    pub column_id: ColumnId,
    /// Destination index among the board's columns.
    pub new_order: i64,
}

/// Body of `PUT /columns/{columnId}/tasks/reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReorderBody {
    /// Task being moved.
    pub task_id: TaskId,
    /// Destination index among the column's tasks.
    pub new_index: i64,
}

/// Body of `PUT /tasks/{taskId}/move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMoveBody {
    /// Column the task currently belongs to.
    pub source_column_id: ColumnId,
    /// Column receiving the task.
    pub destination_column_id: ColumnId,
    /// Destination index in the receiving column.
    pub new_index: i64,
}

/// Errors raised while decoding a request at the boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// The body is not valid JSON for the endpoint.
    #[error("malformed request body: {0}")]
    Malformed(String),

    /// An index field is negative or does not fit the platform index type.
    #[error("{field} must be a non-negative index, got {value}")]
    InvalidIndex {
        /// Name of the offending JSON field.
        field: &'static str,
        /// Value received.
        value: i64,
    },
}

/// Endpoint a reorder request is addressed to, with its path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderRoute {
    /// `PUT /boards/{boardId}/columns/reorder`.
    Columns(BoardId),
    /// `PUT /columns/{columnId}/tasks/reorder`.
    Tasks(ColumnId),
    /// `PUT /tasks/{taskId}/move`.
    Move(TaskId),
}

impl ReorderRoute {
    /// Returns the request path for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Columns(board_id) => format!("/boards/{board_id}/columns/reorder"),
            Self::Tasks(column_id) => format!("/columns/{column_id}/tasks/reorder"),
            Self::Move(task_id) => format!("/tasks/{task_id}/move"),
        }
    }

    /// Decodes and validates `body` for this route.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Malformed`] when the JSON does not match the
    /// route's body and [`WireError::InvalidIndex`] for a negative index.
    pub fn decode(self, body: &str) -> Result<ReorderRequest, WireError> {
        match self {
            Self::Columns(board_id) => {
                let parsed: ColumnReorderBody = parse(body)?;
                Ok(ReorderRequest::ColumnReorder {
                    board_id,
                    column_id: parsed.column_id,
                    target_index: to_index("newOrder", parsed.new_order)?,
                })
            }
            Self::Tasks(column_id) => {
                let parsed: TaskReorderBody = parse(body)?;
                Ok(ReorderRequest::TaskReorder {
                    column_id,
                    task_id: parsed.task_id,
                    target_index: to_index("newIndex", parsed.new_index)?,
                })
            }
            Self::Move(task_id) => {
                let parsed: TaskMoveBody = parse(body)?;
                Ok(ReorderRequest::TaskMove {
                    task_id,
                    source_column_id: parsed.source_column_id,
                    destination_column_id: parsed.destination_column_id,
                    destination_index: to_index("newIndex", parsed.new_index)?,
                })
            }
        }
    }
}

/// Splits a request into its route and JSON body.
///
/// # Errors
///
/// Returns [`WireError::InvalidIndex`] when an index does not fit the
/// signed wire representation.
pub fn encode(request: &ReorderRequest) -> Result<(ReorderRoute, String), WireError> {
    let (route, body) = match *request {
        ReorderRequest::ColumnReorder {
            board_id,
            column_id,
            target_index,
        } => (
            ReorderRoute::Columns(board_id),
            serde_json::to_string(&ColumnReorderBody {
                column_id,
                new_order: from_index("newOrder", target_index)?,
            }),
        ),
        ReorderRequest::TaskReorder {
            column_id,
            task_id,
            target_index,
        } => (
            ReorderRoute::Tasks(column_id),
            serde_json::to_string(&TaskReorderBody {
                task_id,
                new_index: from_index("newIndex", target_index)?,
            }),
        ),
        ReorderRequest::TaskMove {
            task_id,
            source_column_id,
            destination_column_id,
            destination_index,
        } => (
            ReorderRoute::Move(task_id),
            serde_json::to_string(&TaskMoveBody {
                source_column_id,
                destination_column_id,
                new_index: from_index("newIndex", destination_index)?,
            }),
        ),
    };
    let json = body.map_err(|err| WireError::Malformed(err.to_string()))?;
    Ok((route, json))
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, WireError> {
    serde_json::from_str(body).map_err(|err| WireError::Malformed(err.to_string()))
}

fn to_index(field: &'static str, value: i64) -> Result<usize, WireError> {
    usize::try_from(value).map_err(|_| WireError::InvalidIndex { field, value })
}

fn from_index(field: &'static str, index: usize) -> Result<i64, WireError> {
    i64::try_from(index).map_err(|_| WireError::InvalidIndex {
        field,
        value: i64::MAX,
    })
}
