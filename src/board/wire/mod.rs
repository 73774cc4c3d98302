//! Wire contract for the reorder endpoints.
//!
//! Request framing and routing live outside this crate. This module fixes
//! the JSON body shapes, validates them into [`ReorderRequest`] values, and
//! maps service outcomes onto status codes and `{success}` / `{error}`
//! bodies.
//!
//! [`ReorderRequest`]: crate::board::services::ReorderRequest

mod body;
mod response;

pub use body::{
    ColumnReorderBody, ReorderRoute, TaskMoveBody, TaskReorderBody, WireError, encode,
};
pub use response::{
    STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_NOT_FOUND, STATUS_OK, WireResponse, respond,
};
