//! Application services for board lifecycle and sibling reordering.

mod lifecycle;
mod locking;
mod reorder;

pub use lifecycle::{BoardService, BoardServiceError, BoardServiceResult, CreateTaskRequest};
pub use reorder::{
    ReorderError, ReorderErrorKind, ReorderOutcome, ReorderRequest, ReorderResult, ReorderService,
};
