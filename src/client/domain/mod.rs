//! Client-side board state and drag gesture model.

mod gesture;
mod view;

pub use gesture::{
    DragResult, DraggedItem, DropLocation, DropOutcome, GesturePhase, OperationId,
    OperationState, PendingOperation, ScopeKey, ScopeKind, Settlement,
};
pub use view::{BoardView, ColumnView, TaskView};
