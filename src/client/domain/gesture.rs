//! Drag gestures and the optimistic operations they produce.

use crate::board::domain::{BoardId, ColumnId, TaskId};
use crate::board::services::ReorderRequest;
use std::fmt;

/// Kind of list a gesture reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The columns of a board.
    Column,
    /// The tasks of a column.
    Task,
}

/// One ordered list on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Column list of a board.
    Board(BoardId),
    /// Task list of a column.
    Column(ColumnId),
}

impl ScopeKey {
    /// Returns the kind of item this scope holds.
    #[must_use]
    pub const fn kind(self) -> ScopeKind {
        match self {
            Self::Board(_) => ScopeKind::Column,
            Self::Column(_) => ScopeKind::Task,
        }
    }
}

/// Item picked up by a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraggedItem {
    /// A column header.
    Column(ColumnId),
    /// A task card.
    Task(TaskId),
}

impl DraggedItem {
    /// Returns the kind of list the item lives in.
    #[must_use]
    pub const fn kind(self) -> ScopeKind {
        match self {
            Self::Column(_) => ScopeKind::Column,
            Self::Task(_) => ScopeKind::Task,
        }
    }
}

/// Index within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropLocation {
    /// List the index refers to.
    pub scope: ScopeKey,
    /// Zero-based index in display order.
    pub index: usize,
}

impl DropLocation {
    /// Creates a location.
    #[must_use]
    pub const fn new(scope: ScopeKey, index: usize) -> Self {
        Self { scope, index }
    }
}

/// Result reported by the drag-and-drop layer on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    /// Item that was dragged.
    pub moved_item: DraggedItem,
    /// Where the item was picked up.
    pub source: DropLocation,
    /// Where it was dropped, or `None` when released outside any list.
    pub destination: Option<DropLocation>,
}

impl DragResult {
    /// Returns the kind of list the gesture reorders.
    #[must_use]
    pub const fn kind(&self) -> ScopeKind {
        self.moved_item.kind()
    }
}

/// Phase of the gesture currently owned by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// No gesture in progress.
    Idle,
    /// An item is being dragged.
    Dragging(DraggedItem),
    /// The drop was applied locally and awaits confirmation.
    OptimisticApplied(OperationId),
    /// A remote call failed; the board is being reloaded.
    Reloading,
}

/// Identifier of an optimistic operation within one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle tag of an optimistic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Applied locally; the remote call has not answered yet.
    Pending,
    /// The server committed the change.
    Confirmed,
    /// The server rejected the change; local state awaits reload.
    Reverting,
}

/// Optimistic change applied to the view and mirrored to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    /// Operation identifier.
    pub id: OperationId,
    /// Request sent to the server.
    pub request: ReorderRequest,
    /// Scopes the change touches.
    pub scopes: Vec<ScopeKey>,
    /// Current lifecycle tag.
    pub state: OperationState,
}

impl PendingOperation {
    /// Returns `true` while the operation still holds its scopes.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self.state, OperationState::Pending | OperationState::Reverting)
    }

    /// Returns `true` when the operation touches `scope`.
    #[must_use]
    pub fn touches(&self, scope: ScopeKey) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Outcome of handing a drag result to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// No-op drop: released outside a list or onto its own slot.
    Ignored,
    /// The view changed and a remote call is owed for this operation.
    Applied(OperationId),
}

/// How an operation settled once the server answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The server committed the change; the view already matches.
    Confirmed,
    /// The server refused the change; the board must be reloaded.
    ReloadRequired,
    /// The server committed the change, but an earlier reload could not
    /// replay it onto the view; the board must be fetched again.
    Resync,
}

impl Settlement {
    /// Whether the board has to be fetched before the view is trustworthy.
    #[must_use]
    pub const fn needs_reload(self) -> bool {
        matches!(self, Self::ReloadRequired | Self::Resync)
    }
}
