//! Optimistic board controller.
//!
//! A drop is applied to the local view immediately and then mirrored to the
//! server. Success only tags the operation confirmed. Failure discards every
//! optimistic change by reloading the board from the server, replaying the
//! drops still awaiting an answer on top of the fresh snapshot. While an
//! operation is unconfirmed, further drops touching its scopes are refused.

use crate::board::domain::{BoardId, BoardSnapshot};
use crate::board::services::ReorderRequest;
use crate::client::{
    domain::{
        BoardView, DragResult, DraggedItem, DropLocation, DropOutcome, GesturePhase, OperationId,
        OperationState, PendingOperation, ScopeKey, Settlement,
    },
    ports::{ApiError, BoardApi},
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

/// Message shown to the user when a remote call fails.
pub const FAILURE_NOTICE: &str = "could not complete action";

/// Board fetches attempted per reload before giving up.
pub const RELOAD_ATTEMPTS: u32 = 3;

const RELOAD_BACKOFF: Duration = Duration::from_millis(50);

/// Controller shared between the render path and settling tasks.
pub type SharedController<A> = Arc<Mutex<BoardController<A>>>;

/// Errors raised by the board controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// A drag is already active, or the board is reloading.
    #[error("cannot start a drag while {0:?}")]
    GestureInProgress(GesturePhase),

    /// The drop does not match the active drag or the current view.
    #[error("drop does not match the current board state")]
    StaleDrag,

    /// A scope touched by the drop still has an unconfirmed operation.
    #[error("scope {0:?} has an unconfirmed operation")]
    ScopeBusy(ScopeKey),

    /// The destination index is outside the destination list.
    #[error("drop index {index} is out of range for a list of {len}")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Length of the destination list.
        len: usize,
    },

    /// The operation is unknown or already settled.
    #[error("unknown operation {0}")]
    UnknownOperation(OperationId),

    /// The server could not be reached or refused a read.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A settling task panicked while holding the controller.
    #[error("controller state is poisoned")]
    StatePoisoned,
}

/// Owns one board view and the optimistic operations applied to it.
pub struct BoardController<A>
where
    A: BoardApi,
{
    api: Arc<A>,
    view: BoardView,
    phase: GesturePhase,
    operations: Vec<PendingOperation>,
    next_operation: u64,
    notice: Option<&'static str>,
    resync_owed: bool,
}

impl<A> BoardController<A>
where
    A: BoardApi,
{
    /// Creates a controller over an already loaded snapshot.
    #[must_use]
    pub fn new(api: Arc<A>, snapshot: &BoardSnapshot) -> Self {
        Self {
            api,
            view: BoardView::from_snapshot(snapshot),
            phase: GesturePhase::Idle,
            operations: Vec::new(),
            next_operation: 0,
            notice: None,
            resync_owed: false,
        }
    }

    /// Fetches the board and creates a controller for it.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Api`] when the board cannot be fetched.
    pub async fn open(api: Arc<A>, board_id: BoardId) -> Result<Self, ControllerError> {
        let snapshot = api.fetch_board(board_id).await?;
        Ok(Self::new(api, &snapshot))
    }

    /// Current view in display order.
    #[must_use]
    pub const fn view(&self) -> &BoardView {
        &self.view
    }

    /// Identifier of the board this controller owns.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.view.board_id
    }

    /// Phase of the current gesture.
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Operations that are in flight or confirmed since the last drop.
    #[must_use]
    pub fn operations(&self) -> &[PendingOperation] {
        &self.operations
    }

    /// User-facing notice left by the latest failure, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// Starts dragging `item`.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::GestureInProgress`] when another drag is
    /// active or the board is reloading.
    pub fn begin_drag(&mut self, item: DraggedItem) -> Result<(), ControllerError> {
        match self.phase {
            GesturePhase::Dragging(_) | GesturePhase::Reloading => {
                Err(ControllerError::GestureInProgress(self.phase))
            }
            GesturePhase::Idle | GesturePhase::OptimisticApplied(_) => {
                self.phase = GesturePhase::Dragging(item);
                Ok(())
            }
        }
    }

    /// Abandons the active drag without issuing a request.
    pub fn cancel_drag(&mut self) {
        if matches!(self.phase, GesturePhase::Dragging(_)) {
            self.phase = GesturePhase::Idle;
        }
    }

    /// Applies a drop to the view and records the operation owed to the
    /// server.
    ///
    /// Drops released outside a list, or onto their own slot, are ignored.
    /// Rejected drops leave the view untouched and end the gesture.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::StaleDrag`] when the drop does not match
    /// the active drag or the view, [`ControllerError::ScopeBusy`] when a
    /// touched scope has an unconfirmed operation, and
    /// [`ControllerError::InvalidIndex`] when the destination index is out of
    /// range.
    pub fn apply_drag_result(&mut self, result: DragResult) -> Result<DropOutcome, ControllerError> {
        if self.phase != GesturePhase::Dragging(result.moved_item) {
            return Err(ControllerError::StaleDrag);
        }
        self.phase = GesturePhase::Idle;

        let Some(destination) = result.destination else {
            debug!(board_id = %self.board_id(), "drop outside any list ignored");
            return Ok(DropOutcome::Ignored);
        };
        if destination == result.source {
            debug!(board_id = %self.board_id(), "drop onto own slot ignored");
            return Ok(DropOutcome::Ignored);
        }

        let request = self.validate_drop(&result, destination)?;
        if !self.view.splice(result.source, destination) {
            return Err(ControllerError::StaleDrag);
        }

        self.operations.retain(PendingOperation::is_in_flight);
        let id = OperationId::new(self.next_operation);
        self.next_operation = self.next_operation.saturating_add(1);
        let mut scopes = vec![result.source.scope];
        if destination.scope != result.source.scope {
            scopes.push(destination.scope);
        }
        self.operations.push(PendingOperation {
            id,
            request,
            scopes,
            state: OperationState::Pending,
        });
        self.phase = GesturePhase::OptimisticApplied(id);
        debug!(operation = %id, board_id = %self.board_id(), "optimistic drop applied");
        Ok(DropOutcome::Applied(id))
    }

    /// Returns the request owed to the server for a pending operation.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownOperation`] when no pending
    /// operation has this identifier.
    pub fn pending_request(&self, id: OperationId) -> Result<ReorderRequest, ControllerError> {
        self.operations
            .iter()
            .find(|operation| operation.id == id && operation.state == OperationState::Pending)
            .map(|operation| operation.request)
            .ok_or(ControllerError::UnknownOperation(id))
    }

    /// Records the server's answer for an operation.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownOperation`] when no pending
    /// operation has this identifier.
    pub fn complete(
        &mut self,
        id: OperationId,
        outcome: Result<(), ApiError>,
    ) -> Result<Settlement, ControllerError> {
        let operation = self
            .operations
            .iter_mut()
            .find(|operation| operation.id == id && operation.state == OperationState::Pending)
            .ok_or(ControllerError::UnknownOperation(id))?;

        match outcome {
            Ok(()) => {
                operation.state = OperationState::Confirmed;
                info!(operation = %id, "reorder confirmed");
                if self.resync_owed
                    && !self.operations.iter().any(PendingOperation::is_in_flight)
                {
                    self.resync_owed = false;
                    self.phase = GesturePhase::Reloading;
                    info!(
                        board_id = %self.view.board_id,
                        "confirmed drops missing from view, reloading"
                    );
                    return Ok(Settlement::Resync);
                }
                if self.phase == GesturePhase::OptimisticApplied(id) {
                    self.phase = GesturePhase::Idle;
                }
                Ok(Settlement::Confirmed)
            }
            Err(err) => {
                operation.state = OperationState::Reverting;
                self.phase = GesturePhase::Reloading;
                self.notice = Some(FAILURE_NOTICE);
                warn!(operation = %id, error = %err, "reorder failed, reloading board");
                Ok(Settlement::ReloadRequired)
            }
        }
    }

    /// Replaces the view with a freshly fetched snapshot and releases the
    /// scopes held by reverted operations.
    ///
    /// Drops still awaiting an answer are replayed onto the new view. The
    /// snapshot may predate their commit, and replaying one it already shows
    /// changes nothing. A drop that no longer fits the snapshot is left out,
    /// and the last of them to be confirmed reports [`Settlement::Resync`].
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Api`] when the fetch failed; the controller
    /// stays in [`GesturePhase::Reloading`] so the reload can be retried.
    pub fn finish_reload(
        &mut self,
        fetched: Result<BoardSnapshot, ApiError>,
    ) -> Result<(), ControllerError> {
        let snapshot = fetched.inspect_err(|err| {
            warn!(board_id = %self.view.board_id, error = %err, "board reload failed");
        })?;
        self.view = BoardView::from_snapshot(&snapshot);
        self.operations
            .retain(|operation| operation.state != OperationState::Reverting);
        self.resync_owed = false;
        for operation in &self.operations {
            if operation.state == OperationState::Pending && !self.view.reapply(operation.request)
            {
                warn!(operation = %operation.id, "pending drop does not fit reloaded board");
                self.resync_owed = true;
            }
        }
        if self.phase == GesturePhase::Reloading {
            self.phase = GesturePhase::Idle;
        }
        info!(board_id = %self.view.board_id, "board reloaded");
        Ok(())
    }

    /// Fetches the board and discards the optimistic state of settled
    /// operations.
    ///
    /// The fetch is attempted up to [`RELOAD_ATTEMPTS`] times. Calling this
    /// again after an error retries the reload.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Api`] when every fetch attempt fails.
    pub async fn reload(&mut self) -> Result<(), ControllerError> {
        let fetched = fetch_for_reload(&*self.api, self.view.board_id).await;
        self.finish_reload(fetched)
    }

    /// Sends a pending operation, waits for the answer, and reloads when
    /// the settlement asks for it.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownOperation`] for an unknown
    /// operation and [`ControllerError::Api`] when the reload fails.
    pub async fn settle(&mut self, id: OperationId) -> Result<Settlement, ControllerError> {
        let request = self.pending_request(id)?;
        let outcome = self.api.reorder(request).await;
        let settlement = self.complete(id, outcome)?;
        if settlement.needs_reload() {
            self.reload().await?;
        }
        Ok(settlement)
    }

    /// Checks a drop against the view and the in-flight operations, and
    /// builds the request it implies.
    fn validate_drop(
        &self,
        result: &DragResult,
        destination: DropLocation,
    ) -> Result<ReorderRequest, ControllerError> {
        let source = result.source;
        if source.scope.kind() != result.kind() || destination.scope.kind() != result.kind() {
            return Err(ControllerError::StaleDrag);
        }
        if self.view.item_at(source) != Some(result.moved_item) {
            return Err(ControllerError::StaleDrag);
        }
        if let Some(busy) = [source.scope, destination.scope].into_iter().find(|scope| {
            self.operations
                .iter()
                .any(|operation| operation.is_in_flight() && operation.touches(*scope))
        }) {
            warn!(board_id = %self.board_id(), scope = ?busy, "drop refused, scope busy");
            return Err(ControllerError::ScopeBusy(busy));
        }

        let len = self
            .view
            .scope_len(destination.scope)
            .ok_or(ControllerError::StaleDrag)?;
        let limit = if destination.scope == source.scope {
            len.saturating_sub(1)
        } else {
            len
        };
        if destination.index > limit {
            return Err(ControllerError::InvalidIndex {
                index: destination.index,
                len,
            });
        }

        match (result.moved_item, source.scope, destination.scope) {
            (DraggedItem::Column(column_id), ScopeKey::Board(board_id), ScopeKey::Board(_)) => {
                Ok(ReorderRequest::ColumnReorder {
                    board_id,
                    column_id,
                    target_index: destination.index,
                })
            }
            (DraggedItem::Task(task_id), ScopeKey::Column(from), ScopeKey::Column(to))
                if from == to =>
            {
                Ok(ReorderRequest::TaskReorder {
                    column_id: from,
                    task_id,
                    target_index: destination.index,
                })
            }
            (DraggedItem::Task(task_id), ScopeKey::Column(from), ScopeKey::Column(to)) => {
                Ok(ReorderRequest::TaskMove {
                    task_id,
                    source_column_id: from,
                    destination_column_id: to,
                    destination_index: destination.index,
                })
            }
            _ => Err(ControllerError::StaleDrag),
        }
    }
}

/// Wraps a controller for use from spawned settling tasks.
#[must_use]
pub fn share<A: BoardApi>(controller: BoardController<A>) -> SharedController<A> {
    Arc::new(Mutex::new(controller))
}

/// Fetches the board, retrying failed fetches with a fixed backoff.
async fn fetch_for_reload<A: BoardApi>(
    api: &A,
    board_id: BoardId,
) -> Result<BoardSnapshot, ApiError> {
    let mut attempt = 1;
    loop {
        match api.fetch_board(board_id).await {
            Err(err) if attempt < RELOAD_ATTEMPTS => {
                warn!(board_id = %board_id, attempt, error = %err, "board fetch failed, retrying");
                sleep(RELOAD_BACKOFF).await;
                attempt += 1;
            }
            fetched => return fetched,
        }
    }
}

fn lock<A: BoardApi>(
    controller: &SharedController<A>,
) -> Result<MutexGuard<'_, BoardController<A>>, ControllerError> {
    controller
        .lock()
        .map_err(|_| ControllerError::StatePoisoned)
}

/// Sends a pending operation on the tokio runtime without blocking the
/// caller.
///
/// The controller lock is held only between awaits, so the view stays
/// readable while the request is in flight.
///
/// # Errors
///
/// Returns [`ControllerError::UnknownOperation`] when the operation is not
/// pending, or [`ControllerError::StatePoisoned`] when the lock is poisoned.
pub fn dispatch<A>(
    controller: &SharedController<A>,
    id: OperationId,
) -> Result<JoinHandle<Result<Settlement, ControllerError>>, ControllerError>
where
    A: BoardApi + 'static,
{
    let (api, request) = {
        let guard = lock(controller)?;
        (Arc::clone(&guard.api), guard.pending_request(id)?)
    };
    let shared = Arc::clone(controller);

    Ok(tokio::spawn(async move {
        let outcome = api.reorder(request).await;
        let settlement = lock(&shared)?.complete(id, outcome)?;
        if settlement.needs_reload() {
            let board_id = lock(&shared)?.board_id();
            let fetched = fetch_for_reload(&*api, board_id).await;
            lock(&shared)?.finish_reload(fetched)?;
        }
        Ok(settlement)
    }))
}
