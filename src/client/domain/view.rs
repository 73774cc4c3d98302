//! Client-side mirror of a board in display order.

use super::{DraggedItem, DropLocation, ScopeKey};
use crate::board::domain::{BoardId, BoardSnapshot, ColumnId, Priority, TaskId};
use crate::board::services::ReorderRequest;

/// Task as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority badge.
    pub priority: Priority,
}

/// Column as shown on the board, tasks in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    /// Column identifier.
    pub id: ColumnId,
    /// Column title.
    pub title: String,
    /// Tasks in display order.
    pub tasks: Vec<TaskView>,
}

/// Board as shown to the user.
///
/// List order is display order; positions are not stored, so an optimistic
/// splice is the whole client-side mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Board identifier.
    pub board_id: BoardId,
    /// Board title.
    pub title: String,
    /// Columns in display order.
    pub columns: Vec<ColumnView>,
}

impl BoardView {
    /// Builds a view from an authoritative snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            board_id: snapshot.board.id(),
            title: snapshot.board.title().to_owned(),
            columns: snapshot
                .columns
                .iter()
                .map(|column| ColumnView {
                    id: column.column.id(),
                    title: column.column.title().to_owned(),
                    tasks: column
                        .tasks
                        .iter()
                        .map(|task| TaskView {
                            id: task.id(),
                            title: task.title().to_owned(),
                            description: task.description().map(str::to_owned),
                            priority: task.priority(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Finds a column by identifier.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&ColumnView> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Returns the number of items in `scope`, or `None` when this view does
    /// not contain the scope.
    #[must_use]
    pub fn scope_len(&self, scope: ScopeKey) -> Option<usize> {
        match scope {
            ScopeKey::Board(board_id) => (board_id == self.board_id).then_some(self.columns.len()),
            ScopeKey::Column(column_id) => self.column(column_id).map(|column| column.tasks.len()),
        }
    }

    /// Returns the item displayed at `location`.
    #[must_use]
    pub fn item_at(&self, location: DropLocation) -> Option<DraggedItem> {
        match location.scope {
            ScopeKey::Board(board_id) if board_id == self.board_id => self
                .columns
                .get(location.index)
                .map(|column| DraggedItem::Column(column.id)),
            ScopeKey::Board(_) => None,
            ScopeKey::Column(column_id) => self
                .column(column_id)
                .and_then(|column| column.tasks.get(location.index))
                .map(|task| DraggedItem::Task(task.id)),
        }
    }

    /// Moves the item at `source` to `destination`, returning `false` and
    /// leaving the view untouched when either location is out of range or
    /// the scopes are of different kinds.
    pub(crate) fn splice(&mut self, source: DropLocation, destination: DropLocation) -> bool {
        match (source.scope, destination.scope) {
            (ScopeKey::Board(_), ScopeKey::Board(_)) => {
                splice_within(&mut self.columns, source.index, destination.index)
            }
            (ScopeKey::Column(from), ScopeKey::Column(to)) if from == to => self
                .column_mut(from)
                .is_some_and(|column| {
                    splice_within(&mut column.tasks, source.index, destination.index)
                }),
            (ScopeKey::Column(from), ScopeKey::Column(to)) => {
                let fits = self
                    .column(to)
                    .is_some_and(|column| destination.index <= column.tasks.len());
                if !fits {
                    return false;
                }
                let Some(task) = self.column_mut(from).and_then(|column| {
                    (source.index < column.tasks.len()).then(|| column.tasks.remove(source.index))
                }) else {
                    return false;
                };
                self.column_mut(to)
                    .map(|column| column.tasks.insert(destination.index, task))
                    .is_some()
            }
            _ => false,
        }
    }

    /// Puts the item named by `request` at the index the request asks for.
    ///
    /// The item is found by identity, so a request whose effect the view
    /// already shows leaves it unchanged. Returns `false` and leaves the
    /// view untouched when the item is not where the request expects it or
    /// the index is out of range.
    pub(crate) fn reapply(&mut self, request: ReorderRequest) -> bool {
        match request {
            ReorderRequest::ColumnReorder {
                board_id,
                column_id,
                target_index,
            } => {
                board_id == self.board_id
                    && self
                        .columns
                        .iter()
                        .position(|column| column.id == column_id)
                        .is_some_and(|from| splice_within(&mut self.columns, from, target_index))
            }
            ReorderRequest::TaskReorder {
                column_id,
                task_id,
                target_index,
            } => self.column_mut(column_id).is_some_and(|column| {
                column
                    .tasks
                    .iter()
                    .position(|task| task.id == task_id)
                    .is_some_and(|from| splice_within(&mut column.tasks, from, target_index))
            }),
            ReorderRequest::TaskMove {
                task_id,
                source_column_id,
                destination_column_id,
                destination_index,
            } => {
                let holder = self
                    .columns
                    .iter()
                    .find(|column| column.tasks.iter().any(|task| task.id == task_id))
                    .map(|column| column.id);
                if holder == Some(destination_column_id) {
                    return self.reapply(ReorderRequest::TaskReorder {
                        column_id: destination_column_id,
                        task_id,
                        target_index: destination_index,
                    });
                }
                if holder != Some(source_column_id) {
                    return false;
                }
                let fits = self
                    .column(destination_column_id)
                    .is_some_and(|column| destination_index <= column.tasks.len());
                if !fits {
                    return false;
                }
                let Some(task) = self.column_mut(source_column_id).and_then(|column| {
                    column
                        .tasks
                        .iter()
                        .position(|task| task.id == task_id)
                        .map(|index| column.tasks.remove(index))
                }) else {
                    return false;
                };
                self.column_mut(destination_column_id)
                    .map(|column| column.tasks.insert(destination_index, task))
                    .is_some()
            }
        }
    }

    fn column_mut(&mut self, id: ColumnId) -> Option<&mut ColumnView> {
        self.columns.iter_mut().find(|column| column.id == id)
    }
}

fn splice_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}
