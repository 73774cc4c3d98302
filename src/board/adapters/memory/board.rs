//! In-memory implementation of the board repository, intended for tests.
//!
//! There is no per-scope locking. Every transaction holds the single store
//! write lock for its whole duration and works on a clone of the entire
//! store, so transactions run one at a time even when their scopes are
//! disjoint, and each one costs a copy of every board. The clone replaces
//! the live state only when the work closure succeeds. A one-shot write
//! fault can be injected to exercise rollback.

use crate::board::{
    domain::{
        Board, BoardId, BoardSnapshot, BoardSummary, Column, ColumnId, OrderUpdate, Position,
        Sibling, Task, TaskId,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult, OrderingTransaction},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Thread-safe in-memory board repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardRepository {
    state: Arc<RwLock<InMemoryBoardState>>,
    fault: Arc<Mutex<Option<usize>>>,
}

#[derive(Debug, Clone, Default)]
struct InMemoryBoardState {
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryBoardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transaction fail after `writes` successful row writes.
    ///
    /// The fault fires once; later transactions run normally.
    pub fn inject_fault_after(&self, writes: usize) {
        let mut fault = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
        *fault = Some(writes);
    }

    fn take_fault(&self) -> Option<usize> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Runs `work` against a full copy of the store while holding the
    /// global write lock.
    fn run_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn OrderingTransaction) -> Result<T, E>,
        E: From<BoardRepositoryError>,
    {
        let mut state = self.state.write().map_err(poisoned)?;
        let mut staged = InMemoryTransaction {
            state: state.clone(),
            writes_before_fault: self.take_fault(),
        };
        let value = work(&mut staged)?;
        *state = staged.state;
        Ok(value)
    }
}

fn poisoned<G>(err: PoisonError<G>) -> BoardRepositoryError {
    BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn snapshot_of(state: &InMemoryBoardState, board: &Board) -> BoardSnapshot {
    let columns: Vec<Column> = state
        .columns
        .values()
        .filter(|column| column.board_id() == board.id())
        .cloned()
        .collect();
    let tasks = state
        .tasks
        .values()
        .filter(|task| columns.iter().any(|column| column.id() == task.column_id()))
        .cloned()
        .collect();
    BoardSnapshot::assemble(board.clone(), columns, tasks)
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn store_board(&self, board: &Board, columns: &[Column]) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.boards.contains_key(&board.id()) {
            return Err(BoardRepositoryError::DuplicateBoard(board.id()));
        }
        if let Some(duplicate) = columns
            .iter()
            .find(|column| state.columns.contains_key(&column.id()))
        {
            return Err(BoardRepositoryError::DuplicateColumn(duplicate.id()));
        }

        state.boards.insert(board.id(), board.clone());
        for column in columns {
            state.columns.insert(column.id(), column.clone());
        }
        Ok(())
    }

    async fn find_board(&self, id: BoardId) -> BoardRepositoryResult<Option<BoardSnapshot>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.boards.get(&id).map(|board| snapshot_of(&state, board)))
    }

    async fn list_boards(&self) -> BoardRepositoryResult<Vec<BoardSummary>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut summaries: Vec<BoardSummary> = state
            .boards
            .values()
            .map(|board| {
                let snapshot = snapshot_of(&state, board);
                BoardSummary {
                    column_count: snapshot.columns.len(),
                    task_count: snapshot.task_count(),
                    board: snapshot.board,
                }
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.board
                .updated_at()
                .cmp(&a.board.updated_at())
                .then_with(|| a.board.id().cmp(&b.board.id()))
        });
        Ok(summaries)
    }

    async fn delete_board(&self, id: BoardId) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.boards.remove(&id).is_none() {
            return Err(BoardRepositoryError::BoardNotFound(id));
        }
        let removed: Vec<ColumnId> = state
            .columns
            .values()
            .filter(|column| column.board_id() == id)
            .map(Column::id)
            .collect();
        state.columns.retain(|_, column| column.board_id() != id);
        state
            .tasks
            .retain(|_, task| !removed.contains(&task.column_id()));
        Ok(())
    }

    async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn OrderingTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardRepositoryError> + Send + 'static,
    {
        self.run_transaction(work)
    }
}

/// Staged copy of the store used by a single transaction.
struct InMemoryTransaction {
    state: InMemoryBoardState,
    writes_before_fault: Option<usize>,
}

impl InMemoryTransaction {
    fn record_write(&mut self) -> BoardRepositoryResult<()> {
        if let Some(remaining) = self.writes_before_fault.as_mut() {
            if *remaining == 0 {
                return Err(BoardRepositoryError::persistence(std::io::Error::other(
                    "injected write fault",
                )));
            }
            *remaining = remaining.saturating_sub(1);
        }
        Ok(())
    }
}

fn sorted<I: Ord + Copy>(mut siblings: Vec<Sibling<I>>) -> Vec<Sibling<I>> {
    siblings.sort_by_key(|sibling| (sibling.position, sibling.id));
    siblings
}

impl OrderingTransaction for InMemoryTransaction {
    fn lock_board(&mut self, board_id: BoardId) -> BoardRepositoryResult<Board> {
        self.state
            .boards
            .get(&board_id)
            .cloned()
            .ok_or(BoardRepositoryError::BoardNotFound(board_id))
    }

    fn lock_columns(&mut self, column_ids: &[ColumnId]) -> BoardRepositoryResult<Vec<Column>> {
        column_ids
            .iter()
            .map(|id| {
                self.state
                    .columns
                    .get(id)
                    .cloned()
                    .ok_or(BoardRepositoryError::ColumnNotFound(*id))
            })
            .collect()
    }

    fn find_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Option<Column>> {
        Ok(self.state.columns.get(&column_id).cloned())
    }

    fn find_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<Option<Task>> {
        Ok(self.state.tasks.get(&task_id).cloned())
    }

    fn column_siblings(&mut self, board_id: BoardId) -> BoardRepositoryResult<Vec<Sibling<ColumnId>>> {
        let siblings = self
            .state
            .columns
            .values()
            .filter(|column| column.board_id() == board_id)
            .map(|column| Sibling::new(column.id(), column.position()))
            .collect();
        Ok(sorted(siblings))
    }

    fn task_siblings(&mut self, column_id: ColumnId) -> BoardRepositoryResult<Vec<Sibling<TaskId>>> {
        let siblings = self
            .state
            .tasks
            .values()
            .filter(|task| task.column_id() == column_id)
            .map(|task| Sibling::new(task.id(), task.position()))
            .collect();
        Ok(sorted(siblings))
    }

    fn update_column_orders(
        &mut self,
        board_id: BoardId,
        updates: &[OrderUpdate<ColumnId>],
    ) -> BoardRepositoryResult<()> {
        for update in updates {
            self.record_write()?;
            let column = self
                .state
                .columns
                .get_mut(&update.id)
                .filter(|column| column.board_id() == board_id)
                .ok_or(BoardRepositoryError::ColumnNotFound(update.id))?;
            column.reposition(update.position);
        }
        Ok(())
    }

    fn update_task_orders(
        &mut self,
        column_id: ColumnId,
        updates: &[OrderUpdate<TaskId>],
    ) -> BoardRepositoryResult<()> {
        for update in updates {
            self.record_write()?;
            let task = self
                .state
                .tasks
                .get_mut(&update.id)
                .filter(|task| task.column_id() == column_id)
                .ok_or(BoardRepositoryError::TaskNotFound(update.id))?;
            task.reposition(update.position);
        }
        Ok(())
    }

    fn move_task(
        &mut self,
        task_id: TaskId,
        column_id: ColumnId,
        position: Position,
        timestamp: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        self.record_write()?;
        if !self.state.columns.contains_key(&column_id) {
            return Err(BoardRepositoryError::ColumnNotFound(column_id));
        }
        let task = self
            .state
            .tasks
            .get_mut(&task_id)
            .ok_or(BoardRepositoryError::TaskNotFound(task_id))?;
        task.transfer(column_id, position, timestamp);
        Ok(())
    }

    fn insert_column(&mut self, column: &Column) -> BoardRepositoryResult<()> {
        self.record_write()?;
        if self.state.columns.contains_key(&column.id()) {
            return Err(BoardRepositoryError::DuplicateColumn(column.id()));
        }
        if !self.state.boards.contains_key(&column.board_id()) {
            return Err(BoardRepositoryError::BoardNotFound(column.board_id()));
        }
        self.state.columns.insert(column.id(), column.clone());
        Ok(())
    }

    fn insert_task(&mut self, task: &Task) -> BoardRepositoryResult<()> {
        self.record_write()?;
        if self.state.tasks.contains_key(&task.id()) {
            return Err(BoardRepositoryError::DuplicateTask(task.id()));
        }
        if !self.state.columns.contains_key(&task.column_id()) {
            return Err(BoardRepositoryError::ColumnNotFound(task.column_id()));
        }
        self.state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    fn delete_column(&mut self, column_id: ColumnId) -> BoardRepositoryResult<()> {
        self.record_write()?;
        if self.state.columns.remove(&column_id).is_none() {
            return Err(BoardRepositoryError::ColumnNotFound(column_id));
        }
        self.state
            .tasks
            .retain(|_, task| task.column_id() != column_id);
        Ok(())
    }

    fn delete_task(&mut self, task_id: TaskId) -> BoardRepositoryResult<()> {
        self.record_write()?;
        self.state
            .tasks
            .remove(&task_id)
            .map(|_| ())
            .ok_or(BoardRepositoryError::TaskNotFound(task_id))
    }

    fn touch_board(
        &mut self,
        board_id: BoardId,
        timestamp: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        self.record_write()?;
        let board = self
            .state
            .boards
            .get_mut(&board_id)
            .ok_or(BoardRepositoryError::BoardNotFound(board_id))?;
        board.touch(timestamp);
        Ok(())
    }
}
