//! Domain model for boards, columns, tasks, and their sibling ordering.
//!
//! Columns are ordered within a board and tasks within a column. Both use
//! the same planner in [`ordering`], which keeps sibling positions dense.
//! Infrastructure concerns stay outside this boundary.

mod board;
mod column;
mod error;
mod ids;
pub mod ordering;
mod task;

pub use board::{Board, BoardSnapshot, BoardSummary, ColumnSnapshot, PersistedBoardData};
pub use column::Column;
pub use error::{BoardDomainError, OrderingError, ParsePriorityError};
pub use ids::{BoardId, ColumnId, Position, TaskId};
pub use ordering::{MovePlan, OrderUpdate, Sibling};
pub use task::{NewTask, PersistedTaskData, Priority, Task};
