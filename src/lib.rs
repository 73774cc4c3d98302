//! Kanban: boards, columns, and tasks with dense drag-and-drop ordering.
//!
//! Sibling columns within a board and sibling tasks within a column hold the
//! positions `0..count` after every create, delete, reorder, and move. The
//! server applies each change in one storage transaction; the client mirrors
//! it optimistically and reloads when the server refuses.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-process)
//!
//! # Modules
//!
//! - [`board`]: Server-side board model, ordering, and persistence
//! - [`client`]: Optimistic client controller
//! - [`config`]: Runtime configuration

pub mod board;
pub mod client;
pub mod config;
