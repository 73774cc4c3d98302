//! Kanban boards with dense column and task ordering.
//!
//! Columns are ordered within a board and tasks within a column. Every
//! mutation that changes positions runs in one repository transaction and
//! leaves each scope holding the positions `0..count`. The module follows
//! hexagonal architecture:
//!
//! - Domain types and the ordering planner in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Request and response shapes in [`wire`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod wire;

#[cfg(test)]
mod tests;
