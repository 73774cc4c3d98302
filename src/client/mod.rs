//! Optimistic client mirror of a board.
//!
//! A [`services::BoardController`] owns the view of one board. Drops are
//! spliced into the view at once and then sent to the server through the
//! [`ports::BoardApi`] port. A rejected request discards every optimistic
//! change by reloading the board.
//!
//! - Drag gestures and the view model in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The controller in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
