//! Port contracts for reaching the board server.

mod api;

pub use api::{ApiError, BoardApi};
