//! Adapter implementations of the client ports.

mod local;

pub use local::LocalBoardApi;
