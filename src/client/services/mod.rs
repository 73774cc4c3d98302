//! Client orchestration for optimistic drag-and-drop.

mod controller;

pub use controller::{
    BoardController, ControllerError, FAILURE_NOTICE, RELOAD_ATTEMPTS, SharedController, dispatch,
    share,
};
