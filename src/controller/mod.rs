//! Controller module - Analysis state machine

mod state;
mod ui_controller;

pub use ui_controller::{Submission, UiController};
