//! Conversational turn engine.

pub mod context;
pub mod engine;

pub use engine::{TurnEngine, TurnOptions, TurnOutcome};
