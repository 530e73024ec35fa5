//! Live audio turn engine.

pub mod audio;
pub mod clock;
pub mod engine;
pub mod state;
pub mod transcript;

pub use audio::{AudioSink, AudioSource};
pub use engine::{LiveOutcome, LiveTurnEngine};
pub use state::LiveState;
