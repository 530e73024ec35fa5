//! Owned application state.

pub mod owner;

pub use owner::{keys, StateOwner};
