//! Media generation jobs.

pub mod engine;

pub use engine::MediaEngine;
