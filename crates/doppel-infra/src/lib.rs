//! Infrastructure layer for Doppel.
//!
//! Concrete implementations of the traits defined in `doppel-core`:
//! SQLite key/value storage, the Gemini HTTP and Live WebSocket
//! providers, API key resolution, raw-PCM file audio adapters, and
//! config/data-directory handling.

pub mod audio;
pub mod config;
pub mod gemini;
pub mod paths;
pub mod secret;
pub mod sqlite;
