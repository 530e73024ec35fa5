//! Persistence abstraction.

pub mod kv;

pub use kv::{KvStore, MemoryKvStore};
