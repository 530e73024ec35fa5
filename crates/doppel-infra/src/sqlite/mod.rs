//! SQLite persistence: WAL-mode pool and the `KvStore` implementation.

pub mod kv;
pub mod pool;

pub use kv::SqliteKvStore;
pub use pool::DatabasePool;
