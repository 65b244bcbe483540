//! SQLite persistence adapters for the dialogue engine.

pub mod connection;
pub mod record_repository;

pub use connection::{create_pool, ConnectionError, PoolConfig};
pub use record_repository::SqliteRecordRepository;
