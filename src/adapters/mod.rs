//! Infrastructure adapters for external systems.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRecordRepository;
pub use sqlite::SqliteRecordRepository;
