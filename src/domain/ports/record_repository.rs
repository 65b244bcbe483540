/// Record repository port (trait) for dependency injection.
///
/// Defines the contract for cognitive-record storage that infrastructure
/// adapters must implement. The engine treats storage as a keyed
/// read/overwrite: one record per conversation, last writer wins. Turn
/// seriality per conversation makes that sufficient.
use crate::domain::models::CognitiveRecord;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for cognitive-record persistence
///
/// Implementations should handle:
/// - JSON serialization/deserialization of the record payload
/// - Concurrent access across conversations (within one conversation the
///   orchestrator guarantees turn-at-a-time access)
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Retrieves the record for a conversation
    ///
    /// # Returns
    /// - `Some(CognitiveRecord)` if the conversation has a record
    /// - `None` for a conversation that has not produced a turn yet
    ///
    /// # Errors
    /// Returns error if the store is unreachable or the payload fails to
    /// deserialize.
    async fn load(&self, conversation_id: Uuid) -> Result<Option<CognitiveRecord>>;

    /// Inserts or overwrites the record for its conversation
    ///
    /// # Errors
    /// Returns error if the store is unreachable or the payload fails to
    /// serialize. A failed save means the turn is not committed.
    async fn save(&self, record: &CognitiveRecord) -> Result<()>;
}
