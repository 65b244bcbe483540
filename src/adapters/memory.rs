//! In-process `RecordRepository` for tests and single-process demos.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::CognitiveRecord;
use crate::domain::ports::RecordRepository;

/// HashMap-backed repository with the same keyed read/overwrite semantics as
/// the SQLite adapter.
#[derive(Default)]
pub struct InMemoryRecordRepository {
    records: RwLock<HashMap<Uuid, CognitiveRecord>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn load(&self, conversation_id: Uuid) -> Result<Option<CognitiveRecord>> {
        Ok(self.records.read().await.get(&conversation_id).cloned())
    }

    async fn save(&self, record: &CognitiveRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.conversation_id, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let repo = InMemoryRecordRepository::new();
        let id = Uuid::new_v4();
        assert!(repo.load(id).await.unwrap().is_none());

        let mut record = CognitiveRecord::new(id);
        repo.save(&record).await.unwrap();
        assert_eq!(repo.load(id).await.unwrap().unwrap(), record);

        record.fields.topic = Some("overwritten".to_string());
        repo.save(&record).await.unwrap();
        assert_eq!(
            repo.load(id).await.unwrap().unwrap().fields.topic.as_deref(),
            Some("overwritten")
        );
    }
}
