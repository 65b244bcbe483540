//! SQLite implementation of the `RecordRepository`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::CognitiveRecord;
use crate::domain::ports::RecordRepository;

/// Keyed read/overwrite store: one row per conversation, record serialized
/// as JSON. The denormalized `current_stage` column exists for ad hoc
/// inspection only; the JSON payload is authoritative.
#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn load(&self, conversation_id: Uuid) -> Result<Option<CognitiveRecord>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record FROM cognitive_records WHERE conversation_id = ?")
                .bind(conversation_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .context("failed to fetch cognitive record")?;

        row.map(|(payload,)| {
            serde_json::from_str(&payload).context("failed to deserialize cognitive record")
        })
        .transpose()
    }

    async fn save(&self, record: &CognitiveRecord) -> Result<()> {
        let payload =
            serde_json::to_string(record).context("failed to serialize cognitive record")?;

        sqlx::query(
            r"INSERT INTO cognitive_records (conversation_id, current_stage, record, updated_at)
              VALUES (?, ?, ?, ?)
              ON CONFLICT(conversation_id) DO UPDATE SET
                  current_stage = excluded.current_stage,
                  record = excluded.record,
                  updated_at = excluded.updated_at",
        )
        .bind(record.conversation_id.to_string())
        .bind(record.current_stage.label())
        .bind(&payload)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("failed to upsert cognitive record")?;

        Ok(())
    }
}
