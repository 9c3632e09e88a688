use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CheckpointRecord, MasteryRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },
}

/// Per-(learner, topic) confidence and solved-problem records.
#[async_trait]
pub trait MasteryStore: Send + Sync {
    async fn list_mastery(&self, learner_id: &str) -> Result<Vec<MasteryRecord>, StoreError>;

    async fn get_mastery(
        &self,
        learner_id: &str,
        topic_key: &str,
    ) -> Result<Option<MasteryRecord>, StoreError>;

    /// Insert or replace the record keyed by (learner, topic).
    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError>;

    /// Seed zero-confidence records; topics that already have a record are left alone.
    async fn initialize_mastery(
        &self,
        learner_id: &str,
        topic_keys: &[String],
    ) -> Result<(), StoreError>;
}

/// Per-(learner, tier) checkpoint records.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn list_checkpoints(&self, learner_id: &str)
        -> Result<Vec<CheckpointRecord>, StoreError>;

    async fn get_checkpoint(
        &self,
        learner_id: &str,
        tier: u8,
    ) -> Result<Option<CheckpointRecord>, StoreError>;

    /// Bumps the attempt counter and overwrites the submitted code.
    /// Returns the updated record, or `None` when no record exists.
    async fn record_attempt(
        &self,
        learner_id: &str,
        tier: u8,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckpointRecord>, StoreError>;

    /// One-way: sets `is_passed` and keeps the first `passed_at`.
    async fn mark_passed(
        &self,
        learner_id: &str,
        tier: u8,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Returns true when at least one record was created.
    async fn initialize_checkpoints(
        &self,
        learner_id: &str,
        tiers: &[u8],
    ) -> Result<bool, StoreError>;
}
