pub mod checkpoint;
pub mod mastery;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::store::{CheckpointStore, MasteryStore, StoreError};
use crate::db::DatabaseProxy;
use crate::models::{CheckpointRecord, MasteryRecord};

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgStore {
    proxy: Arc<DatabaseProxy>,
}

impl PgStore {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl MasteryStore for PgStore {
    async fn list_mastery(&self, learner_id: &str) -> Result<Vec<MasteryRecord>, StoreError> {
        mastery::select_user_mastery(&self.proxy, learner_id).await
    }

    async fn get_mastery(
        &self,
        learner_id: &str,
        topic_key: &str,
    ) -> Result<Option<MasteryRecord>, StoreError> {
        mastery::select_mastery(&self.proxy, learner_id, topic_key).await
    }

    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        mastery::upsert_mastery(&self.proxy, record).await
    }

    async fn initialize_mastery(
        &self,
        learner_id: &str,
        topic_keys: &[String],
    ) -> Result<(), StoreError> {
        mastery::insert_initial_mastery(&self.proxy, learner_id, topic_keys).await
    }
}

#[async_trait]
impl CheckpointStore for PgStore {
    async fn list_checkpoints(
        &self,
        learner_id: &str,
    ) -> Result<Vec<CheckpointRecord>, StoreError> {
        checkpoint::select_user_checkpoints(&self.proxy, learner_id).await
    }

    async fn get_checkpoint(
        &self,
        learner_id: &str,
        tier: u8,
    ) -> Result<Option<CheckpointRecord>, StoreError> {
        checkpoint::select_checkpoint(&self.proxy, learner_id, tier).await
    }

    async fn record_attempt(
        &self,
        learner_id: &str,
        tier: u8,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckpointRecord>, StoreError> {
        checkpoint::increment_attempt(&self.proxy, learner_id, tier, code, at).await
    }

    async fn mark_passed(
        &self,
        learner_id: &str,
        tier: u8,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        checkpoint::set_passed(&self.proxy, learner_id, tier, at).await
    }

    async fn initialize_checkpoints(
        &self,
        learner_id: &str,
        tiers: &[u8],
    ) -> Result<bool, StoreError> {
        checkpoint::insert_initial_checkpoints(&self.proxy, learner_id, tiers).await
    }
}
