use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::db::store::{CheckpointStore, MasteryStore, StoreError};
use crate::models::{CheckpointRecord, MasteryRecord};

/// Process-local record store. Used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    mastery: RwLock<HashMap<(String, String), MasteryRecord>>,
    checkpoints: RwLock<HashMap<(String, u8), CheckpointRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_checkpoint(&self, learner_id: &str, tier: u8) -> Option<CheckpointRecord> {
        self.checkpoints
            .write()
            .remove(&(learner_id.to_string(), tier))
    }
}

#[async_trait]
impl MasteryStore for MemoryStore {
    async fn list_mastery(&self, learner_id: &str) -> Result<Vec<MasteryRecord>, StoreError> {
        let guard = self.mastery.read();
        let mut records: Vec<MasteryRecord> = guard
            .values()
            .filter(|r| r.learner_id == learner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.topic_key.cmp(&b.topic_key));
        Ok(records)
    }

    async fn get_mastery(
        &self,
        learner_id: &str,
        topic_key: &str,
    ) -> Result<Option<MasteryRecord>, StoreError> {
        let key = (learner_id.to_string(), topic_key.to_string());
        Ok(self.mastery.read().get(&key).cloned())
    }

    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        let key = (record.learner_id.clone(), record.topic_key.clone());
        self.mastery.write().insert(key, record.clone());
        Ok(())
    }

    async fn initialize_mastery(
        &self,
        learner_id: &str,
        topic_keys: &[String],
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut guard = self.mastery.write();
        for topic_key in topic_keys {
            guard
                .entry((learner_id.to_string(), topic_key.clone()))
                .or_insert_with(|| MasteryRecord::empty(learner_id, topic_key, now));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn list_checkpoints(
        &self,
        learner_id: &str,
    ) -> Result<Vec<CheckpointRecord>, StoreError> {
        let guard = self.checkpoints.read();
        let mut records: Vec<CheckpointRecord> = guard
            .values()
            .filter(|r| r.learner_id == learner_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.tier);
        Ok(records)
    }

    async fn get_checkpoint(
        &self,
        learner_id: &str,
        tier: u8,
    ) -> Result<Option<CheckpointRecord>, StoreError> {
        Ok(self
            .checkpoints
            .read()
            .get(&(learner_id.to_string(), tier))
            .cloned())
    }

    async fn record_attempt(
        &self,
        learner_id: &str,
        tier: u8,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckpointRecord>, StoreError> {
        let mut guard = self.checkpoints.write();
        let Some(record) = guard.get_mut(&(learner_id.to_string(), tier)) else {
            return Ok(None);
        };
        record.attempts = record.attempts.saturating_add(1);
        record.last_attempt_at = Some(at);
        record.submitted_code = Some(code.to_string());
        Ok(Some(record.clone()))
    }

    async fn mark_passed(
        &self,
        learner_id: &str,
        tier: u8,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(record) = self
            .checkpoints
            .write()
            .get_mut(&(learner_id.to_string(), tier))
        {
            record.is_passed = true;
            record.passed_at.get_or_insert(at);
        }
        Ok(())
    }

    async fn initialize_checkpoints(
        &self,
        learner_id: &str,
        tiers: &[u8],
    ) -> Result<bool, StoreError> {
        let mut guard = self.checkpoints.write();
        let mut created = false;
        for &tier in tiers {
            guard
                .entry((learner_id.to_string(), tier))
                .or_insert_with(|| {
                    created = true;
                    CheckpointRecord::initial(learner_id, tier)
                });
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.initialize_checkpoints("u1", &[0, 1, 2]).await.unwrap());
        store.record_attempt("u1", 1, "code", Utc::now()).await.unwrap();
        assert!(!store.initialize_checkpoints("u1", &[0, 1, 2]).await.unwrap());

        let cp = store.get_checkpoint("u1", 1).await.unwrap().unwrap();
        assert_eq!(cp.attempts, 1);
        assert_eq!(store.list_checkpoints("u1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_record_attempt_missing_record() {
        let store = MemoryStore::new();
        let result = store.record_attempt("ghost", 0, "x", Utc::now()).await.unwrap();
        assert!(result.is_none());
        assert!(store.list_checkpoints("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_passed_keeps_first_timestamp() {
        let store = MemoryStore::new();
        store.initialize_checkpoints("u1", &[0]).await.unwrap();
        let first = Utc::now();
        store.mark_passed("u1", 0, first).await.unwrap();
        store
            .mark_passed("u1", 0, first + chrono::Duration::seconds(60))
            .await
            .unwrap();

        let cp = store.get_checkpoint("u1", 0).await.unwrap().unwrap();
        assert!(cp.is_passed);
        assert_eq!(cp.passed_at, Some(first));
    }

    #[tokio::test]
    async fn test_mastery_scoped_per_learner() {
        let store = MemoryStore::new();
        let keys = vec!["ARRAY_SCAN".to_string(), "HASHING".to_string()];
        store.initialize_mastery("a", &keys).await.unwrap();
        store.initialize_mastery("b", &keys[..1]).await.unwrap();

        assert_eq!(store.list_mastery("a").await.unwrap().len(), 2);
        assert_eq!(store.list_mastery("b").await.unwrap().len(), 1);
        assert!(store.get_mastery("b", "HASHING").await.unwrap().is_none());
    }
}
