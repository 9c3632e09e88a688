use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::curriculum::{Curriculum, TopicDef};
use crate::db::store::{CheckpointStore, MasteryStore, StoreError};
use crate::models::{
    CheckpointRecord, CheckpointStatus, CheckpointStatuses, JudgeResponse, JudgeVerdict,
    MasteryData, MasteryRecord, MasterySnapshot, TopicStatus,
};
use crate::services::eligibility::{is_eligible, topic_statuses};
use crate::services::judge::AiJudge;
use crate::services::key_lock::KeyedLocks;
use crate::services::llm_provider::LLMError;
use crate::services::mastery::record_solve;

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("{0}")]
    Validation(String),
    #[error("learner {0} has not been initialized")]
    LearnerNotFound(String),
    #[error("checkpoint record missing for tier {tier}")]
    CheckpointNotFound { tier: u8 },
    #[error("problem not found: {0}")]
    ProblemNotFound(String),
    #[error("complete every tier {tier} topic before attempting its checkpoint")]
    NotEligible { tier: u8 },
    #[error("judge unavailable: {0}")]
    Upstream(#[from] LLMError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Gates checkpoint attempts on mastery and drives the attempt/judge/record cycle.
pub struct ProgressionEngine {
    mastery: Arc<dyn MasteryStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    judge: AiJudge,
    curriculum: Arc<Curriculum>,
    checkpoint_locks: KeyedLocks<(String, u8)>,
    mastery_locks: KeyedLocks<(String, String)>,
}

impl ProgressionEngine {
    pub fn new(
        mastery: Arc<dyn MasteryStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        judge: AiJudge,
        curriculum: Arc<Curriculum>,
    ) -> Self {
        Self {
            mastery,
            checkpoints,
            judge,
            curriculum,
            checkpoint_locks: KeyedLocks::new(),
            mastery_locks: KeyedLocks::new(),
        }
    }

    /// Seeds one checkpoint per tier and one mastery record per topic.
    /// Returns true when any checkpoint record was newly created.
    pub async fn initialize_learner(&self, learner_id: &str) -> Result<bool, ProgressionError> {
        if learner_id.trim().is_empty() {
            return Err(ProgressionError::Validation("learner id is required".into()));
        }

        let tiers: Vec<u8> = self.curriculum.tiers().collect();
        let created = self
            .checkpoints
            .initialize_checkpoints(learner_id, &tiers)
            .await?;
        self.mastery
            .initialize_mastery(learner_id, &self.curriculum.topic_keys())
            .await?;

        if created {
            info!(learner_id, tiers = tiers.len(), "Learner initialized");
        } else {
            debug!(learner_id, "Learner already initialized");
        }
        Ok(created)
    }

    pub async fn get_checkpoint_statuses(
        &self,
        learner_id: &str,
    ) -> Result<CheckpointStatuses, ProgressionError> {
        let records = self.checkpoints.list_checkpoints(learner_id).await?;
        let snapshot = self.snapshot(learner_id).await?;

        let statuses = self
            .curriculum
            .tiers()
            .map(|tier| {
                let record = records.iter().find(|r| r.tier == tier);
                let status = CheckpointStatus {
                    tier_number: tier,
                    is_passed: record.is_some_and(|r| r.is_passed),
                    attempts: record.map(|r| r.attempts).unwrap_or(0),
                    can_attempt: is_eligible(self.curriculum.tier_topics(tier), &snapshot),
                };
                (tier, status)
            })
            .collect();

        Ok(statuses)
    }

    pub async fn attempt_checkpoint(
        &self,
        learner_id: &str,
        tier: u8,
        code: &str,
    ) -> Result<JudgeResponse, ProgressionError> {
        if !self.curriculum.has_tier(tier) {
            return Err(ProgressionError::Validation(format!("unknown tier {tier}")));
        }
        if code.trim().is_empty() {
            return Err(ProgressionError::Validation("code is required".into()));
        }

        let _guard = self
            .checkpoint_locks
            .lock((learner_id.to_string(), tier))
            .await;

        let existing = self.checkpoints.get_checkpoint(learner_id, tier).await?;
        if existing.is_none() {
            error!(learner_id, tier, "Checkpoint record missing; learner was not initialized");
            return Err(ProgressionError::CheckpointNotFound { tier });
        }

        let snapshot = self.snapshot(learner_id).await?;
        if !is_eligible(self.curriculum.tier_topics(tier), &snapshot) {
            debug!(learner_id, tier, "Checkpoint attempt rejected: not eligible");
            return Err(ProgressionError::NotEligible { tier });
        }

        let problem = self.curriculum.checkpoint(tier).ok_or_else(|| {
            ProgressionError::ProblemNotFound(format!("checkpoint problem for tier {tier}"))
        })?;

        let recorded = self
            .checkpoints
            .record_attempt(learner_id, tier, code, Utc::now())
            .await?
            .ok_or(ProgressionError::CheckpointNotFound { tier })?;

        let verdict = self
            .judge
            .judge_checkpoint(code, tier, &problem.required_patterns, &problem.description)
            .await
            .inspect_err(|e| {
                warn!(learner_id, tier, attempts = recorded.attempts, error = %e, "Checkpoint judge failed");
            })?;

        let advanced = verdict.verdict.is_advance();
        if advanced {
            self.checkpoints
                .mark_passed(learner_id, tier, Utc::now())
                .await?;
            info!(learner_id, tier, attempts = recorded.attempts, "Checkpoint passed");
        } else {
            info!(learner_id, tier, attempts = recorded.attempts, verdict = ?verdict.verdict, "Checkpoint not passed");
        }

        Ok(JudgeResponse {
            verdict: verdict.verdict,
            feedback: verdict.feedback,
            patterns_found: verdict.patterns_found,
            missing_patterns: verdict.missing_patterns,
            is_passed: recorded.is_passed || advanced,
            attempts: recorded.attempts,
        })
    }

    pub async fn get_mastery(&self, learner_id: &str) -> Result<MasterySnapshot, ProgressionError> {
        self.snapshot(learner_id).await
    }

    /// Direct client write of a topic's confidence and solved list.
    pub async fn update_mastery(
        &self,
        learner_id: &str,
        topic_key: &str,
        confidence: i32,
        solved: Vec<String>,
    ) -> Result<(), ProgressionError> {
        self.require_topic(topic_key)?;
        if !(0..=100).contains(&confidence) {
            return Err(ProgressionError::Validation(
                "confidence must be between 0 and 100".into(),
            ));
        }
        self.require_learner(learner_id).await?;

        let _guard = self
            .mastery_locks
            .lock((learner_id.to_string(), topic_key.to_string()))
            .await;

        let record = MasteryRecord {
            learner_id: learner_id.to_string(),
            topic_key: topic_key.to_string(),
            confidence,
            solved_problems: solved.into_iter().collect(),
            updated_at: Utc::now(),
        };
        self.mastery.upsert_mastery(&record).await?;
        Ok(())
    }

    /// Judges a single practice problem and, on success, counts it toward the topic.
    pub async fn judge_problem(
        &self,
        learner_id: &str,
        topic_key: &str,
        problem_id: &str,
        code: &str,
    ) -> Result<JudgeVerdict, ProgressionError> {
        let topic = self.require_topic(topic_key)?;
        if code.trim().is_empty() {
            return Err(ProgressionError::Validation("code is required".into()));
        }
        let problem = self
            .curriculum
            .problem(topic_key, problem_id)
            .ok_or_else(|| ProgressionError::ProblemNotFound(format!("{topic_key}/{problem_id}")))?;
        self.require_learner(learner_id).await?;

        let verdict = self
            .judge
            .judge_single(code, &topic.label, &problem.title, &problem.invariant)
            .await?;

        if verdict.verdict.is_advance() {
            let _guard = self
                .mastery_locks
                .lock((learner_id.to_string(), topic_key.to_string()))
                .await;

            let now = Utc::now();
            let mut record = self
                .mastery
                .get_mastery(learner_id, topic_key)
                .await?
                .unwrap_or_else(|| MasteryRecord::empty(learner_id, topic_key, now));

            let previous = record.confidence;
            let newly_solved = record_solve(&mut record, problem_id, now);
            if newly_solved || record.confidence != previous {
                self.mastery.upsert_mastery(&record).await?;
                info!(learner_id, topic_key, problem_id, confidence = record.confidence, "Problem solved");
            } else {
                debug!(learner_id, topic_key, problem_id, "Problem already counted");
            }
        }

        Ok(verdict)
    }

    pub async fn topic_statuses(
        &self,
        learner_id: &str,
    ) -> Result<HashMap<String, TopicStatus>, ProgressionError> {
        let snapshot = self.snapshot(learner_id).await?;
        Ok(topic_statuses(&self.curriculum, &snapshot))
    }

    pub async fn chat(&self, topic_key: &str, message: &str) -> Result<String, ProgressionError> {
        let topic = self.require_topic(topic_key)?;
        if message.trim().is_empty() {
            return Err(ProgressionError::Validation("message is required".into()));
        }
        Ok(self.judge.chat(&topic.label, message).await?)
    }

    pub async fn analyze_complexity(&self, code: &str) -> Result<String, ProgressionError> {
        if code.trim().is_empty() {
            return Err(ProgressionError::Validation("code is required".into()));
        }
        Ok(self.judge.analyze_complexity(code).await?)
    }

    async fn snapshot(&self, learner_id: &str) -> Result<MasterySnapshot, ProgressionError> {
        let records = self.mastery.list_mastery(learner_id).await?;
        Ok(records
            .into_iter()
            .map(|r| {
                (
                    r.topic_key,
                    MasteryData {
                        confidence: r.confidence,
                        solved: r.solved_problems.into_iter().collect(),
                    },
                )
            })
            .collect())
    }

    fn require_topic(&self, topic_key: &str) -> Result<&TopicDef, ProgressionError> {
        self.curriculum
            .topic(topic_key)
            .ok_or_else(|| ProgressionError::Validation(format!("unknown topic {topic_key}")))
    }

    async fn require_learner(&self, learner_id: &str) -> Result<(), ProgressionError> {
        let records: Vec<CheckpointRecord> = self.checkpoints.list_checkpoints(learner_id).await?;
        if records.is_empty() {
            return Err(ProgressionError::LearnerNotFound(learner_id.to_string()));
        }
        Ok(())
    }
}
