#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;

use skilltree_backend::auth::{sign_hs256, Hs256Verifier};
use skilltree_backend::curriculum::Curriculum;
use skilltree_backend::db::{MasteryStore, MemoryStore};
use skilltree_backend::models::MasteryRecord;
use skilltree_backend::services::llm_provider::{GenerationRequest, LLMError, TextGenerator};
use skilltree_backend::services::{AiJudge, ProgressionEngine};
use skilltree_backend::state::AppState;

pub const JWT_SECRET: &str = "integration-secret";

pub const ADVANCE_REPLY: &str = r#"```json
{"verdict":"ADVANCE","feedback":"All patterns present.","patterns_found":["Array Iteration","Recursive Backtracking"],"missing_patterns":[]}
```"#;

pub const REPEAT_REPLY: &str = r#"{"verdict":"REPEAT","feedback":"Brute force.","patterns_found":["Array Iteration"],"missing_patterns":["Recursive Backtracking"]}"#;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

impl Reply {
    pub fn text(value: &str) -> Self {
        Reply::Text(value.to_string())
    }
}

/// Plays back replies in order and repeats the last one once the script runs out.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(reply: &str) -> Arc<Self> {
        Self::new(vec![Reply::text(reply)])
    }

    pub fn failing() -> Arc<Self> {
        Self::new(vec![Reply::Fail])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut replies = self.replies.lock();
            if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies.first().cloned().unwrap_or(Reply::Fail)
            }
        };

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(LLMError::Exhausted {
                attempts: 3,
                last: Box::new(LLMError::EmptyChoices),
            }),
        }
    }
}

pub struct Harness {
    pub engine: Arc<ProgressionEngine>,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn harness(generator: Arc<ScriptedGenerator>) -> Harness {
    harness_with(generator, Curriculum::standard())
}

pub fn harness_with(generator: Arc<ScriptedGenerator>, curriculum: Curriculum) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let engine = ProgressionEngine::new(
        store.clone(),
        store.clone(),
        AiJudge::new(generator.clone()),
        Arc::new(curriculum),
    );

    Harness {
        engine: Arc::new(engine),
        store,
        generator,
    }
}

pub async fn set_confidence(store: &MemoryStore, learner_id: &str, entries: &[(&str, i32)]) {
    for (topic, confidence) in entries {
        let mut record = MasteryRecord::empty(learner_id, topic, Utc::now());
        record.confidence = *confidence;
        store.upsert_mastery(&record).await.unwrap();
    }
}

/// Router over an in-memory store with a scripted judge.
pub fn create_test_app(generator: Arc<ScriptedGenerator>) -> (Router, Harness) {
    let harness = harness(generator);
    let state = AppState::new(
        harness.engine.clone(),
        Arc::new(Hs256Verifier::new(Some(JWT_SECRET.to_string()))),
        None,
    );
    (skilltree_backend::build_app(state), harness)
}

pub fn bearer(subject: &str) -> String {
    let token = sign_hs256(subject, JWT_SECRET, 3600).unwrap();
    format!("Bearer {token}")
}

pub fn problems_for(topic: &str, ids: &[&str]) -> HashMap<String, Vec<skilltree_backend::curriculum::Problem>> {
    let problems = ids
        .iter()
        .map(|id| skilltree_backend::curriculum::Problem {
            id: id.to_string(),
            title: format!("Problem {id}"),
            difficulty: skilltree_backend::curriculum::Difficulty::Easy,
            invariant: "keep a seen set".to_string(),
        })
        .collect();
    HashMap::from([(topic.to_string(), problems)])
}
