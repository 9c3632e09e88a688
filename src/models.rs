use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub learner_id: String,
    pub topic_key: String,
    pub confidence: i32,
    pub solved_problems: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}

impl MasteryRecord {
    pub fn empty(learner_id: &str, topic_key: &str, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            topic_key: topic_key.to_string(),
            confidence: 0,
            solved_problems: BTreeSet::new(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointRecord {
    pub learner_id: String,
    pub tier: u8,
    pub is_passed: bool,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub passed_at: Option<DateTime<Utc>>,
    pub submitted_code: Option<String>,
}

impl CheckpointRecord {
    pub fn initial(learner_id: &str, tier: u8) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            tier,
            is_passed: false,
            attempts: 0,
            last_attempt_at: None,
            passed_at: None,
            submitted_code: None,
        }
    }
}

/// Categorical outcome of a judging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Advance,
    Repeat,
    Error,
}

impl Verdict {
    pub fn is_advance(self) -> bool {
        self == Verdict::Advance
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub verdict: Verdict,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns_found: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgeResponse {
    pub verdict: Verdict,
    pub feedback: String,
    pub patterns_found: Vec<String>,
    pub missing_patterns: Vec<String>,
    pub is_passed: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointStatus {
    pub tier_number: u8,
    pub is_passed: bool,
    pub attempts: u32,
    pub can_attempt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasteryData {
    pub confidence: i32,
    pub solved: Vec<String>,
}

pub type CheckpointStatuses = BTreeMap<u8, CheckpointStatus>;
pub type MasterySnapshot = BTreeMap<String, MasteryData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicStatus {
    Locked,
    Unlocked,
    InProgress,
    Mastered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_wire_names() {
        assert_eq!(serde_json::to_string(&Verdict::Advance).unwrap(), "\"ADVANCE\"");
        assert_eq!(serde_json::to_string(&Verdict::Repeat).unwrap(), "\"REPEAT\"");
        assert_eq!(serde_json::to_string(&Verdict::Error).unwrap(), "\"ERROR\"");
    }

    #[test]
    fn test_single_verdict_omits_empty_patterns() {
        let verdict = JudgeVerdict {
            verdict: Verdict::Repeat,
            feedback: "brute force".into(),
            patterns_found: Vec::new(),
            missing_patterns: Vec::new(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert!(json.get("patterns_found").is_none());
        assert_eq!(json["verdict"], "REPEAT");
    }
}
