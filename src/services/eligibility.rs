use std::collections::HashMap;

use crate::curriculum::{Curriculum, CONFIDENCE_THRESHOLD, MASTERED_CONFIDENCE};
use crate::models::{MasterySnapshot, TopicStatus};

/// True iff every topic in `tier_topics` has a mastery entry at or above the threshold.
///
/// An empty topic set is never eligible. A topic missing from the snapshot fails closed.
pub fn is_eligible(tier_topics: &[String], snapshot: &MasterySnapshot) -> bool {
    !tier_topics.is_empty()
        && tier_topics.iter().all(|topic| {
            snapshot
                .get(topic)
                .is_some_and(|m| m.confidence >= CONFIDENCE_THRESHOLD)
        })
}

fn confidence_of(snapshot: &MasterySnapshot, topic: &str) -> i32 {
    snapshot.get(topic).map(|m| m.confidence).unwrap_or(0)
}

/// Informational per-topic status. Never consulted by checkpoint gating.
pub fn topic_status(prerequisites: &[String], confidence: i32, snapshot: &MasterySnapshot) -> TopicStatus {
    if confidence >= MASTERED_CONFIDENCE {
        TopicStatus::Mastered
    } else if confidence > 0 {
        TopicStatus::InProgress
    } else if prerequisites
        .iter()
        .all(|req| confidence_of(snapshot, req) >= CONFIDENCE_THRESHOLD)
    {
        TopicStatus::Unlocked
    } else {
        TopicStatus::Locked
    }
}

pub fn topic_statuses(curriculum: &Curriculum, snapshot: &MasterySnapshot) -> HashMap<String, TopicStatus> {
    curriculum
        .topics()
        .iter()
        .map(|topic| {
            let status = topic_status(
                &topic.prerequisites,
                confidence_of(snapshot, &topic.key),
                snapshot,
            );
            (topic.key.clone(), status)
        })
        .collect()
}
