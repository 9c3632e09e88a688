//! Property-based tests for checkpoint gating and confidence derivation.
//!
//! - Eligibility holds iff every tier topic is at or above 70
//! - Dropping any qualifying topic revokes eligibility
//! - Confidence follows min(100, floor(n * 100 / 3)) and is monotone
//! - Re-solving a problem never changes confidence

use std::collections::BTreeSet;

use chrono::Utc;
use proptest::prelude::*;

use skilltree_backend::curriculum::{Curriculum, CONFIDENCE_THRESHOLD};
use skilltree_backend::models::{MasteryData, MasteryRecord, MasterySnapshot};
use skilltree_backend::services::eligibility::is_eligible;
use skilltree_backend::services::mastery::{confidence_for, record_solve};

fn snapshot_of(topics: &[String], confidences: &[i32]) -> MasterySnapshot {
    topics
        .iter()
        .zip(confidences)
        .map(|(topic, confidence)| {
            (
                topic.clone(),
                MasteryData {
                    confidence: *confidence,
                    solved: Vec::new(),
                },
            )
        })
        .collect()
}

fn arb_tier() -> impl Strategy<Value = u8> {
    0u8..=6
}

proptest! {
    #[test]
    fn prop_eligible_iff_all_topics_ready(
        tier in arb_tier(),
        confidences in prop::collection::vec(0i32..=100, 4),
    ) {
        let curriculum = Curriculum::standard();
        let topics = curriculum.tier_topics(tier);
        let snapshot = snapshot_of(topics, &confidences);

        let expected = topics
            .iter()
            .zip(&confidences)
            .all(|(_, c)| *c >= CONFIDENCE_THRESHOLD);
        prop_assert_eq!(is_eligible(topics, &snapshot), expected);
    }

    #[test]
    fn prop_removing_a_ready_topic_revokes(
        tier in arb_tier(),
        confidences in prop::collection::vec(70i32..=100, 4),
        pick in any::<prop::sample::Index>(),
    ) {
        let curriculum = Curriculum::standard();
        let topics = curriculum.tier_topics(tier);
        let mut snapshot = snapshot_of(topics, &confidences);
        prop_assert!(is_eligible(topics, &snapshot));

        let removed = &topics[pick.index(topics.len())];
        snapshot.remove(removed);
        prop_assert!(!is_eligible(topics, &snapshot));
    }

    #[test]
    fn prop_confidence_formula(n in 0usize..1000) {
        let confidence = confidence_for(n);
        prop_assert_eq!(confidence, std::cmp::min(100, (n * 100 / 3) as i32));
        prop_assert!(confidence_for(n + 1) >= confidence);
    }

    #[test]
    fn prop_resolve_is_idempotent(ids in prop::collection::vec("[a-f]", 1..30)) {
        let now = Utc::now();
        let mut record = MasteryRecord::empty("u", "HASHING", now);
        for id in &ids {
            record_solve(&mut record, id, now);
        }

        let distinct: BTreeSet<&String> = ids.iter().collect();
        prop_assert_eq!(record.solved_problems.len(), distinct.len());
        prop_assert_eq!(record.confidence, confidence_for(distinct.len()));

        let before = record.confidence;
        record_solve(&mut record, &ids[0], now);
        prop_assert_eq!(record.confidence, before);
    }
}
