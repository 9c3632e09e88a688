use chrono::{DateTime, Utc};

use crate::curriculum::MASTERED_CONFIDENCE;
use crate::models::MasteryRecord;

/// Distinct solves needed to reach full confidence.
pub const SOLVES_FOR_MASTERY: usize = 3;

/// `min(100, floor(solved * 100 / 3))`: 0, 33, 66, 100, then clamped.
pub fn confidence_for(solved_count: usize) -> i32 {
    let scaled = solved_count.saturating_mul(MASTERED_CONFIDENCE as usize) / SOLVES_FOR_MASTERY;
    scaled.min(MASTERED_CONFIDENCE as usize) as i32
}

/// Adds `problem_id` to the solved set and recomputes confidence.
/// Returns false when the problem was already counted.
pub fn record_solve(record: &mut MasteryRecord, problem_id: &str, now: DateTime<Utc>) -> bool {
    let inserted = record.solved_problems.insert(problem_id.to_string());
    record.confidence = confidence_for(record.solved_problems.len());
    record.updated_at = now;
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_steps() {
        let steps: Vec<i32> = (0..=5).map(confidence_for).collect();
        assert_eq!(steps, vec![0, 33, 66, 100, 100, 100]);
    }

    #[test]
    fn test_record_solve_is_idempotent() {
        let now = Utc::now();
        let mut record = MasteryRecord::empty("u1", "HASHING", now);

        assert!(record_solve(&mut record, "two-sum", now));
        assert_eq!(record.confidence, 33);
        assert!(!record_solve(&mut record, "two-sum", now));
        assert_eq!(record.confidence, 33);
        assert_eq!(record.solved_problems.len(), 1);
    }

    #[test]
    fn test_record_solve_recomputes_from_set() {
        let now = Utc::now();
        let mut record = MasteryRecord::empty("u1", "HASHING", now);
        record.confidence = 90;
        record_solve(&mut record, "a", now);
        assert_eq!(record.confidence, 33);
    }
}
