use super::domain::{EvaluationResult, HEURISTIC_CHANGE_MAX, HEURISTIC_CHANGE_MIN};
use super::keywords::classify;

pub(crate) const HEURISTIC_COMMENT: &str = "heuristic fallback";

const JITTER_MIN: i64 = -2;
const JITTER_MAX: i64 = 3;

/// Randomness seam for the fallback scorer so tests can pin the jitter.
pub trait JitterSource: Send + Sync {
    fn jitter(&self) -> i64;
}

/// Production jitter drawing from the thread-local fastrand generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformJitter;

impl JitterSource for UniformJitter {
    fn jitter(&self) -> i64 {
        fastrand::i64(JITTER_MIN..=JITTER_MAX)
    }
}

/// Offline scorer used whenever the external service cannot produce a
/// usable result. Always succeeds and never touches the network.
///
/// The violation screen is re-run here so the fallback stays safe even if
/// a caller reaches it directly.
pub fn heuristic_score(decision: &str, jitter: &dyn JitterSource) -> EvaluationResult {
    let classification = classify(decision);
    if classification.violation {
        return EvaluationResult::violation("");
    }

    let keyword_score = classification.positive_hits - classification.negative_hits;
    let change = (keyword_score * 50 + jitter.jitter() * 20)
        .clamp(HEURISTIC_CHANGE_MIN, HEURISTIC_CHANGE_MAX);

    EvaluationResult::scored(change, HEURISTIC_COMMENT.to_string(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::domain::VIOLATION_SENTINEL;

    struct FixedJitter(i64);

    impl JitterSource for FixedJitter {
        fn jitter(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn violating_decision_short_circuits() {
        let result = heuristic_score("bomb the rival temple", &FixedJitter(0));
        assert!(result.violation);
        assert_eq!(result.change, VIOLATION_SENTINEL);
    }

    #[test]
    fn keyword_balance_drives_the_score() {
        // two positive hits, one negative, no jitter: (2 - 1) * 50
        let result = heuristic_score(
            "open a charity shelter but punish gossip",
            &FixedJitter(0),
        );
        assert!(!result.violation);
        assert_eq!(result.change, 50);
        assert_eq!(result.comment, HEURISTIC_COMMENT);
        assert!(result.tips.is_empty());
    }

    #[test]
    fn jitter_shifts_the_score_by_twenty_per_step() {
        let base = heuristic_score("write new hymns", &FixedJitter(0));
        let shifted = heuristic_score("write new hymns", &FixedJitter(3));
        assert_eq!(shifted.change - base.change, 60);
    }

    #[test]
    fn change_is_clamped_to_the_heuristic_band() {
        let crowded = "charity kindness heal help teach festival community donate shelter harmony";
        let high = heuristic_score(crowded, &FixedJitter(JITTER_MAX));
        assert_eq!(high.change, HEURISTIC_CHANGE_MAX);

        let grim = "tithe punish forbid threaten fear demand exile shun curse confiscate";
        let low = heuristic_score(grim, &FixedJitter(JITTER_MIN));
        assert_eq!(low.change, HEURISTIC_CHANGE_MIN);
    }

    #[test]
    fn production_jitter_stays_in_band_after_clamp() {
        for _ in 0..64 {
            let result = heuristic_score("a quiet week of prayer", &UniformJitter);
            assert!(!result.violation);
            assert!(result.change >= HEURISTIC_CHANGE_MIN);
            assert!(result.change <= HEURISTIC_CHANGE_MAX);
        }
    }
}
