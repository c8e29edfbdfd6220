//! Reward-modulated learning - dopaminergic feedback signals.
//!
//! The user's natural-language feedback is scanned against a small bilingual
//! signal lexicon. A confident non-neutral signal is applied to the most
//! recently accessed engrams with an eligibility-trace discount: reward is
//! temporally diffuse, so the last few memories share it, most recent first.
//!
//! Positive feedback raises importance (faster consolidation) and nudges the
//! working trace up; negative feedback lowers importance and suppresses the
//! working trace. Pinned engrams are exempt.

use crate::config::EngramConfig;
use crate::error::Result;
use crate::memory::Polarity;
use crate::storage::Store;

/// Positive feedback signals (Chinese + English).
pub const POSITIVE_SIGNALS: &[&str] = &[
    "好的", "不错", "对", "对的", "很好", "棒", "可以", "行",
    "good", "nice", "correct", "yes", "right", "exactly", "perfect",
    "great", "thanks", "thank you", "awesome", "love it", "well done",
];

/// Negative feedback signals (Chinese + English).
pub const NEGATIVE_SIGNALS: &[&str] = &[
    "不对", "别这样", "错", "错了", "不行", "不好", "停", "别",
    "wrong", "no", "don't", "stop", "bad", "incorrect", "nope",
    "that's wrong", "not right", "undo", "cancel",
];

/// Detection confidence from a match count: 1 -> 0.5, 2 -> 0.75,
/// 3+ -> capped at 0.95.
fn match_confidence(matches: usize) -> f64 {
    (0.25 + 0.25 * matches as f64).min(0.95)
}

/// Detect feedback polarity in natural language.
///
/// Case-insensitive substring matching; multiple matching signals raise
/// confidence (additive evidence). Equal opposing counts are ambiguous and
/// come back neutral.
pub fn detect_feedback(text: &str) -> (Polarity, f64) {
    let text_lower = text.trim().to_lowercase();

    let pos_matches = POSITIVE_SIGNALS
        .iter()
        .filter(|s| text_lower.contains(&s.to_lowercase()))
        .count();
    let neg_matches = NEGATIVE_SIGNALS
        .iter()
        .filter(|s| text_lower.contains(&s.to_lowercase()))
        .count();

    if pos_matches == 0 && neg_matches == 0 {
        return (Polarity::Neutral, 0.0);
    }

    if pos_matches > neg_matches {
        (Polarity::Positive, match_confidence(pos_matches))
    } else if neg_matches > pos_matches {
        (Polarity::Negative, match_confidence(neg_matches))
    } else {
        (Polarity::Neutral, 0.1)
    }
}

/// Apply reward or punishment to the `recent_n` most recently accessed
/// engrams, discounted down the eligibility trace.
///
/// Returns the number of engrams actually modified. Pinned engrams occupy
/// their slot in the trace but are left untouched.
pub fn apply_reward(
    store: &dyn Store,
    polarity: Polarity,
    recent_n: usize,
    magnitude: f64,
    config: &EngramConfig,
) -> Result<usize> {
    if polarity == Polarity::Neutral || recent_n == 0 {
        return Ok(0);
    }

    let mut engrams = store.all()?;
    if engrams.is_empty() {
        return Ok(0);
    }

    engrams.sort_by(|a, b| {
        b.last_access()
            .partial_cmp(&a.last_access())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    engrams.truncate(recent_n);

    let mut touched = Vec::new();
    for (i, mut engram) in engrams.into_iter().enumerate() {
        if engram.pinned {
            continue;
        }

        // Eligibility trace decay over the recency index
        let discount = 1.0 / (1.0 + config.reward_temporal_discount * i as f64);

        match polarity {
            Polarity::Positive => {
                engram.importance = (engram.importance + magnitude * discount).min(1.0);
                engram.working_strength += config.reward_strength_boost * discount;
            }
            Polarity::Negative => {
                engram.importance = (engram.importance - magnitude * discount).max(0.0);
                engram.working_strength *= 1.0 - config.reward_suppression * discount;
            }
            Polarity::Neutral => unreachable!(),
        }

        touched.push(engram);
    }

    tracing::debug!(
        polarity = ?polarity,
        magnitude,
        applied = touched.len(),
        "reward applied"
    );

    store.update_batch(&touched)?;
    Ok(touched.len())
}
