//! ACT-R activation-based retrieval scoring.
//!
//! The core equation from Anderson's ACT-R theory:
//!
//! ```text
//! A_i = B_i + sum(W_j * S_ji) + w_imp * importance
//! ```
//!
//! Base-level activation follows the power law of practice and recency:
//!
//! ```text
//! B_i = ln(sum_k (now - t_k)^(-d))
//! ```
//!
//! where `t_k` ranges over the access history and `d` is the decay exponent
//! (default 0.5). Spreading activation approximates context fan-in with a
//! keyword overlap ratio. An engram with no recorded accesses has
//! `B = -inf` and is unretrievable.
//!
//! All functions are pure; `now` is passed in.

use crate::config::EngramConfig;
use crate::memory::Engram;

/// Minimum age in seconds when an access coincides with `now`, avoiding a
/// zero raised to a negative power.
const MIN_AGE_SECS: f64 = 1e-3;

/// ACT-R base-level activation `B = ln(sum (now - t_k)^(-d))`.
///
/// Higher when accessed more often and more recently. Returns `-inf` when
/// the access history is empty.
pub fn base_level(engram: &Engram, now: f64, decay: f64) -> f64 {
    if engram.access_times.is_empty() {
        return f64::NEG_INFINITY;
    }

    let total: f64 = engram
        .access_times
        .iter()
        .map(|&t_k| (now - t_k).max(MIN_AGE_SECS).powf(-decay))
        .sum();

    if total <= 0.0 {
        return f64::NEG_INFINITY;
    }

    total.ln()
}

/// Spreading activation from the current context.
///
/// Full ACT-R uses associative strengths between chunks; keyword overlap is
/// the proxy here: `weight * |context hits| / |context|`, with hits counted
/// by case-insensitive substring match against the content.
pub fn spreading(engram: &Engram, context: &[String], weight: f64) -> f64 {
    if context.is_empty() {
        return 0.0;
    }

    let content_lower = engram.content.to_lowercase();
    let matches = context
        .iter()
        .filter(|kw| content_lower.contains(&kw.to_lowercase()))
        .count();

    weight * (matches as f64 / context.len() as f64)
}

/// Total retrieval activation `A = B + spreading + w_imp * importance`.
///
/// `-inf` base level short-circuits: an engram that was never accessed
/// cannot be pulled up by context alone.
pub fn retrieval_activation(
    engram: &Engram,
    context: &[String],
    now: f64,
    config: &EngramConfig,
) -> f64 {
    let base = base_level(engram, now, config.actr_decay);
    if base == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }

    let context_boost = spreading(engram, context, config.context_weight);
    let importance_boost = engram.importance * config.importance_weight;

    base + context_boost + importance_boost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryKind, MemoryLayer};

    fn engram(content: &str, access_times: Vec<f64>) -> Engram {
        Engram {
            id: "t".into(),
            content: content.into(),
            kind: MemoryKind::Factual,
            layer: MemoryLayer::Working,
            created_at: access_times.first().copied().unwrap_or(0.0),
            access_times,
            working_strength: 1.0,
            core_strength: 0.0,
            importance: 0.3,
            pinned: false,
            consolidation_count: 0,
            last_consolidated: None,
            source: String::new(),
        }
    }

    #[test]
    fn test_no_accesses_is_unretrievable() {
        let cfg = EngramConfig::default();
        let e = engram("orphan", vec![]);
        assert_eq!(base_level(&e, 1000.0, 0.5), f64::NEG_INFINITY);
        assert_eq!(
            retrieval_activation(&e, &["orphan".into()], 1000.0, &cfg),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_recency_raises_base_level() {
        let hour = 3600.0;
        let now = 100.0 * hour;
        let recent = engram("a", vec![now - hour]);
        let stale = engram("a", vec![now - 50.0 * hour]);
        assert!(base_level(&recent, now, 0.5) > base_level(&stale, now, 0.5));
    }

    #[test]
    fn test_frequency_raises_base_level() {
        let hour = 3600.0;
        let now = 100.0 * hour;
        let frequent = engram("a", (1..=10).map(|k| now - k as f64 * hour).collect());
        let single = engram("a", vec![now - hour]);
        assert!(base_level(&frequent, now, 0.5) > base_level(&single, now, 0.5));
    }

    #[test]
    fn test_access_at_now_does_not_blow_up() {
        let e = engram("a", vec![500.0]);
        let b = base_level(&e, 500.0, 0.5);
        assert!(b.is_finite());
    }

    #[test]
    fn test_spreading_counts_case_insensitive_overlap() {
        let e = engram("Supabase database backend", vec![0.0]);
        let ctx = vec!["SUPABASE".to_string(), "missing".to_string()];
        let s = spreading(&e, &ctx, 1.5);
        assert!((s - 1.5 * 0.5).abs() < 1e-12);

        assert_eq!(spreading(&e, &[], 1.5), 0.0);
    }

    #[test]
    fn test_importance_modulates_total_activation() {
        let cfg = EngramConfig::default();
        let now = 7200.0;
        let mut low = engram("same content", vec![now - 3600.0]);
        let mut high = low.clone();
        low.importance = 0.1;
        high.importance = 0.9;

        let a_low = retrieval_activation(&low, &[], now, &cfg);
        let a_high = retrieval_activation(&high, &[], now, &cfg);
        assert!((a_high - a_low - 0.8 * cfg.importance_weight).abs() < 1e-9);
    }
}
