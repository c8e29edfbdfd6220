//! Two-dimensional metacognitive confidence.
//!
//! A memory has two distinct kinds of confidence:
//!
//! 1. **Content reliability** - how trustworthy the content is. Driven by
//!    kind and provenance, not by time: a three-month-old factual record is
//!    just as accurate as a fresh one.
//! 2. **Retrieval salience** - how "top of mind" the memory is. Driven by
//!    effective strength, so it decays with time. Used for ranking, never
//!    for judging accuracy.
//!
//! The combined score weights reliability over salience; labels bucket it
//! for hosts that want a word instead of a number.

use crate::config::EngramConfig;
use crate::decay::effective_strength;
use crate::memory::Engram;

/// Reliability a pinned engram is lifted to (pinning implies a human
/// explicitly verified the content).
const PINNED_RELIABILITY_FLOOR: f64 = 0.95;

/// Full confidence annotation for one engram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    /// Content trustworthiness, stable over time
    pub reliability: f64,
    /// Retrieval salience, decays over time
    pub salience: f64,
    /// Weighted overall score
    pub combined: f64,
    /// Human-readable bucket
    pub label: &'static str,
}

/// How trustworthy is this engram's content?
///
/// Per-kind baseline, lifted to at least 0.95 when pinned, plus up to +0.1
/// from importance. Capped at 1.0 and independent of time.
pub fn content_reliability(engram: &Engram, config: &EngramConfig) -> f64 {
    let mut base = config.kind_reliability(engram.kind);

    if engram.pinned {
        base = base.max(PINNED_RELIABILITY_FLOOR);
    }

    (base + engram.importance * 0.1).min(1.0)
}

/// How "top of mind" is this engram?
///
/// Effective strength normalised against the candidate-set maximum when one
/// is available; otherwise mapped through the sigmoid
/// `2 / (1 + e^(-k * eff)) - 1` for an absolute reading.
pub fn retrieval_salience(
    engram: &Engram,
    max_effective: Option<f64>,
    now: f64,
    config: &EngramConfig,
) -> f64 {
    let eff = effective_strength(engram, now, config);

    let raw = match max_effective {
        Some(max) if max > 0.0 => eff / max,
        Some(_) => 0.0,
        None => 2.0 / (1.0 + (-config.salience_sigmoid_k * eff).exp()) - 1.0,
    };

    raw.clamp(0.0, 1.0)
}

/// Weighted combination of reliability and salience.
pub fn combined_score(reliability: f64, salience: f64, config: &EngramConfig) -> f64 {
    config.confidence_reliability_weight * reliability
        + config.confidence_salience_weight * salience
}

/// Human-readable confidence label.
pub fn confidence_label(score: f64) -> &'static str {
    if score >= 0.8 {
        "certain"
    } else if score >= 0.6 {
        "likely"
    } else if score >= 0.4 {
        "uncertain"
    } else {
        "vague"
    }
}

/// Annotate one engram against an optional candidate set maximum.
pub fn annotate(
    engram: &Engram,
    max_effective: Option<f64>,
    now: f64,
    config: &EngramConfig,
) -> Confidence {
    let reliability = content_reliability(engram, config);
    let salience = retrieval_salience(engram, max_effective, now, config);
    let combined = combined_score(reliability, salience, config);

    Confidence {
        reliability,
        salience,
        combined,
        label: confidence_label(combined),
    }
}
