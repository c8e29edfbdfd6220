//! Forgetting model - Ebbinghaus retrievability with spacing and interference.
//!
//! Retrievability follows the classic exponential forgetting curve:
//!
//! ```text
//! R(t) = e^(-t / S)
//! ```
//!
//! where `t` is days since the last access and `S` is the stability.
//! Stability grows with spaced access (the spacing effect), with importance,
//! and with each consolidation pass, so well-rehearsed or significant
//! engrams stay retrievable far longer than one-shot trivia.
//!
//! Everything here is pure: `now` is always passed in, nothing fails.

use crate::config::EngramConfig;
use crate::memory::Engram;

/// Ebbinghaus retrievability `R = e^(-t/S)` in [0, 1].
///
/// `t` is measured from the latest access (creation time if the access log
/// is empty). A non-positive elapsed time yields `R = 1`.
pub fn retrievability(engram: &Engram, now: f64, config: &EngramConfig) -> f64 {
    let t_days = (now - engram.last_access()) / 86_400.0;
    if t_days <= 0.0 {
        return 1.0;
    }

    (-t_days / stability(engram, config)).exp()
}

/// Memory stability `S` in days.
///
/// ```text
/// S = base_S * (1 + 0.5 * ln(1 + n_accesses)) * (0.5 + importance) * (1 + 0.2 * consolidations)
/// ```
///
/// `base_S` is the inverse of the per-kind decay rate, so durable kinds
/// (emotional, procedural) start with a long time constant.
pub fn stability(engram: &Engram, config: &EngramConfig) -> f64 {
    let base_s = 1.0 / config.decay_rate(engram.kind);

    let n_accesses = engram.access_times.len() as f64;
    let spacing = 1.0 + config.spacing_factor * n_accesses.ln_1p();

    let importance = config.importance_floor + engram.importance;

    let consolidation = 1.0 + config.consolidation_bonus * f64::from(engram.consolidation_count);

    base_s * spacing * importance * consolidation
}

/// Combined "how alive is this memory" score: `(r1 + r2) * R(now)`.
///
/// Used for ranking tie-breaks, salience and pruning decisions.
pub fn effective_strength(engram: &Engram, now: f64, config: &EngramConfig) -> f64 {
    engram.trace_total() * retrievability(engram, now, config)
}

/// Whether an engram has faded below the pruning threshold.
///
/// Pinned engrams are never forgotten.
pub fn should_forget(engram: &Engram, threshold: f64, now: f64, config: &EngramConfig) -> bool {
    if engram.pinned {
        return false;
    }
    effective_strength(engram, now, config) < threshold
}
