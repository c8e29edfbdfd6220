//! Homeostatic plasticity - synaptic downscaling and retrieval-induced
//! suppression.
//!
//! Downscaling follows the Synaptic Homeostasis Hypothesis (Tononi &
//! Cirelli): after a period of potentiation, every non-pinned trace is
//! shrunk by a proportional factor. Relative ordering of `r1 + r2` across
//! the non-pinned set is preserved exactly; without the shrinkage every
//! trace would eventually saturate and strong and weak memories would
//! become indistinguishable.
//!
//! Retrieval-induced suppression models interference: recalling one memory
//! actively weakens competitors - same kind, heavily overlapping wording.

use std::collections::HashSet;

use crate::config::EngramConfig;
use crate::error::{EngramError, Result};
use crate::memory::{DownscaleStats, Engram};
use crate::storage::Store;

/// Multiply `r1` and `r2` of every non-pinned engram by `factor`.
///
/// `factor` must lie in `(0, 1]`; anything else is a `BadArg`.
pub fn synaptic_downscale(
    store: &dyn Store,
    factor: f64,
) -> Result<DownscaleStats> {
    if !(factor > 0.0 && factor <= 1.0) {
        return Err(EngramError::BadArg(format!(
            "downscale factor must be in (0, 1], got {factor}"
        )));
    }

    let engrams = store.all()?;

    let mut touched = Vec::new();
    let mut total_before = 0.0;
    let mut total_after = 0.0;

    for mut engram in engrams {
        if engram.pinned {
            continue;
        }

        total_before += engram.trace_total();
        engram.working_strength *= factor;
        engram.core_strength *= factor;
        total_after += engram.trace_total();
        touched.push(engram);
    }

    let n_scaled = touched.len();
    store.update_batch(&touched)?;

    tracing::debug!(factor, n_scaled, "synaptic downscaling applied");

    Ok(DownscaleStats {
        n_scaled,
        avg_before: total_before / n_scaled.max(1) as f64,
        avg_after: total_after / n_scaled.max(1) as f64,
    })
}

/// Word set of an engram's content, lowercased.
fn word_set(content: &str) -> HashSet<String> {
    content
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Suppress competitors of a just-retrieved engram.
///
/// A competitor shares the retrieved engram's kind and has word overlap
/// `|X intersect Y| / |Y|` above the configured threshold; its working
/// trace is shrunk by `1 - suppression * overlap`. Pinned rows are exempt.
///
/// Returns the number of suppressed engrams.
pub fn suppress_competitors(
    store: &dyn Store,
    retrieved: &Engram,
    config: &EngramConfig,
) -> Result<usize> {
    let retrieved_words = word_set(&retrieved.content);
    if retrieved_words.is_empty() {
        return Ok(0);
    }

    let mut touched = Vec::new();
    for mut engram in store.by_kind(retrieved.kind)? {
        if engram.id == retrieved.id || engram.pinned {
            continue;
        }

        let words = word_set(&engram.content);
        if words.is_empty() {
            continue;
        }

        let shared = retrieved_words.intersection(&words).count();
        let overlap = shared as f64 / words.len() as f64;

        if overlap > config.overlap_threshold {
            engram.working_strength *= 1.0 - config.suppression_factor * overlap;
            touched.push(engram);
        }
    }

    let n = touched.len();
    store.update_batch(&touched)?;
    Ok(n)
}
