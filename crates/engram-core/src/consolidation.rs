//! Memory Chain consolidation (Murre & Chessa).
//!
//! The brain's dual-system transfer, discretised per "sleep" cycle:
//!
//! ```text
//! dr1/dt = -mu1 * r1
//! dr2/dt = alpha_eff * r1 - mu2 * r2,    alpha_eff = alpha * (0.2 + importance^2)
//! ```
//!
//! Per cycle, every working engram transfers part of its fast trace into the
//! slow trace and both traces decay exponentially. A random fraction of the
//! archive is replayed (interleaved replay is the countermeasure against
//! catastrophic forgetting, not an optimisation), core engrams receive the
//! slow decay only, and finally layers are rebalanced against the promote /
//! archive / demote thresholds. Pinned engrams are untouched and forced to
//! Core.
//!
//! A zero or negative time step is a whole-cycle no-op.

use rand::seq::SliceRandom;
use rand::rngs::SmallRng;
use std::collections::HashMap;

use crate::config::EngramConfig;
use crate::error::Result;
use crate::memory::{CycleReport, Engram, MemoryLayer};
use crate::storage::Store;

/// One consolidation step for a single working engram: transfer then decay.
fn consolidate_single(engram: &mut Engram, dt_days: f64, now: f64, config: &EngramConfig) {
    // Importance-squared modulation: low-importance engrams consolidate
    // much more slowly (amygdala -> hippocampus gain)
    let alpha_eff = config.alpha
        * (config.consolidation_importance_floor + engram.importance * engram.importance);

    engram.core_strength += alpha_eff * engram.working_strength * dt_days;

    engram.working_strength *= (-config.mu1 * dt_days).exp();
    engram.core_strength *= (-config.mu2 * dt_days).exp();

    engram.consolidation_count += 1;
    engram.last_consolidated = Some(now);
}

/// Run a full consolidation cycle ("sleep") over the store.
///
/// All row mutations of the cycle commit in a single batch, so readers
/// never observe a half-consolidated store.
pub fn run_cycle(
    store: &dyn Store,
    dt_days: f64,
    now: f64,
    config: &EngramConfig,
    rng: &mut SmallRng,
) -> Result<CycleReport> {
    let mut report = CycleReport::default();
    if dt_days <= 0.0 {
        return Ok(report);
    }

    let all = store.all()?;
    // Engrams this cycle touched, keyed by id so rebalancing sees the
    // post-step traces
    let mut touched: HashMap<String, Engram> = HashMap::new();

    // Step 1: transfer + decay for every working engram
    for engram in all.iter().filter(|e| e.layer == MemoryLayer::Working) {
        if engram.pinned {
            continue;
        }
        let mut e = engram.clone();
        consolidate_single(&mut e, dt_days, now, config);
        report.working_consolidated += 1;
        touched.insert(e.id.clone(), e);
    }

    // Step 2: interleaved replay of a random archive sample
    let archive: Vec<&Engram> = all
        .iter()
        .filter(|e| e.layer == MemoryLayer::Archive && !e.pinned)
        .collect();
    if !archive.is_empty() {
        let n_replay = ((archive.len() as f64 * config.interleave_ratio) as usize)
            .clamp(1, archive.len());
        for engram in archive.choose_multiple(rng, n_replay) {
            let e = touched
                .entry(engram.id.clone())
                .or_insert_with(|| (*engram).clone());
            e.core_strength += config.replay_boost * (0.5 + e.importance);
            e.consolidation_count += 1;
            e.last_consolidated = Some(now);
            report.replayed += 1;
        }
    }

    // Step 3: slow decay only for core engrams
    for engram in all.iter().filter(|e| e.layer == MemoryLayer::Core) {
        if engram.pinned {
            continue;
        }
        let e = touched
            .entry(engram.id.clone())
            .or_insert_with(|| engram.clone());
        e.core_strength *= (-config.mu2 * dt_days).exp();
    }

    // Step 4: rebalance layers against the thresholds
    for engram in &all {
        let e = touched
            .entry(engram.id.clone())
            .or_insert_with(|| engram.clone());

        if e.pinned {
            e.layer = MemoryLayer::Core;
        } else {
            match e.layer {
                MemoryLayer::Working => {
                    if e.core_strength >= config.promote_threshold {
                        e.layer = MemoryLayer::Core;
                        report.promoted += 1;
                    } else if e.working_strength < config.archive_threshold
                        && e.core_strength < config.archive_threshold
                    {
                        e.layer = MemoryLayer::Archive;
                        report.archived += 1;
                    }
                }
                MemoryLayer::Core => {
                    if e.trace_total() < config.demote_threshold {
                        e.layer = MemoryLayer::Archive;
                        report.demoted += 1;
                    }
                }
                MemoryLayer::Archive => {}
            }
        }
    }

    // Drop untouched rows that only entered the map during rebalancing and
    // came out identical
    let updates: Vec<Engram> = touched
        .into_values()
        .filter(|e| {
            all.iter()
                .find(|orig| orig.id == e.id)
                .is_none_or(|orig| !same_row(orig, e))
        })
        .collect();

    store.update_batch(&updates)?;

    tracing::info!(
        dt_days,
        consolidated = report.working_consolidated,
        replayed = report.replayed,
        promoted = report.promoted,
        archived = report.archived,
        demoted = report.demoted,
        "consolidation cycle complete"
    );

    Ok(report)
}

/// Field-level equality for skip-unchanged-row detection.
fn same_row(a: &Engram, b: &Engram) -> bool {
    a.layer == b.layer
        && a.working_strength == b.working_strength
        && a.core_strength == b.core_strength
        && a.importance == b.importance
        && a.consolidation_count == b.consolidation_count
        && a.last_consolidated == b.last_consolidated
}
