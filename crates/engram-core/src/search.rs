//! Recall pipeline.
//!
//! Composes the store's full-text search with the ACT-R scorer and the
//! confidence annotator:
//!
//! 1. Pull an FTS candidate window `W = max(4 * limit, 20)` from the store
//!    (all non-archive rows when the query is empty).
//! 2. Score every candidate's retrieval activation against the union of the
//!    caller's context keywords and the query tokens.
//! 3. Drop rows below the activation floor, sort by activation with
//!    effective-strength and recency tie-breaks.
//! 4. Annotate survivors with reliability / salience / label, then apply
//!    kind and confidence filters.
//! 5. Optionally expand one hop through the entity graph from the top
//!    survivor to fill remaining room.
//!
//! Touching the returned rows (access log + retrieval-induced suppression)
//! is the engine's job, so this module stays read-only against the store.

use std::collections::HashSet;

use crate::activation::retrieval_activation;
use crate::config::EngramConfig;
use crate::confidence;
use crate::decay::effective_strength;
use crate::error::{EngramError, Result};
use crate::memory::{Engram, MemoryLayer, RecallOptions, RecallResult};
use crate::storage::Store;

/// Quote and escape user tokens so the FTS5 query grammar cannot be
/// injected; tokens are OR-ed to produce a candidate window rather than an
/// exact phrase match.
pub fn sanitize_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// A scored candidate flowing through the pipeline.
struct Candidate {
    engram: Engram,
    activation: f64,
    effective: f64,
}

/// Score and floor-filter a batch of engrams.
fn score(
    engrams: Vec<Engram>,
    context: &[String],
    now: f64,
    config: &EngramConfig,
) -> Vec<Candidate> {
    engrams
        .into_iter()
        .filter_map(|engram| {
            let activation = retrieval_activation(&engram, context, now, config);
            if activation < config.min_activation {
                return None;
            }
            let effective = effective_strength(&engram, now, config);
            Some(Candidate {
                engram,
                activation,
                effective,
            })
        })
        .collect()
}

/// Activation descending, then effective strength, then recency.
fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.activation
            .partial_cmp(&a.activation)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.effective
                    .partial_cmp(&a.effective)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(
                b.engram
                    .created_at
                    .partial_cmp(&a.engram.created_at)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
}

fn annotate(
    candidate: &Candidate,
    max_effective: f64,
    now: f64,
    config: &EngramConfig,
) -> RecallResult {
    let conf = confidence::annotate(
        &candidate.engram,
        Some(max_effective),
        now,
        config,
    );

    RecallResult {
        id: candidate.engram.id.clone(),
        content: candidate.engram.content.clone(),
        kind: candidate.engram.kind,
        layer: candidate.engram.layer,
        activation: candidate.activation,
        confidence: conf.combined,
        reliability: conf.reliability,
        salience: conf.salience,
        label: conf.label,
        effective_strength: candidate.effective,
        age_days: candidate.engram.age_days(now),
        importance: candidate.engram.importance,
    }
}

fn passes_filters(result: &RecallResult, opts: &RecallOptions) -> bool {
    if let Some(kinds) = &opts.kinds {
        if !kinds.contains(&result.kind) {
            return false;
        }
    }
    result.confidence >= opts.min_confidence
}

/// Run the recall pipeline. Returns ranked, annotated, filtered results;
/// the caller applies the access-log and suppression side effects.
pub(crate) fn recall(
    store: &dyn Store,
    query: &str,
    opts: &RecallOptions,
    now: f64,
    config: &EngramConfig,
) -> Result<Vec<RecallResult>> {
    if !(0.0..=1.0).contains(&opts.min_confidence) {
        return Err(EngramError::BadArg(format!(
            "min_confidence must be in [0, 1], got {}",
            opts.min_confidence
        )));
    }
    if let Some(kinds) = &opts.kinds {
        if kinds.is_empty() {
            return Err(EngramError::BadArg(
                "kinds filter must name at least one kind".to_string(),
            ));
        }
    }
    if opts.limit == 0 {
        return Ok(Vec::new());
    }

    // Candidate window: FTS when there is a query, otherwise every
    // non-archive row ranked purely by activation (archive stays reachable
    // only through an explicit search)
    let window = (4 * opts.limit).max(20);
    let candidates = if query.trim().is_empty() {
        let mut rows = store.all()?;
        rows.retain(|e| e.layer != MemoryLayer::Archive);
        rows
    } else {
        store.search_fts(&sanitize_fts_query(query), window)?
    };

    // Spreading activation context: caller keywords plus query tokens
    let mut context: Vec<String> = opts.context.iter().map(|s| s.to_lowercase()).collect();
    for token in query.split_whitespace() {
        let token = token.to_lowercase();
        if !context.contains(&token) {
            context.push(token);
        }
    }

    let mut scored = score(candidates, &context, now, config);
    rank(&mut scored);

    let max_effective = scored
        .iter()
        .map(|c| c.effective)
        .fold(0.0_f64, f64::max);

    let mut results: Vec<RecallResult> = scored
        .iter()
        .map(|c| annotate(c, max_effective, now, config))
        .filter(|r| passes_filters(r, opts))
        .take(opts.limit)
        .collect();

    // One-hop graph expansion from the top survivor, only to fill room
    if opts.graph_expand && !results.is_empty() && results.len() < opts.limit {
        let seen: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
        let mut neighbors = Vec::new();
        for id in store.neighbors(&results[0].id)? {
            if seen.contains(&id) {
                continue;
            }
            if let Some(engram) = store.peek(&id)? {
                neighbors.push(engram);
            }
        }

        let mut extra = score(neighbors, &context, now, config);
        rank(&mut extra);

        let max_effective = extra
            .iter()
            .map(|c| c.effective)
            .fold(max_effective, f64::max);

        let room = opts.limit - results.len();
        results.extend(
            extra
                .iter()
                .map(|c| annotate(c, max_effective, now, config))
                .filter(|r| passes_filters(r, opts))
                .take(room),
        );
    }

    tracing::debug!(
        query,
        returned = results.len(),
        limit = opts.limit,
        "recall pipeline complete"
    );

    Ok(results)
}
