//! Memory module - core types and result shapes

mod engram;

pub use engram::{AddInput, Engram, GraphLink, MemoryKind, MemoryLayer, RecallOptions};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RECALL RESULTS
// ============================================================================

/// A single ranked recall result with its confidence annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallResult {
    /// Engram id
    pub id: String,
    /// Engram content
    pub content: String,
    /// Memory kind
    pub kind: MemoryKind,
    /// Lifecycle layer at retrieval time
    pub layer: MemoryLayer,
    /// ACT-R retrieval activation that ranked this result
    pub activation: f64,
    /// Combined confidence (0.7 reliability + 0.3 salience)
    pub confidence: f64,
    /// Time-invariant content reliability
    pub reliability: f64,
    /// Time-decaying retrieval salience
    pub salience: f64,
    /// Human-readable confidence label
    pub label: &'static str,
    /// `(r1 + r2) * retrievability` at query time
    pub effective_strength: f64,
    /// Days since creation
    pub age_days: f64,
    /// Importance at retrieval time
    pub importance: f64,
}

// ============================================================================
// OPERATION REPORTS
// ============================================================================

/// What one consolidation cycle did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Working-layer engrams that went through a transfer + decay step
    pub working_consolidated: usize,
    /// Archived engrams replayed this cycle
    pub replayed: usize,
    /// Working -> Core promotions
    pub promoted: usize,
    /// Working -> Archive expiries
    pub archived: usize,
    /// Core -> Archive demotions
    pub demoted: usize,
    /// Engrams shrunk by the post-cycle downscale (0 when disabled)
    pub downscaled: usize,
}

/// Result of a synaptic downscaling pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownscaleStats {
    /// Non-pinned engrams scaled
    pub n_scaled: usize,
    /// Mean r1 + r2 before scaling (over scaled rows)
    pub avg_before: f64,
    /// Mean r1 + r2 after scaling (over scaled rows)
    pub avg_after: f64,
}

/// Polarity of a detected feedback signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Rewarding feedback
    Positive,
    /// Punishing feedback
    Negative,
    /// No clear signal, or opposing signals cancelled out
    Neutral,
}

/// What a reward application did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardOutcome {
    /// Detected polarity
    pub polarity: Polarity,
    /// Detection confidence (0-1)
    pub confidence: f64,
    /// Engrams actually modified (pinned rows in the window are skipped)
    pub applied: usize,
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Per-kind aggregate statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindStats {
    /// Engram count of this kind
    pub count: usize,
    /// Mean effective strength
    pub avg_strength: f64,
    /// Mean importance
    pub avg_importance: f64,
}

/// Per-layer aggregate statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStats {
    /// Engram count in this layer
    pub count: usize,
    /// Mean working strength (r1)
    pub avg_working: f64,
    /// Mean core strength (r2)
    pub avg_core: f64,
    /// Mean importance
    pub avg_importance: f64,
}

/// Snapshot of the whole memory system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngramStats {
    /// Total engrams
    pub total: usize,
    /// Breakdown by kind (only kinds with at least one engram)
    pub by_kind: BTreeMap<String, KindStats>,
    /// Breakdown by layer (all three layers, possibly empty)
    pub by_layer: BTreeMap<String, LayerStats>,
    /// Pinned engrams
    pub pinned: usize,
    /// Append-only access log rows
    pub access_log_rows: usize,
    /// Graph link rows
    pub graph_link_rows: usize,
    /// Timestamp of the oldest engram
    pub oldest: Option<DateTime<Utc>>,
    /// Timestamp of the newest engram
    pub newest: Option<DateTime<Utc>>,
    /// Metric names the in-memory anomaly tracker has seen
    pub tracked_metrics: Vec<String>,
}

/// Raw row counts reported by a store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    /// Engram rows
    pub engrams: usize,
    /// Access log rows
    pub access_log: usize,
    /// Graph link rows
    pub graph_links: usize,
}
