//! Tunable parameters for every model in the engine.
//!
//! Defaults come from the cognitive-science literature (ACT-R, the Memory
//! Chain Model, the Ebbinghaus forgetting curve). They are reasonable
//! starting points rather than values optimized for any particular agent;
//! the named presets re-parameterise them for common archetypes.

use crate::error::{EngramError, Result};
use crate::memory::MemoryKind;
use serde::{Deserialize, Serialize};

/// Per-kind value table, indexed by [`MemoryKind`] declaration order.
pub type KindTable = [f64; 6];

/// Default decay rates per kind (per day). Lower = decays slower.
pub const DEFAULT_DECAY_RATES: KindTable = [
    0.03, // factual
    0.10, // episodic - episodes fade fast
    0.02, // relational - people knowledge is durable
    0.01, // emotional
    0.01, // procedural
    0.05, // opinion - opinions evolve
];

/// Default content reliability per kind.
pub const DEFAULT_RELIABILITY: KindTable = [
    0.85, // factual - recorded facts, generally reliable
    0.90, // episodic - witnessed events
    0.75, // relational - inferred preferences
    0.95, // emotional - vividly remembered
    0.90, // procedural - tested and verified
    0.60, // opinion - inherently subjective
];

/// All tunable parameters for the Engram memory system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngramConfig {
    // === Forgetting (Ebbinghaus + interference) ===
    /// Per-kind decay rate map (per day); stability base is its inverse
    pub decay_rates: KindTable,
    /// Spacing effect weight on ln(1 + n_accesses) in stability
    pub spacing_factor: f64,
    /// Importance floor in stability: importance_factor = floor + importance
    pub importance_floor: f64,
    /// Stability bonus per consolidation count
    pub consolidation_bonus: f64,
    /// Effective strength threshold for pruning to archive
    pub forget_threshold: f64,
    /// Retrieval-induced suppression magnitude
    pub suppression_factor: f64,
    /// Word overlap ratio above which two engrams compete
    pub overlap_threshold: f64,

    // === Consolidation (Memory Chain Model) ===
    /// Working trace decay rate mu1 (per day)
    pub mu1: f64,
    /// Core trace decay rate mu2 (per day)
    pub mu2: f64,
    /// Transfer rate alpha (working -> core per day)
    pub alpha: f64,
    /// Importance modulation floor: alpha_eff = alpha * (floor + importance^2)
    pub consolidation_importance_floor: f64,
    /// Fraction of archived engrams replayed per cycle
    pub interleave_ratio: f64,
    /// Core strength boost base per replayed archived engram
    pub replay_boost: f64,
    /// Working -> Core when r2 reaches this
    pub promote_threshold: f64,
    /// Core -> Archive when r1 + r2 falls below this
    pub demote_threshold: f64,
    /// Working -> Archive when both traces fall below this
    pub archive_threshold: f64,

    // === Activation (ACT-R) ===
    /// Base-level decay exponent d in t^-d
    pub actr_decay: f64,
    /// Spreading activation weight for context keywords
    pub context_weight: f64,
    /// Importance weight in total retrieval activation
    pub importance_weight: f64,
    /// Activation floor below which a row is unretrievable
    pub min_activation: f64,

    // === Confidence (metacognitive scoring) ===
    /// Per-kind content reliability map
    pub reliability: KindTable,
    /// Weight of reliability in the combined score
    pub confidence_reliability_weight: f64,
    /// Weight of salience in the combined score
    pub confidence_salience_weight: f64,
    /// Sigmoid steepness when salience has no candidate set to normalise by
    pub salience_sigmoid_k: f64,

    // === Reward (dopaminergic feedback) ===
    /// Base reward magnitude, scaled by detection confidence
    pub reward_magnitude: f64,
    /// Number of recently accessed engrams in the eligibility window
    pub reward_recent_n: usize,
    /// Working strength bonus on positive feedback
    pub reward_strength_boost: f64,
    /// Working strength suppression on negative feedback
    pub reward_suppression: f64,
    /// Eligibility trace discount: delta_i = 1 / (1 + discount * i)
    pub reward_temporal_discount: f64,

    // === Downscaling (synaptic homeostasis) ===
    /// Global multiplicative factor applied to all non-pinned traces
    pub downscale_factor: f64,
    /// Run downscaling at the end of every consolidation cycle
    pub downscale_on_consolidate: bool,

    // === Anomaly detection ===
    /// Rolling window size for baseline tracking
    pub anomaly_window_size: usize,
    /// Standard deviations for the anomaly threshold
    pub anomaly_sigma_threshold: f64,
    /// Minimum samples before anomaly detection activates
    pub anomaly_min_samples: usize,

    // === Determinism ===
    /// Seed for the replay sampler; `None` seeds from the OS
    pub replay_seed: Option<u64>,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            decay_rates: DEFAULT_DECAY_RATES,
            spacing_factor: 0.5,
            importance_floor: 0.5,
            consolidation_bonus: 0.2,
            forget_threshold: 0.01,
            suppression_factor: 0.05,
            overlap_threshold: 0.3,

            mu1: 0.15,
            mu2: 0.005,
            alpha: 0.08,
            consolidation_importance_floor: 0.2,
            interleave_ratio: 0.3,
            replay_boost: 0.01,
            promote_threshold: 0.25,
            demote_threshold: 0.05,
            archive_threshold: 0.15,

            actr_decay: 0.5,
            context_weight: 1.5,
            importance_weight: 0.5,
            min_activation: -10.0,

            reliability: DEFAULT_RELIABILITY,
            confidence_reliability_weight: 0.7,
            confidence_salience_weight: 0.3,
            salience_sigmoid_k: 2.0,

            reward_magnitude: 0.15,
            reward_recent_n: 3,
            reward_strength_boost: 0.05,
            reward_suppression: 0.1,
            reward_temporal_discount: 0.5,

            downscale_factor: 0.95,
            downscale_on_consolidate: true,

            anomaly_window_size: 100,
            anomaly_sigma_threshold: 2.0,
            anomaly_min_samples: 5,

            replay_seed: None,
        }
    }
}

impl EngramConfig {
    /// Decay rate (per day) for a kind.
    pub fn decay_rate(&self, kind: MemoryKind) -> f64 {
        self.decay_rates[kind.index()]
    }

    /// Content reliability baseline for a kind.
    pub fn kind_reliability(&self, kind: MemoryKind) -> f64 {
        self.reliability[kind.index()]
    }

    /// Literature-based defaults (same as `Default`).
    pub fn standard() -> Self {
        Self::default()
    }

    /// Preset for conversational chatbots.
    ///
    /// High replay, slow decay - optimized for long conversations where
    /// recalling old context matters.
    pub fn chatbot() -> Self {
        Self {
            mu1: 0.08,
            mu2: 0.003,
            alpha: 0.12,
            interleave_ratio: 0.4,
            replay_boost: 0.015,
            actr_decay: 0.4,
            context_weight: 2.0,
            downscale_factor: 0.96,
            reward_magnitude: 0.2,
            forget_threshold: 0.005,
            ..Self::default()
        }
    }

    /// Preset for short-lived task agents.
    ///
    /// Fast decay, low replay - focus on recent task context, let old task
    /// memories expire quickly.
    pub fn task_agent() -> Self {
        Self {
            mu1: 0.25,
            mu2: 0.01,
            alpha: 0.05,
            interleave_ratio: 0.1,
            replay_boost: 0.005,
            actr_decay: 0.6,
            promote_threshold: 0.35,
            archive_threshold: 0.2,
            downscale_factor: 0.90,
            forget_threshold: 0.02,
            ..Self::default()
        }
    }

    /// Preset for long-term personal assistants.
    ///
    /// Very slow core decay, medium replay - remember preferences and facts
    /// about the user for months.
    pub fn personal_assistant() -> Self {
        Self {
            mu1: 0.12,
            mu2: 0.001,
            alpha: 0.10,
            interleave_ratio: 0.3,
            replay_boost: 0.02,
            actr_decay: 0.45,
            importance_weight: 0.7,
            promote_threshold: 0.20,
            demote_threshold: 0.03,
            downscale_factor: 0.97,
            forget_threshold: 0.005,
            confidence_reliability_weight: 0.8,
            confidence_salience_weight: 0.2,
            ..Self::default()
        }
    }

    /// Preset for research agents.
    ///
    /// Minimal forgetting - everything might be relevant later. Heavy replay
    /// to maintain all knowledge.
    pub fn researcher() -> Self {
        Self {
            mu1: 0.05,
            mu2: 0.001,
            alpha: 0.15,
            interleave_ratio: 0.5,
            replay_boost: 0.025,
            actr_decay: 0.35,
            context_weight: 2.0,
            importance_weight: 0.3,
            promote_threshold: 0.15,
            demote_threshold: 0.02,
            archive_threshold: 0.10,
            downscale_factor: 0.98,
            forget_threshold: 0.001,
            ..Self::default()
        }
    }

    /// Resolve a preset by name.
    pub fn preset(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "default" | "standard" => Ok(Self::default()),
            "chatbot" => Ok(Self::chatbot()),
            "task-agent" | "task_agent" => Ok(Self::task_agent()),
            "personal-assistant" | "personal_assistant" => Ok(Self::personal_assistant()),
            "researcher" => Ok(Self::researcher()),
            other => Err(EngramError::BadArg(format!("unknown preset: {other}"))),
        }
    }
}
