//! # Engram Core
//!
//! Embedded memory engine for long-lived conversational agents. Engrams are
//! small text records with rich metadata, ranked on recall by models from
//! cognitive science rather than pure vector similarity:
//!
//! - **ACT-R activation** (Anderson): base-level frequency x recency plus
//!   spreading activation from context keywords
//! - **Memory Chain consolidation** (Murre & Chessa): dual traces, with
//!   "sleep" cycles transferring the fast hippocampal-analogue trace into a
//!   slow neocortical-analogue one, plus interleaved replay of the archive
//! - **Ebbinghaus forgetting** with spacing, importance and consolidation
//!   effects on stability
//! - **Synaptic homeostasis** (Tononi & Cirelli): global downscaling that
//!   preserves relative trace ordering, plus retrieval-induced suppression
//!   of competing memories
//! - **Dopaminergic reward shaping**: natural-language feedback spread over
//!   an eligibility trace of recently accessed engrams
//! - **Two-dimensional confidence**: time-invariant reliability and
//!   time-decaying salience
//!
//! Persistence is an embedded SQLite store (FTS5 full-text index plus an
//! append-only access log); an in-memory store backs ephemeral engines and
//! the property-test suite.
//!
//! ## Quick Start
//!
//! ```rust
//! use engram_core::prelude::*;
//!
//! let engine = Engine::in_memory();
//!
//! engine.add(AddInput {
//!     kind: MemoryKind::Procedural,
//!     importance: Some(0.8),
//!     ..AddInput::new("Use www.moltbook.com, not moltbook.com")
//! })?;
//!
//! let results = engine.recall("moltbook", RecallOptions::default())?;
//! assert_eq!(results.len(), 1);
//! println!("[{}] {}", results[0].label, results[0].content);
//!
//! engine.consolidate(1.0)?;          // one "night" of sleep replay
//! engine.reward("good job!", None)?; // strengthen what was just used
//! # Ok::<(), engram_core::EngramError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod activation;
pub mod anomaly;
pub mod clock;
pub mod config;
pub mod confidence;
pub mod consolidation;
pub mod decay;
pub mod engine;
mod error;
pub mod homeostasis;
pub mod memory;
pub mod reward;
pub mod search;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    AddInput, CycleReport, DownscaleStats, Engram, EngramStats, GraphLink, KindStats, LayerStats,
    MemoryKind, MemoryLayer, Polarity, RecallOptions, RecallResult, RewardOutcome, RowCounts,
};

// Engine facade
pub use engine::Engine;

// Errors
pub use error::{EngramError, Result};

// Configuration
pub use config::{EngramConfig, DEFAULT_DECAY_RATES, DEFAULT_RELIABILITY};

// Clock injection
pub use clock::{Clock, ManualClock, SystemClock};

// Storage layer
pub use storage::{MemStore, NewEngram, SqliteStore, Store};

// Pure models, for hosts composing their own pipelines
pub use activation::{base_level, retrieval_activation, spreading};
pub use confidence::{
    annotate as confidence_annotate, combined_score, confidence_label, content_reliability,
    retrieval_salience, Confidence,
};
pub use decay::{effective_strength, retrievability, should_forget, stability};
pub use reward::detect_feedback;
pub use search::sanitize_fts_query;

// Anomaly tracking
pub use anomaly::{Baseline, BaselineTracker};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AddInput, Engine, Engram, EngramConfig, EngramError, EngramStats, MemoryKind, MemoryLayer,
        RecallOptions, RecallResult, Result, Store,
    };
}
