//! Engram - the fundamental unit of memory
//!
//! Each engram is a small piece of text with the metadata the
//! mathematical models need:
//! - Dual traces from the Memory Chain model (working + core strength)
//! - Full access history for ACT-R base-level activation
//! - Importance as the amygdala-analogue encoding modulator
//! - A lifecycle layer (Working / Core / Archive)

use serde::{Deserialize, Serialize};

// ============================================================================
// MEMORY KINDS
// ============================================================================

/// Kinds of memory content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// A discrete fact ("the service uses Supabase")
    #[default]
    Factual,
    /// An event or experience; fades fast
    Episodic,
    /// Knowledge about people and preferences; durable
    Relational,
    /// Emotionally charged content; very durable
    Emotional,
    /// How-to knowledge; very durable
    Procedural,
    /// Subjective judgements; evolve over time
    Opinion,
}

impl MemoryKind {
    /// All kinds, in declaration order. Index order matches the
    /// per-kind tables in [`crate::config::EngramConfig`].
    pub const ALL: [MemoryKind; 6] = [
        MemoryKind::Factual,
        MemoryKind::Episodic,
        MemoryKind::Relational,
        MemoryKind::Emotional,
        MemoryKind::Procedural,
        MemoryKind::Opinion,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Factual => "factual",
            MemoryKind::Episodic => "episodic",
            MemoryKind::Relational => "relational",
            MemoryKind::Emotional => "emotional",
            MemoryKind::Procedural => "procedural",
            MemoryKind::Opinion => "opinion",
        }
    }

    /// Parse from string name. Returns `None` for unknown names so the
    /// public API can reject them as `BadArg`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "factual" => Some(MemoryKind::Factual),
            "episodic" => Some(MemoryKind::Episodic),
            "relational" => Some(MemoryKind::Relational),
            "emotional" => Some(MemoryKind::Emotional),
            "procedural" => Some(MemoryKind::Procedural),
            "opinion" => Some(MemoryKind::Opinion),
            _ => None,
        }
    }

    /// Table index for per-kind config lookups.
    pub(crate) fn index(self) -> usize {
        match self {
            MemoryKind::Factual => 0,
            MemoryKind::Episodic => 1,
            MemoryKind::Relational => 2,
            MemoryKind::Emotional => 3,
            MemoryKind::Procedural => 4,
            MemoryKind::Opinion => 5,
        }
    }

    /// Default importance assigned at encoding when the caller gives none.
    pub fn default_importance(self) -> f64 {
        match self {
            MemoryKind::Factual => 0.3,
            MemoryKind::Episodic => 0.4,
            MemoryKind::Relational => 0.6,
            MemoryKind::Emotional => 0.9,
            MemoryKind::Procedural => 0.5,
            MemoryKind::Opinion => 0.3,
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MEMORY LAYERS
// ============================================================================

/// Coarse lifecycle bucket for an engram.
///
/// Only consolidation (and explicit pin / prune) moves engrams between
/// layers. Archive rows are reachable only through explicit search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryLayer {
    /// Consolidated, always-available knowledge
    Core,
    /// Recent traces still being consolidated
    #[default]
    Working,
    /// Faded knowledge, searched on demand
    Archive,
}

impl MemoryLayer {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryLayer::Core => "core",
            MemoryLayer::Working => "working",
            MemoryLayer::Archive => "archive",
        }
    }

    /// Parse from string name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "core" => Some(MemoryLayer::Core),
            "working" => Some(MemoryLayer::Working),
            "archive" => Some(MemoryLayer::Archive),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ENGRAM
// ============================================================================

/// A single stored memory with full metadata for the mathematical models.
///
/// Timestamps are wall-clock seconds since the Unix epoch; every model
/// takes `now` explicitly rather than reading a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engram {
    /// Unique identifier (UUID v4), stable for life
    pub id: String,
    /// The memory content (natural language), indexed for full-text search
    pub content: String,
    /// Kind of memory
    pub kind: MemoryKind,
    /// Lifecycle layer; derived by consolidation but persisted
    pub layer: MemoryLayer,
    /// Creation time, immutable
    pub created_at: f64,
    /// Every access timestamp, non-decreasing, head == created_at
    pub access_times: Vec<f64>,
    /// r1 - hippocampal-analogue trace, fast decay
    pub working_strength: f64,
    /// r2 - neocortical-analogue trace, slow growth and slow decay
    pub core_strength: f64,
    /// Encoding modulation in [0, 1]; mutated by reward feedback
    pub importance: f64,
    /// Pinned rows are exempt from decay, downscaling, pruning and reward
    pub pinned: bool,
    /// Times this engram has been through a consolidation step
    pub consolidation_count: u32,
    /// When the last consolidation touched this engram
    pub last_consolidated: Option<f64>,
    /// Free-form origin identifier (filename, conversation id, ...)
    pub source: String,
}

impl Engram {
    /// Timestamp of the most recent access (creation time if the log is
    /// somehow empty).
    pub fn last_access(&self) -> f64 {
        self.access_times
            .last()
            .copied()
            .unwrap_or(self.created_at)
    }

    /// Days since creation.
    pub fn age_days(&self, now: f64) -> f64 {
        (now - self.created_at) / 86_400.0
    }

    /// Combined trace strength r1 + r2 (time-free; see
    /// [`crate::decay::effective_strength`] for the time-discounted score).
    pub fn trace_total(&self) -> f64 {
        self.working_strength + self.core_strength
    }
}

// ============================================================================
// GRAPH LINKS
// ============================================================================

/// An (entity, relation) pair attached to an engram.
///
/// Entity tokens are opaque to the engine; resolution lives with the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    /// External entity token
    pub entity: String,
    /// Relation token (may be empty)
    pub relation: String,
}

impl GraphLink {
    /// Create a new link
    pub fn new(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            relation: relation.into(),
        }
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for encoding a new engram.
///
/// Uses `deny_unknown_fields` to prevent field injection when deserialized
/// from an untrusted host payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddInput {
    /// The content to memorize
    pub content: String,
    /// Kind of memory
    #[serde(default)]
    pub kind: MemoryKind,
    /// 0-1 importance; `None` resolves from the per-kind default
    #[serde(default)]
    pub importance: Option<f64>,
    /// Source identifier
    #[serde(default)]
    pub source: String,
    /// Optional tags, appended to the content for searchability
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional graph links to external entities
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl AddInput {
    /// Shorthand for the common case: content only, everything defaulted.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MemoryKind::default(),
            importance: None,
            source: String::new(),
            tags: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl Default for AddInput {
    fn default() -> Self {
        Self::new("")
    }
}

/// Options for a recall query.
///
/// Uses `deny_unknown_fields` to prevent field injection when deserialized
/// from an untrusted host payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecallOptions {
    /// Maximum results to return
    pub limit: usize,
    /// Context keywords boosting relevant engrams via spreading activation
    #[serde(default)]
    pub context: Vec<String>,
    /// Restrict to these kinds (`None` = all)
    #[serde(default)]
    pub kinds: Option<Vec<MemoryKind>>,
    /// Minimum combined confidence (0-1)
    #[serde(default)]
    pub min_confidence: f64,
    /// Expand the top result one hop through the entity graph
    #[serde(default = "default_graph_expand")]
    pub graph_expand: bool,
}

fn default_graph_expand() -> bool {
    true
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            context: Vec::new(),
            kinds: None,
            min_confidence: 0.0,
            graph_expand: true,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
