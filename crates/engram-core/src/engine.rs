//! Engine facade - the public surface of the memory system.
//!
//! Wraps the cognitive models behind a small set of operations:
//! `add`, `recall`, `consolidate`, `forget` / `prune_forgotten`, `reward`,
//! `downscale`, `pin` / `unpin`, `export`, `stats`. Each operation is atomic
//! with respect to the store: mutations serialise behind the store's writer
//! lock and multi-row changes commit in one transaction.
//!
//! The engine reads the clock (through the injected [`Clock`]) and owns the
//! replay RNG and the in-memory anomaly tracker; everything below it takes
//! `now` as data.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::anomaly::{Baseline, BaselineTracker};
use crate::clock::{Clock, SystemClock};
use crate::config::EngramConfig;
use crate::consolidation;
use crate::decay::{self, effective_strength};
use crate::error::{EngramError, Result};
use crate::homeostasis;
use crate::memory::{
    AddInput, CycleReport, DownscaleStats, Engram, EngramStats, GraphLink, KindStats, LayerStats,
    MemoryKind, MemoryLayer, Polarity, RecallOptions, RecallResult, RewardOutcome,
};
use crate::reward;
use crate::search;
use crate::storage::{MemStore, NewEngram, SqliteStore, Store};

/// The Engram memory engine.
///
/// Single-writer, multi-reader embedded library: concurrent `recall` /
/// `get` / `stats` calls are fine, mutating calls queue behind the store's
/// writer lock.
pub struct Engine {
    store: Arc<dyn Store>,
    config: EngramConfig,
    clock: Arc<dyn Clock>,
    tracker: Mutex<BaselineTracker>,
    rng: Mutex<SmallRng>,
}

impl Engine {
    /// Open (or create) a durable engine at `path` with default config.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, EngramConfig::default())
    }

    /// Open (or create) a durable engine at `path`.
    pub fn open_with(path: impl Into<PathBuf>, config: EngramConfig) -> Result<Self> {
        let store = SqliteStore::open(Some(path.into()))?;
        Ok(Self::with_store(
            Arc::new(store),
            config,
            Arc::new(SystemClock),
        ))
    }

    /// Ephemeral engine backed by the in-memory store.
    pub fn in_memory() -> Self {
        Self::in_memory_with(EngramConfig::default())
    }

    /// Ephemeral engine with custom config.
    pub fn in_memory_with(config: EngramConfig) -> Self {
        Self::with_store(
            Arc::new(MemStore::new()),
            config,
            Arc::new(SystemClock),
        )
    }

    /// Assemble an engine from parts. This is the seam tests use to inject
    /// a deterministic clock or an alternative store.
    pub fn with_store(
        store: Arc<dyn Store>,
        config: EngramConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = BaselineTracker::new(config.anomaly_window_size);
        let rng = match config.replay_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Self {
            store,
            config,
            clock,
            tracker: Mutex::new(tracker),
            rng: Mutex::new(rng),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &EngramConfig {
        &self.config
    }

    // ========================================================================
    // ENCODING
    // ========================================================================

    /// Store a new engram and return its id.
    ///
    /// New engrams start with a strong working trace
    /// (`working_strength = 1.0`) and no core trace; consolidation cycles
    /// gradually transfer them. Importance defaults per kind when omitted.
    pub fn add(&self, input: AddInput) -> Result<String> {
        if let Some(importance) = input.importance {
            if !(0.0..=1.0).contains(&importance) {
                return Err(EngramError::BadArg(format!(
                    "importance must be in [0, 1], got {importance}"
                )));
            }
        }

        // Tags ride along in the content so full-text search sees them
        let content = if input.tags.is_empty() {
            input.content
        } else {
            format!("{} [tags: {}]", input.content, input.tags.join(", "))
        };

        let engram = self.store.add(NewEngram {
            content,
            kind: input.kind,
            importance: input
                .importance
                .unwrap_or_else(|| input.kind.default_importance()),
            source: input.source,
            created_at: self.clock.now(),
        })?;

        for link in &input.links {
            self.store.add_graph_link(&engram.id, link)?;
        }

        self.track("encoding_rate", 1.0);
        Ok(engram.id)
    }

    /// Attach an (entity, relation) pair to an existing engram.
    pub fn link(&self, id: &str, entity: &str, relation: &str) -> Result<()> {
        self.store
            .add_graph_link(id, &GraphLink::new(entity, relation))
    }

    // ========================================================================
    // RETRIEVAL
    // ========================================================================

    /// Retrieve relevant engrams by ACT-R activation.
    ///
    /// Each returned engram gets one access-log row, and retrieval-induced
    /// suppression is applied with the top result as the retrieved
    /// competitor.
    pub fn recall(&self, query: &str, opts: RecallOptions) -> Result<Vec<RecallResult>> {
        let now = self.clock.now();
        let results = search::recall(self.store.as_ref(), query, &opts, now, &self.config)?;

        for result in &results {
            self.store.record_access(&result.id, now)?;
        }

        if let Some(top) = results.first() {
            if let Some(retrieved) = self.store.peek(&top.id)? {
                homeostasis::suppress_competitors(
                    self.store.as_ref(),
                    &retrieved,
                    &self.config,
                )?;
            }
        }

        self.track("retrieval_count", results.len() as f64);
        Ok(results)
    }

    /// Fetch one engram by id, recording an access.
    pub fn get(&self, id: &str) -> Result<Option<Engram>> {
        self.store.get(id, self.clock.now())
    }

    /// Fetch one engram by id without touching the access log.
    pub fn peek(&self, id: &str) -> Result<Option<Engram>> {
        self.store.peek(id)
    }

    /// Ids of engrams sharing a graph entity with `id`.
    pub fn neighbors(&self, id: &str) -> Result<Vec<String>> {
        self.store.neighbors(id)
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Run a consolidation cycle ("sleep replay") over `days` of simulated
    /// time, then apply synaptic downscaling when configured to.
    pub fn consolidate(&self, days: f64) -> Result<CycleReport> {
        let now = self.clock.now();
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EngramError::Store("rng lock poisoned".to_string()))?;

        let mut report =
            consolidation::run_cycle(self.store.as_ref(), days, now, &self.config, &mut rng)?;
        drop(rng);

        if self.config.downscale_on_consolidate && days > 0.0 {
            let stats =
                homeostasis::synaptic_downscale(self.store.as_ref(), self.config.downscale_factor)?;
            report.downscaled = stats.n_scaled;
        }

        Ok(report)
    }

    /// Delete one engram permanently (access log and graph links cascade).
    pub fn forget(&self, id: &str) -> Result<()> {
        if self.store.delete(id)? {
            Ok(())
        } else {
            Err(EngramError::NotFound(id.to_string()))
        }
    }

    /// Archive every non-pinned engram whose effective strength has fallen
    /// below `threshold` (config default when `None`). Archiving is layer
    /// reassignment, not deletion. Returns the archived ids.
    pub fn prune_forgotten(&self, threshold: Option<f64>) -> Result<Vec<String>> {
        let threshold = threshold.unwrap_or(self.config.forget_threshold);
        let now = self.clock.now();

        let mut archived = Vec::new();
        let mut touched = Vec::new();
        for mut engram in self.store.all()? {
            if engram.layer == MemoryLayer::Archive {
                continue;
            }
            if decay::should_forget(&engram, threshold, now, &self.config) {
                engram.layer = MemoryLayer::Archive;
                archived.push(engram.id.clone());
                touched.push(engram);
            }
        }

        self.store.update_batch(&touched)?;
        if !archived.is_empty() {
            tracing::info!(count = archived.len(), threshold, "weak engrams archived");
        }
        Ok(archived)
    }

    /// Process user feedback as a reward signal over the most recently
    /// accessed engrams. Neutral or low-confidence feedback is a no-op.
    pub fn reward(&self, feedback: &str, recent_n: Option<usize>) -> Result<RewardOutcome> {
        let (polarity, confidence) = reward::detect_feedback(feedback);

        if polarity == Polarity::Neutral || confidence < 0.3 {
            return Ok(RewardOutcome {
                polarity,
                confidence,
                applied: 0,
            });
        }

        let applied = reward::apply_reward(
            self.store.as_ref(),
            polarity,
            recent_n.unwrap_or(self.config.reward_recent_n),
            self.config.reward_magnitude * confidence,
            &self.config,
        )?;

        Ok(RewardOutcome {
            polarity,
            confidence,
            applied,
        })
    }

    /// Global synaptic downscaling with `factor` (config default when
    /// `None`). Fails with `BadArg` outside `(0, 1]`.
    pub fn downscale(&self, factor: Option<f64>) -> Result<DownscaleStats> {
        homeostasis::synaptic_downscale(
            self.store.as_ref(),
            factor.unwrap_or(self.config.downscale_factor),
        )
    }

    /// Pin an engram: exempt from decay, downscaling, pruning and reward,
    /// and forced into the Core layer.
    pub fn pin(&self, id: &str) -> Result<()> {
        let mut engram = self
            .store
            .peek(id)?
            .ok_or_else(|| EngramError::NotFound(id.to_string()))?;
        engram.pinned = true;
        engram.layer = MemoryLayer::Core;
        self.store.update(&engram)
    }

    /// Unpin an engram; its layer is recomputed on the next consolidation.
    pub fn unpin(&self, id: &str) -> Result<()> {
        let mut engram = self
            .store
            .peek(id)?
            .ok_or_else(|| EngramError::NotFound(id.to_string()))?;
        engram.pinned = false;
        self.store.update(&engram)
    }

    // ========================================================================
    // SNAPSHOTS AND OBSERVABILITY
    // ========================================================================

    /// Export a consistent snapshot of the store to `path`. Blocks until
    /// the writer lock is available.
    pub fn export(&self, path: &Path) -> Result<()> {
        self.store.export(path)
    }

    /// Like [`Engine::export`] but fails with `LockBusy` instead of
    /// blocking.
    pub fn try_export(&self, path: &Path) -> Result<()> {
        self.store.try_export(path)
    }

    /// Memory system statistics.
    pub fn stats(&self) -> Result<EngramStats> {
        let now = self.clock.now();
        let all = self.store.all()?;
        let counts = self.store.row_counts()?;

        let mut stats = EngramStats {
            total: all.len(),
            pinned: all.iter().filter(|e| e.pinned).count(),
            access_log_rows: counts.access_log,
            graph_link_rows: counts.graph_links,
            ..Default::default()
        };

        for kind in MemoryKind::ALL {
            let group: Vec<&Engram> = all.iter().filter(|e| e.kind == kind).collect();
            if group.is_empty() {
                continue;
            }
            let n = group.len() as f64;
            stats.by_kind.insert(
                kind.as_str().to_string(),
                KindStats {
                    count: group.len(),
                    avg_strength: group
                        .iter()
                        .map(|e| effective_strength(e, now, &self.config))
                        .sum::<f64>()
                        / n,
                    avg_importance: group.iter().map(|e| e.importance).sum::<f64>() / n,
                },
            );
        }

        for layer in [MemoryLayer::Core, MemoryLayer::Working, MemoryLayer::Archive] {
            let group: Vec<&Engram> = all.iter().filter(|e| e.layer == layer).collect();
            let n = group.len().max(1) as f64;
            stats.by_layer.insert(
                layer.as_str().to_string(),
                LayerStats {
                    count: group.len(),
                    avg_working: group.iter().map(|e| e.working_strength).sum::<f64>() / n,
                    avg_core: group.iter().map(|e| e.core_strength).sum::<f64>() / n,
                    avg_importance: group.iter().map(|e| e.importance).sum::<f64>() / n,
                },
            );
        }

        let to_datetime = |ts: f64| chrono::DateTime::from_timestamp(ts as i64, 0);
        stats.oldest = all
            .iter()
            .map(|e| e.created_at)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .and_then(to_datetime);
        stats.newest = all
            .iter()
            .map(|e| e.created_at)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .and_then(to_datetime);

        if let Ok(tracker) = self.tracker.lock() {
            stats.tracked_metrics = tracker.metrics();
        }

        Ok(stats)
    }

    /// Feed a host metric into the anomaly tracker.
    pub fn track(&self, metric: &str, value: f64) {
        if let Ok(mut tracker) = self.tracker.lock() {
            tracker.update(metric, value);
        }
    }

    /// Would `value` be anomalous for `metric` against the rolling baseline?
    pub fn is_anomaly(&self, metric: &str, value: f64) -> bool {
        self.tracker
            .lock()
            .map(|t| {
                t.is_anomaly(
                    metric,
                    value,
                    self.config.anomaly_sigma_threshold,
                    self.config.anomaly_min_samples,
                )
            })
            .unwrap_or(false)
    }

    /// Rolling baseline for `metric`.
    pub fn metric_baseline(&self, metric: &str) -> Baseline {
        self.tracker
            .lock()
            .map(|t| t.baseline(metric))
            .unwrap_or_default()
    }
}
