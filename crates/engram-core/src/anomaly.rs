//! Anomaly detection over engine metrics.
//!
//! Rolling per-metric Gaussian baselines: each metric keeps a bounded window
//! of observations with Welford-style incremental mean/variance, and a value
//! is anomalous when it sits more than `sigma` standard deviations from the
//! windowed mean. Strictly in-memory and advisory - the engine feeds it and
//! exposes queries, but takes no action on its own.

use std::collections::{HashMap, VecDeque};

/// Baseline statistics for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Baseline {
    /// Windowed mean
    pub mean: f64,
    /// Windowed sample standard deviation
    pub std: f64,
    /// Observations currently in the window
    pub n: usize,
}

/// One metric's bounded window with incremental moments.
#[derive(Debug, Clone)]
struct MetricWindow {
    values: VecDeque<f64>,
    capacity: usize,
    mean: f64,
    m2: f64,
}

impl MetricWindow {
    fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            if let Some(old) = self.values.pop_front() {
                self.remove(old);
            }
        }

        // Welford update
        self.values.push_back(value);
        let n = self.values.len() as f64;
        let delta = value - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (value - self.mean);
    }

    /// Reverse Welford update for the evicted observation. Called after the
    /// value left the deque, so the pre-removal count is `len + 1`.
    fn remove(&mut self, value: f64) {
        let remaining = self.values.len() as f64;
        if remaining < 1.0 {
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }

        let mean_without = ((remaining + 1.0) * self.mean - value) / remaining;
        self.m2 -= (value - self.mean) * (value - mean_without);
        // Floating-point cancellation can leave a tiny negative residue
        self.m2 = self.m2.max(0.0);
        self.mean = mean_without;
    }

    fn baseline(&self) -> Baseline {
        let n = self.values.len();
        let std = if n < 2 {
            0.0
        } else {
            (self.m2 / (n as f64 - 1.0)).sqrt()
        };

        Baseline {
            mean: self.mean,
            std,
            n,
        }
    }
}

/// Rolling baseline tracker - the engine's surprise detector.
///
/// When a metric breaks its own pattern, the host may want to pay extra
/// attention (boost encoding importance, alert, re-tune).
#[derive(Debug, Clone)]
pub struct BaselineTracker {
    window_size: usize,
    metrics: HashMap<String, MetricWindow>,
}

impl BaselineTracker {
    /// Create a tracker keeping `window_size` observations per metric.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            metrics: HashMap::new(),
        }
    }

    /// Record an observation for a metric.
    pub fn update(&mut self, metric: &str, value: f64) {
        self.metrics
            .entry(metric.to_string())
            .or_insert_with(|| MetricWindow::new(self.window_size))
            .push(value);
    }

    /// Current baseline statistics for a metric (zeros if unseen).
    pub fn baseline(&self, metric: &str) -> Baseline {
        self.metrics
            .get(metric)
            .map(MetricWindow::baseline)
            .unwrap_or_default()
    }

    /// Does `value` deviate more than `sigma_threshold` standard deviations
    /// from the rolling mean?
    ///
    /// Requires `min_samples` observations first (avoids warmup false
    /// positives). A zero-variance baseline flags any value that differs
    /// from the mean.
    pub fn is_anomaly(
        &self,
        metric: &str,
        value: f64,
        sigma_threshold: f64,
        min_samples: usize,
    ) -> bool {
        let baseline = self.baseline(metric);

        if baseline.n < min_samples {
            return false;
        }

        if baseline.std == 0.0 {
            return value != baseline.mean;
        }

        (value - baseline.mean).abs() / baseline.std > sigma_threshold
    }

    /// z-score of `value` against the baseline (0.0 with insufficient data).
    pub fn z_score(&self, metric: &str, value: f64) -> f64 {
        let baseline = self.baseline(metric);
        if baseline.n < 2 || baseline.std == 0.0 {
            return 0.0;
        }
        (value - baseline.mean) / baseline.std
    }

    /// Names of all tracked metrics, sorted for stable output.
    pub fn metrics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.metrics.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for BaselineTracker {
    fn default() -> Self {
        Self::new(100)
    }
}
