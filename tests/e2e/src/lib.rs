//! Shared harness for the end-to-end suite.
//!
//! Builds engines over both store backends with a deterministic clock and a
//! fixed replay seed, so every scenario is reproducible.

use std::path::PathBuf;
use std::sync::Arc;

use engram_core::{
    AddInput, Engine, EngramConfig, ManualClock, MemStore, MemoryKind, SqliteStore, Store,
};

/// An engine under test plus the handles the scenarios drive.
pub struct TestEngine {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    /// Keeps on-disk stores alive for the duration of the test
    pub _tempdir: Option<tempfile::TempDir>,
}

/// Deterministic config: fixed replay seed, everything else default.
pub fn test_config() -> EngramConfig {
    EngramConfig {
        replay_seed: Some(0xE269),
        ..EngramConfig::default()
    }
}

/// Engine over the in-memory store, clock frozen at `start`.
pub fn mem_engine(start: f64) -> TestEngine {
    let clock = Arc::new(ManualClock::new(start));
    let engine = Engine::with_store(Arc::new(MemStore::new()), test_config(), clock.clone());
    TestEngine {
        engine,
        clock,
        _tempdir: None,
    }
}

/// Engine over a fresh on-disk SQLite store, clock frozen at `start`.
pub fn sqlite_engine(start: f64) -> TestEngine {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteStore::open(Some(dir.path().join("engram.db"))).expect("open store");
    let clock = Arc::new(ManualClock::new(start));
    let engine = Engine::with_store(Arc::new(store), test_config(), clock.clone());
    TestEngine {
        engine,
        clock,
        _tempdir: Some(dir),
    }
}

/// Both backends, for contract-parity runs.
pub fn both_engines(start: f64) -> Vec<(&'static str, TestEngine)> {
    vec![
        ("memstore", mem_engine(start)),
        ("sqlite", sqlite_engine(start)),
    ]
}

/// Shorthand add with kind and importance.
pub fn add(engine: &Engine, content: &str, kind: MemoryKind, importance: Option<f64>) -> String {
    engine
        .add(AddInput {
            kind,
            importance,
            ..AddInput::new(content)
        })
        .expect("add")
}

/// Path inside a fresh temp dir (for export targets).
pub fn temp_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

/// Raw store handle of an engine.
pub fn store(engine: &Engine) -> &Arc<dyn Store> {
    engine.store()
}
