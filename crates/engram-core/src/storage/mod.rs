//! Storage layer.
//!
//! The [`Store`] trait is the seam between the pure cognitive models and
//! durable persistence. The engine owns engrams only for the duration of a
//! single operation and commits every change back through this interface;
//! the store exclusively owns the rows, the append-only access log and the
//! full-text index.
//!
//! Two implementations ship: [`SqliteStore`] (durable, FTS5-backed) and
//! [`MemStore`] (in-memory, used by property tests and ephemeral engines).

mod memstore;
mod migrations;
mod sqlite;

pub use memstore::MemStore;
pub use migrations::{apply_migrations, Migration, MIGRATIONS};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::memory::{Engram, GraphLink, MemoryKind, MemoryLayer, RowCounts};
use std::path::Path;

/// Fields for a not-yet-persisted engram. The store assigns the id and
/// the initial trace values.
#[derive(Debug, Clone)]
pub struct NewEngram {
    /// Content to persist (already tagged if tags were supplied)
    pub content: String,
    /// Kind of memory
    pub kind: MemoryKind,
    /// Resolved importance in [0, 1]
    pub importance: f64,
    /// Free-form origin identifier
    pub source: String,
    /// Encoding time (epoch seconds)
    pub created_at: f64,
}

/// Durable persistence interface.
///
/// Implementations must be safe to share across threads: concurrent readers
/// are allowed, all writes serialise behind a single writer lock, and every
/// multi-row method commits atomically.
pub trait Store: Send + Sync {
    /// Persist a new engram: assign an id, set `working_strength = 1.0`,
    /// `core_strength = 0.0`, `layer = Working`, and write one access-log
    /// row at the creation time. Returns the created row.
    fn add(&self, new: NewEngram) -> Result<Engram>;

    /// Fetch by id, appending one access-log row at `now`.
    /// Returns `None` if absent.
    fn get(&self, id: &str, now: f64) -> Result<Option<Engram>>;

    /// Fetch by id without touching the access log.
    fn peek(&self, id: &str) -> Result<Option<Engram>>;

    /// Write all mutable fields atomically. Does not touch the access log.
    /// Fails with `NotFound` if the id is absent.
    fn update(&self, engram: &Engram) -> Result<()>;

    /// Update many engrams in one transaction: either all rows commit or
    /// none do.
    fn update_batch(&self, engrams: &[Engram]) -> Result<()>;

    /// Delete by id, cascading to access-log and graph-link rows.
    /// Returns whether a row existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Every engram. Iteration order unspecified. No access-log side effect.
    fn all(&self) -> Result<Vec<Engram>>;

    /// Full-text candidates for a sanitised query, best rank first.
    fn search_fts(&self, query: &str, limit: usize) -> Result<Vec<Engram>>;

    /// Filtered iteration by kind.
    fn by_kind(&self, kind: MemoryKind) -> Result<Vec<Engram>>;

    /// Filtered iteration by layer.
    fn by_layer(&self, layer: MemoryLayer) -> Result<Vec<Engram>>;

    /// Append one access-log row. The log is append-only; rows are never
    /// rewritten.
    fn record_access(&self, id: &str, ts: f64) -> Result<()>;

    /// Attach an (entity, relation) pair to an engram.
    fn add_graph_link(&self, id: &str, link: &GraphLink) -> Result<()>;

    /// All graph links of an engram.
    fn graph_links(&self, id: &str) -> Result<Vec<GraphLink>>;

    /// Ids of engrams sharing at least one entity token with `id`.
    fn neighbors(&self, id: &str) -> Result<Vec<String>>;

    /// Raw table sizes.
    fn row_counts(&self) -> Result<RowCounts>;

    /// Write a consistent snapshot of the whole store to `path`, holding
    /// the writer lock for the duration.
    fn export(&self, path: &Path) -> Result<()>;

    /// Like [`Store::export`] but fails with `LockBusy` instead of blocking
    /// when a writer is active. Backends without writer contention just
    /// export.
    fn try_export(&self, path: &Path) -> Result<()> {
        self.export(path)
    }
}
