//! Database migrations
//!
//! Schema migration definitions for the SQLite store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: engrams, access log, graph links, FTS5",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "FTS5 porter tokenizer for stemmed keyword recall",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS engrams (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'factual',
    layer TEXT NOT NULL DEFAULT 'working',
    created_at REAL NOT NULL,

    -- Memory Chain traces
    working_strength REAL NOT NULL DEFAULT 1.0,
    core_strength REAL NOT NULL DEFAULT 0.0,

    -- Encoding modulation
    importance REAL NOT NULL DEFAULT 0.3,
    pinned INTEGER NOT NULL DEFAULT 0,

    -- Consolidation tracking
    consolidation_count INTEGER NOT NULL DEFAULT 0,
    last_consolidated REAL,

    -- Provenance
    source TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_engrams_kind ON engrams(kind);
CREATE INDEX IF NOT EXISTS idx_engrams_layer ON engrams(layer);
CREATE INDEX IF NOT EXISTS idx_engrams_created ON engrams(created_at);

-- Append-only access history, one row per touch
CREATE TABLE IF NOT EXISTS access_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    engram_id TEXT NOT NULL REFERENCES engrams(id) ON DELETE CASCADE,
    ts REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_access_log_engram ON access_log(engram_id);
CREATE INDEX IF NOT EXISTS idx_access_log_ts ON access_log(ts);

-- Opaque entity linkage, resolved by the host
CREATE TABLE IF NOT EXISTS graph_links (
    engram_id TEXT NOT NULL REFERENCES engrams(id) ON DELETE CASCADE,
    entity TEXT NOT NULL,
    relation TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_graph_links_engram ON graph_links(engram_id);
CREATE INDEX IF NOT EXISTS idx_graph_links_entity ON graph_links(entity);

-- FTS5 virtual table for full-text search over content
CREATE VIRTUAL TABLE IF NOT EXISTS engram_fts USING fts5(
    id,
    content,
    content='engrams',
    content_rowid='rowid'
);

-- Triggers to keep FTS in sync
CREATE TRIGGER IF NOT EXISTS engrams_ai AFTER INSERT ON engrams BEGIN
    INSERT INTO engram_fts(rowid, id, content)
    VALUES (NEW.rowid, NEW.id, NEW.content);
END;

CREATE TRIGGER IF NOT EXISTS engrams_ad AFTER DELETE ON engrams BEGIN
    INSERT INTO engram_fts(engram_fts, rowid, id, content)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.content);
END;

CREATE TRIGGER IF NOT EXISTS engrams_au AFTER UPDATE ON engrams BEGIN
    INSERT INTO engram_fts(engram_fts, rowid, id, content)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.content);
    INSERT INTO engram_fts(rowid, id, content)
    VALUES (NEW.rowid, NEW.id, NEW.content);
END;

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: porter tokenizer upgrade (stemming improves keyword recall)
const MIGRATION_V2_UP: &str = r#"
DROP TRIGGER IF EXISTS engrams_ai;
DROP TRIGGER IF EXISTS engrams_ad;
DROP TRIGGER IF EXISTS engrams_au;
DROP TABLE IF EXISTS engram_fts;

CREATE VIRTUAL TABLE engram_fts USING fts5(
    id, content,
    content='engrams',
    content_rowid='rowid',
    tokenize='porter ascii'
);

-- Rebuild FTS index from existing data with the new tokenizer
INSERT INTO engram_fts(engram_fts) VALUES('rebuild');

-- Re-create sync triggers
CREATE TRIGGER engrams_ai AFTER INSERT ON engrams BEGIN
    INSERT INTO engram_fts(rowid, id, content)
    VALUES (NEW.rowid, NEW.id, NEW.content);
END;

CREATE TRIGGER engrams_ad AFTER DELETE ON engrams BEGIN
    INSERT INTO engram_fts(engram_fts, rowid, id, content)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.content);
END;

CREATE TRIGGER engrams_au AFTER UPDATE ON engrams BEGIN
    INSERT INTO engram_fts(engram_fts, rowid, id, content)
    VALUES ('delete', OLD.rowid, OLD.id, OLD.content);
    INSERT INTO engram_fts(rowid, id, content)
    VALUES (NEW.rowid, NEW.id, NEW.content);
END;

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // execute_batch handles multi-statement SQL including triggers
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
