//! SQLite store implementation.
//!
//! Durable backend: engram rows, append-only access log, graph links and an
//! FTS5 index kept in sync by triggers. Separate reader/writer connections
//! give interior mutability - all methods take `&self`, so the store is
//! `Send + Sync` and the engine can hold it in an `Arc` without an outer
//! mutex. Every mutating call serialises behind the writer connection's
//! lock; multi-row updates run inside one transaction.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{EngramError, Result};
use crate::memory::{Engram, GraphLink, MemoryKind, MemoryLayer, RowCounts};
use crate::storage::{NewEngram, Store};

/// Durable SQLite-backed store.
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (or create) a store at `path`; `None` resolves the
    /// platform-specific data directory.
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = directories::ProjectDirs::from("dev", "engram", "engram")
                    .ok_or_else(|| {
                        EngramError::Store("could not determine project directories".to_string())
                    })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("engram.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| EngramError::Store("writer lock poisoned".to_string()))
    }

    fn lock_reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| EngramError::Store("reader lock poisoned".to_string()))
    }

    /// Convert a row to an Engram (access history attached separately)
    fn row_to_engram(row: &rusqlite::Row) -> rusqlite::Result<Engram> {
        let kind: String = row.get("kind")?;
        let layer: String = row.get("layer")?;

        Ok(Engram {
            id: row.get("id")?,
            content: row.get("content")?,
            kind: MemoryKind::parse(&kind).unwrap_or_default(),
            layer: MemoryLayer::parse(&layer).unwrap_or_default(),
            created_at: row.get("created_at")?,
            access_times: Vec::new(),
            working_strength: row.get("working_strength")?,
            core_strength: row.get("core_strength")?,
            importance: row.get("importance")?,
            pinned: row.get("pinned")?,
            consolidation_count: row.get("consolidation_count")?,
            last_consolidated: row.get("last_consolidated")?,
            source: row.get("source")?,
        })
    }

    /// Attach ordered access histories to a batch of engrams with one query.
    fn attach_access_times(conn: &Connection, engrams: &mut [Engram]) -> Result<()> {
        if engrams.is_empty() {
            return Ok(());
        }

        let mut stmt = conn.prepare("SELECT engram_id, ts FROM access_log ORDER BY ts, id")?;
        let mut by_id: HashMap<String, Vec<f64>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        for row in rows {
            let (id, ts) = row?;
            by_id.entry(id).or_default().push(ts);
        }

        for engram in engrams.iter_mut() {
            if let Some(times) = by_id.remove(&engram.id) {
                engram.access_times = times;
            }
        }
        Ok(())
    }

    /// Access history for a single engram.
    fn load_access_times(conn: &Connection, id: &str) -> Result<Vec<f64>> {
        let mut stmt =
            conn.prepare("SELECT ts FROM access_log WHERE engram_id = ?1 ORDER BY ts, id")?;
        let times = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(times)
    }

    fn query_engrams(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Engram>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(sql)?;
        let mut engrams = stmt
            .query_map(args, |row| Self::row_to_engram(row))?
            .collect::<rusqlite::Result<Vec<Engram>>>()?;
        Self::attach_access_times(&reader, &mut engrams)?;
        Ok(engrams)
    }

    fn write_engram_fields(conn: &Connection, engram: &Engram) -> Result<()> {
        let rows = conn.execute(
            "UPDATE engrams SET
                content = ?1,
                kind = ?2,
                layer = ?3,
                working_strength = ?4,
                core_strength = ?5,
                importance = ?6,
                pinned = ?7,
                consolidation_count = ?8,
                last_consolidated = ?9,
                source = ?10
            WHERE id = ?11",
            params![
                engram.content,
                engram.kind.as_str(),
                engram.layer.as_str(),
                engram.working_strength,
                engram.core_strength,
                engram.importance,
                engram.pinned,
                engram.consolidation_count,
                engram.last_consolidated,
                engram.source,
                engram.id,
            ],
        )?;

        if rows == 0 {
            return Err(EngramError::NotFound(engram.id.clone()));
        }
        Ok(())
    }

    /// Export without blocking: fails with `LockBusy` when a writer holds
    /// the lock.
    pub fn try_export_snapshot(&self, path: &Path) -> Result<()> {
        let writer = self
            .writer
            .try_lock()
            .map_err(|_| EngramError::LockBusy("export would block on the writer lock"))?;
        Self::vacuum_into(&writer, path)
    }

    fn vacuum_into(conn: &Connection, path: &Path) -> Result<()> {
        // VACUUM INTO refuses to overwrite
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let target = path
            .to_str()
            .ok_or_else(|| EngramError::BadArg("export path is not valid UTF-8".to_string()))?;
        conn.execute("VACUUM INTO ?1", params![target])?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn add(&self, new: NewEngram) -> Result<Engram> {
        let id = Uuid::new_v4().to_string();
        let importance = new.importance.clamp(0.0, 1.0);

        {
            let mut writer = self.lock_writer()?;
            let tx = writer.transaction()?;
            tx.execute(
                "INSERT INTO engrams (
                    id, content, kind, layer, created_at,
                    working_strength, core_strength,
                    importance, pinned, consolidation_count, last_consolidated, source
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 0, NULL, ?9)",
                params![
                    id,
                    new.content,
                    new.kind.as_str(),
                    MemoryLayer::Working.as_str(),
                    new.created_at,
                    1.0,
                    0.0,
                    importance,
                    new.source,
                ],
            )?;
            tx.execute(
                "INSERT INTO access_log (engram_id, ts) VALUES (?1, ?2)",
                params![id, new.created_at],
            )?;
            tx.commit()?;
        }

        tracing::debug!(%id, kind = %new.kind, "engram encoded");

        self.peek(&id)?
            .ok_or_else(|| EngramError::NotFound(id))
    }

    fn get(&self, id: &str, now: f64) -> Result<Option<Engram>> {
        let Some(mut engram) = self.peek(id)? else {
            return Ok(None);
        };
        self.record_access(id, now)?;
        engram.access_times.push(now);
        Ok(Some(engram))
    }

    fn peek(&self, id: &str) -> Result<Option<Engram>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare("SELECT * FROM engrams WHERE id = ?1")?;
        let engram = stmt
            .query_row(params![id], |row| Self::row_to_engram(row))
            .optional()?;

        match engram {
            Some(mut engram) => {
                engram.access_times = Self::load_access_times(&reader, id)?;
                Ok(Some(engram))
            }
            None => Ok(None),
        }
    }

    fn update(&self, engram: &Engram) -> Result<()> {
        let writer = self.lock_writer()?;
        Self::write_engram_fields(&writer, engram)
    }

    fn update_batch(&self, engrams: &[Engram]) -> Result<()> {
        if engrams.is_empty() {
            return Ok(());
        }

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        for engram in engrams {
            Self::write_engram_fields(&tx, engram)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let writer = self.lock_writer()?;
        // access_log and graph_links cascade via foreign keys
        let rows = writer.execute("DELETE FROM engrams WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn all(&self) -> Result<Vec<Engram>> {
        self.query_engrams("SELECT * FROM engrams", &[])
    }

    fn search_fts(&self, query: &str, limit: usize) -> Result<Vec<Engram>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let result = self.query_engrams(
            "SELECT e.* FROM engrams e
             JOIN engram_fts fts ON e.id = fts.id
             WHERE engram_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
            &[&query, &(limit as i64)],
        );

        match result {
            Err(EngramError::Database(err))
                if err.to_string().contains("fts5") || err.to_string().contains("MATCH") =>
            {
                Err(EngramError::BadQuery(query.to_string()))
            }
            other => other,
        }
    }

    fn by_kind(&self, kind: MemoryKind) -> Result<Vec<Engram>> {
        self.query_engrams("SELECT * FROM engrams WHERE kind = ?1", &[&kind.as_str()])
    }

    fn by_layer(&self, layer: MemoryLayer) -> Result<Vec<Engram>> {
        self.query_engrams("SELECT * FROM engrams WHERE layer = ?1", &[&layer.as_str()])
    }

    fn record_access(&self, id: &str, ts: f64) -> Result<()> {
        let writer = self.lock_writer()?;
        let rows = writer.execute(
            "INSERT INTO access_log (engram_id, ts)
             SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM engrams WHERE id = ?1)",
            params![id, ts],
        )?;
        if rows == 0 {
            return Err(EngramError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn add_graph_link(&self, id: &str, link: &GraphLink) -> Result<()> {
        if self.peek(id)?.is_none() {
            return Err(EngramError::NotFound(id.to_string()));
        }
        let writer = self.lock_writer()?;
        writer.execute(
            "INSERT INTO graph_links (engram_id, entity, relation) VALUES (?1, ?2, ?3)",
            params![id, link.entity, link.relation],
        )?;
        Ok(())
    }

    fn graph_links(&self, id: &str) -> Result<Vec<GraphLink>> {
        let reader = self.lock_reader()?;
        let mut stmt =
            reader.prepare("SELECT entity, relation FROM graph_links WHERE engram_id = ?1")?;
        let links = stmt
            .query_map(params![id], |row| {
                Ok(GraphLink {
                    entity: row.get(0)?,
                    relation: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<GraphLink>>>()?;
        Ok(links)
    }

    fn neighbors(&self, id: &str) -> Result<Vec<String>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT DISTINCT other.engram_id
             FROM graph_links own
             JOIN graph_links other ON own.entity = other.entity
             WHERE own.engram_id = ?1 AND other.engram_id != ?1",
        )?;
        let ids = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn row_counts(&self) -> Result<RowCounts> {
        let reader = self.lock_reader()?;
        let engrams: i64 = reader.query_row("SELECT COUNT(*) FROM engrams", [], |r| r.get(0))?;
        let access_log: i64 =
            reader.query_row("SELECT COUNT(*) FROM access_log", [], |r| r.get(0))?;
        let graph_links: i64 =
            reader.query_row("SELECT COUNT(*) FROM graph_links", [], |r| r.get(0))?;

        Ok(RowCounts {
            engrams: engrams as usize,
            access_log: access_log as usize,
            graph_links: graph_links as usize,
        })
    }

    fn export(&self, path: &Path) -> Result<()> {
        // Hold the writer lock for the duration so the snapshot is a
        // consistent point-in-time copy
        let writer = self.lock_writer()?;
        Self::vacuum_into(&writer, path)?;
        tracing::info!(path = %path.display(), "store exported");
        Ok(())
    }

    fn try_export(&self, path: &Path) -> Result<()> {
        self.try_export_snapshot(path)
    }
}
