//! In-memory store implementation.
//!
//! Backs ephemeral engines and lets the property suite exercise the same
//! `Store` contract as the SQLite backend without touching disk. Full-text
//! search is emulated with token matching; ranking quality does not matter
//! here, contract fidelity does.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{EngramError, Result};
use crate::memory::{Engram, GraphLink, MemoryKind, MemoryLayer, RowCounts};
use crate::storage::{NewEngram, Store};

#[derive(Debug, Default)]
struct Inner {
    engrams: HashMap<String, Engram>,
    graph_links: Vec<(String, GraphLink)>,
}

/// Non-durable store; all state lives behind one mutex.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| EngramError::Store("store lock poisoned".to_string()))
    }
}

impl Store for MemStore {
    fn add(&self, new: NewEngram) -> Result<Engram> {
        let engram = Engram {
            id: Uuid::new_v4().to_string(),
            content: new.content,
            kind: new.kind,
            layer: MemoryLayer::Working,
            created_at: new.created_at,
            access_times: vec![new.created_at],
            working_strength: 1.0,
            core_strength: 0.0,
            importance: new.importance.clamp(0.0, 1.0),
            pinned: false,
            consolidation_count: 0,
            last_consolidated: None,
            source: new.source,
        };

        let mut inner = self.lock()?;
        inner.engrams.insert(engram.id.clone(), engram.clone());
        Ok(engram)
    }

    fn get(&self, id: &str, now: f64) -> Result<Option<Engram>> {
        let mut inner = self.lock()?;
        match inner.engrams.get_mut(id) {
            Some(engram) => {
                engram.access_times.push(now);
                Ok(Some(engram.clone()))
            }
            None => Ok(None),
        }
    }

    fn peek(&self, id: &str) -> Result<Option<Engram>> {
        Ok(self.lock()?.engrams.get(id).cloned())
    }

    fn update(&self, engram: &Engram) -> Result<()> {
        let mut inner = self.lock()?;
        match inner.engrams.get_mut(&engram.id) {
            Some(slot) => {
                // The access log is owned by record_access; keep the stored
                // history authoritative
                let access_times = slot.access_times.clone();
                *slot = engram.clone();
                slot.access_times = access_times;
                Ok(())
            }
            None => Err(EngramError::NotFound(engram.id.clone())),
        }
    }

    fn update_batch(&self, engrams: &[Engram]) -> Result<()> {
        let mut inner = self.lock()?;
        // All-or-nothing like the SQLite transaction
        for engram in engrams {
            if !inner.engrams.contains_key(&engram.id) {
                return Err(EngramError::NotFound(engram.id.clone()));
            }
        }
        for engram in engrams {
            if let Some(slot) = inner.engrams.get_mut(&engram.id) {
                let access_times = slot.access_times.clone();
                *slot = engram.clone();
                slot.access_times = access_times;
            }
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let existed = inner.engrams.remove(id).is_some();
        if existed {
            inner.graph_links.retain(|(owner, _)| owner != id);
        }
        Ok(existed)
    }

    fn all(&self) -> Result<Vec<Engram>> {
        Ok(self.lock()?.engrams.values().cloned().collect())
    }

    fn search_fts(&self, query: &str, limit: usize) -> Result<Vec<Engram>> {
        // Tokens arrive quoted from the sanitiser; strip the quoting before
        // matching
        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.eq_ignore_ascii_case("or"))
            .map(|t| t.trim_matches('"').replace("\"\"", "\"").to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.lock()?;
        let mut hits: Vec<(usize, Engram)> = inner
            .engrams
            .values()
            .filter_map(|engram| {
                let content = engram.content.to_lowercase();
                let matched = tokens.iter().filter(|t| content.contains(*t)).count();
                (matched > 0).then(|| (matched, engram.clone()))
            })
            .collect();

        hits.sort_by(|a, b| {
            b.0.cmp(&a.0).then(
                b.1.last_access()
                    .partial_cmp(&a.1.last_access())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        Ok(hits.into_iter().map(|(_, e)| e).take(limit).collect())
    }

    fn by_kind(&self, kind: MemoryKind) -> Result<Vec<Engram>> {
        Ok(self
            .lock()?
            .engrams
            .values()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect())
    }

    fn by_layer(&self, layer: MemoryLayer) -> Result<Vec<Engram>> {
        Ok(self
            .lock()?
            .engrams
            .values()
            .filter(|e| e.layer == layer)
            .cloned()
            .collect())
    }

    fn record_access(&self, id: &str, ts: f64) -> Result<()> {
        let mut inner = self.lock()?;
        match inner.engrams.get_mut(id) {
            Some(engram) => {
                engram.access_times.push(ts);
                Ok(())
            }
            None => Err(EngramError::NotFound(id.to_string())),
        }
    }

    fn add_graph_link(&self, id: &str, link: &GraphLink) -> Result<()> {
        let mut inner = self.lock()?;
        if !inner.engrams.contains_key(id) {
            return Err(EngramError::NotFound(id.to_string()));
        }
        inner.graph_links.push((id.to_string(), link.clone()));
        Ok(())
    }

    fn graph_links(&self, id: &str) -> Result<Vec<GraphLink>> {
        Ok(self
            .lock()?
            .graph_links
            .iter()
            .filter(|(owner, _)| owner == id)
            .map(|(_, link)| link.clone())
            .collect())
    }

    fn neighbors(&self, id: &str) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let own_entities: Vec<&str> = inner
            .graph_links
            .iter()
            .filter(|(owner, _)| owner == id)
            .map(|(_, link)| link.entity.as_str())
            .collect();

        let mut ids: Vec<String> = inner
            .graph_links
            .iter()
            .filter(|(owner, link)| owner != id && own_entities.contains(&link.entity.as_str()))
            .map(|(owner, _)| owner.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn row_counts(&self) -> Result<RowCounts> {
        let inner = self.lock()?;
        Ok(RowCounts {
            engrams: inner.engrams.len(),
            access_log: inner.engrams.values().map(|e| e.access_times.len()).sum(),
            graph_links: inner.graph_links.len(),
        })
    }

    fn export(&self, path: &Path) -> Result<()> {
        // Debugging snapshot only; a JSON dump is not importable as a Store
        let inner = self.lock()?;
        let engrams: Vec<&Engram> = inner.engrams.values().collect();
        let json = serde_json::to_string_pretty(&engrams)
            .map_err(|e| EngramError::Store(format!("serialize failed: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
