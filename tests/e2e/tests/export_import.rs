//! Export / import round-trips.
//!
//! An export is a consistent snapshot of the backing file; importing is
//! simply opening it as a store. The round-trip must preserve the full
//! multiset of engrams, access-log rows and graph links.

use std::collections::BTreeMap;

use engram_e2e_tests::{add, sqlite_engine, temp_path};
use engram_core::{MemoryKind, RecallOptions, SqliteStore, Store};

const T0: f64 = 1_700_000_000.0;

/// Canonical, order-independent fingerprint of a store's contents.
fn fingerprint(store: &dyn Store) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for e in store.all().unwrap() {
        let links = {
            let mut l = store.graph_links(&e.id).unwrap();
            l.sort_by(|a, b| (&a.entity, &a.relation).cmp(&(&b.entity, &b.relation)));
            l.iter()
                .map(|l| format!("{}->{}", l.entity, l.relation))
                .collect::<Vec<_>>()
                .join(",")
        };
        map.insert(
            e.id.clone(),
            format!(
                "{}|{}|{}|{:.9}|{:.9}|{:.9}|{}|{}|{:?}|{}",
                e.content,
                e.kind,
                e.layer,
                e.working_strength,
                e.core_strength,
                e.importance,
                e.pinned,
                e.consolidation_count,
                e.access_times,
                links,
            ),
        );
    }
    map
}

#[test]
fn export_then_open_preserves_everything() {
    let t = sqlite_engine(T0);

    let a = add(&t.engine, "engram one about databases", MemoryKind::Factual, Some(0.5));
    let b = add(&t.engine, "engram two about people", MemoryKind::Relational, None);
    t.engine.link(&a, "database", "about").unwrap();
    t.engine.link(&b, "teammate", "prefers").unwrap();
    t.engine.pin(&b).unwrap();

    // Generate access history and trace churn before snapshotting
    t.clock.advance(3600.0);
    t.engine.get(&a).unwrap();
    t.engine
        .recall("databases", RecallOptions::default())
        .unwrap();
    t.engine.consolidate(1.0).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = temp_path(&dir, "snapshot.db");
    t.engine.export(&out).unwrap();

    let imported = SqliteStore::open(Some(out)).unwrap();

    assert_eq!(
        t.engine.store().row_counts().unwrap(),
        imported.row_counts().unwrap()
    );
    assert_eq!(fingerprint(t.engine.store().as_ref()), fingerprint(&imported));
}

#[test]
fn export_overwrites_stale_snapshots() {
    let t = sqlite_engine(T0);
    add(&t.engine, "first generation", MemoryKind::Factual, None);

    let dir = tempfile::tempdir().unwrap();
    let out = temp_path(&dir, "snapshot.db");

    t.engine.export(&out).unwrap();
    add(&t.engine, "second generation", MemoryKind::Factual, None);
    t.engine.export(&out).unwrap();

    let imported = SqliteStore::open(Some(out)).unwrap();
    assert_eq!(imported.row_counts().unwrap().engrams, 2);
}

#[test]
fn try_export_succeeds_when_uncontended() {
    let t = sqlite_engine(T0);
    add(&t.engine, "snapshot me", MemoryKind::Factual, None);

    let dir = tempfile::tempdir().unwrap();
    let out = temp_path(&dir, "snapshot.db");
    t.engine.try_export(&out).unwrap();

    let imported = SqliteStore::open(Some(out)).unwrap();
    assert_eq!(imported.row_counts().unwrap().engrams, 1);
}

#[test]
fn imported_store_keeps_serving_recall() {
    let t = sqlite_engine(T0);
    add(&t.engine, "Supabase database backend", MemoryKind::Factual, None);

    let dir = tempfile::tempdir().unwrap();
    let out = temp_path(&dir, "snapshot.db");
    t.engine.export(&out).unwrap();

    let imported = SqliteStore::open(Some(out)).unwrap();
    let hits = imported.search_fts("\"database\"", 10).unwrap();
    assert_eq!(hits.len(), 1);
}
