//! End-to-end behavioural scenarios, run against both store backends.

use engram_e2e_tests::{add, both_engines, mem_engine, sqlite_engine};
use engram_core::{AddInput, MemoryKind, MemoryLayer, Polarity, RecallOptions, Store};

const HOUR: f64 = 3600.0;
const DAY: f64 = 86_400.0;
const T0: f64 = 1_700_000_000.0;

#[test]
fn recency_and_frequency_beat_a_single_touch() {
    for (backend, t) in both_engines(T0) {
        // A: ten accesses spaced one hour apart, ending one hour before the
        // query. B: a single access one hour before the query.
        let a = add(&t.engine, "alpha trace rehearsed often", MemoryKind::Factual, None);
        for _ in 0..9 {
            t.clock.advance(HOUR);
            t.engine.get(&a).unwrap();
        }
        let _b = add(&t.engine, "beta note seen once", MemoryKind::Factual, None);

        t.clock.advance(HOUR);
        let results = t
            .engine
            .recall("", RecallOptions { limit: 2, ..Default::default() })
            .unwrap();

        assert_eq!(results.len(), 2, "{backend}");
        assert_eq!(results[0].id, a, "{backend}: frequent engram should lead");
        assert!(results[0].activation > results[1].activation, "{backend}");
    }
}

#[test]
fn context_keywords_steer_ranking() {
    for (backend, t) in both_engines(T0) {
        let a = add(&t.engine, "Supabase database backend", MemoryKind::Factual, None);
        let _b = add(&t.engine, "random unrelated database note", MemoryKind::Factual, None);

        t.clock.advance(HOUR);
        let results = t
            .engine
            .recall(
                "database",
                RecallOptions {
                    limit: 2,
                    context: vec!["supabase".into()],
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!results.is_empty(), "{backend}");
        assert_eq!(results[0].id, a, "{backend}: context match should lead");
    }
}

#[test]
fn emotional_importance_consolidates_faster() {
    let t = mem_engine(T0);
    let emotional = add(
        &t.engine,
        "they said the launch mattered to them",
        MemoryKind::Emotional,
        Some(0.9),
    );
    let episodic = add(
        &t.engine,
        "saw a mildly funny meme",
        MemoryKind::Episodic,
        Some(0.2),
    );

    for _ in 0..7 {
        t.clock.advance_days(1.0);
        t.engine.consolidate(1.0).unwrap();
    }

    let emotional = t.engine.peek(&emotional).unwrap().unwrap();
    let episodic = t.engine.peek(&episodic).unwrap().unwrap();
    assert!(
        emotional.core_strength > episodic.core_strength,
        "importance-squared modulation should favour the emotional trace"
    );
}

#[test]
fn pinned_engrams_are_immutable_under_maintenance() {
    for (backend, t) in both_engines(T0) {
        let id = add(
            &t.engine,
            "never forget this one",
            MemoryKind::Emotional,
            Some(0.95),
        );
        t.engine.pin(&id).unwrap();

        for _ in 0..7 {
            t.clock.advance_days(1.0);
            t.engine.consolidate(1.0).unwrap();
        }
        t.engine.downscale(Some(0.5)).unwrap();

        let e = t.engine.peek(&id).unwrap().unwrap();
        assert_eq!(e.working_strength, 1.0, "{backend}");
        assert_eq!(e.core_strength, 0.0, "{backend}");
        assert_eq!(e.importance, 0.95, "{backend}");
        assert_eq!(e.layer, MemoryLayer::Core, "{backend}");
    }
}

#[test]
fn reward_decays_down_the_eligibility_trace() {
    let t = mem_engine(T0);
    let x = add(&t.engine, "first memory", MemoryKind::Factual, Some(0.3));
    t.clock.advance(HOUR);
    let y = add(&t.engine, "second memory", MemoryKind::Factual, Some(0.3));
    t.clock.advance(HOUR);
    let z = add(&t.engine, "third memory", MemoryKind::Factual, Some(0.3));
    t.clock.advance(HOUR);

    let outcome = t.engine.reward("good job!", Some(3)).unwrap();
    assert_eq!(outcome.polarity, Polarity::Positive);
    assert!((outcome.confidence - 0.5).abs() < 1e-9);
    assert_eq!(outcome.applied, 3);

    let gain = |id: &str| t.engine.peek(id).unwrap().unwrap().importance - 0.3;
    let (gx, gy, gz) = (gain(&x), gain(&y), gain(&z));

    // magnitude 0.15 * 0.5 = 0.075, discounted by 1 / (1 + 0.5 i)
    assert!((gz - 0.075).abs() < 1e-9);
    assert!(gz > gy && gy > gx && gx > 0.0);
}

#[test]
fn pruning_archives_without_deleting() {
    for (backend, t) in both_engines(T0) {
        let weak = add(&t.engine, "weak whisper", MemoryKind::Factual, Some(0.3));
        let pinned = add(&t.engine, "pinned whisper", MemoryKind::Factual, Some(0.3));
        t.engine.pin(&pinned).unwrap();

        for id in [&weak, &pinned] {
            let mut e = t.engine.peek(id).unwrap().unwrap();
            e.working_strength = 0.001;
            e.core_strength = 0.001;
            t.engine.store().update(&e).unwrap();
        }

        t.clock.advance_days(365.0);
        let archived = t.engine.prune_forgotten(Some(0.01)).unwrap();
        assert_eq!(archived, vec![weak.clone()], "{backend}");

        let weak = t.engine.peek(&weak).unwrap().unwrap();
        assert_eq!(weak.layer, MemoryLayer::Archive, "{backend}: archived, not deleted");

        let pinned = t.engine.peek(&pinned).unwrap().unwrap();
        assert_eq!(pinned.layer, MemoryLayer::Core, "{backend}: pinned stays core");
    }
}

#[test]
fn full_lifecycle_add_get_delete() {
    for (backend, t) in both_engines(T0) {
        let id = add(&t.engine, "ephemeral", MemoryKind::Factual, None);

        let first = t.engine.peek(&id).unwrap().unwrap();
        assert_eq!(first.access_times.len(), 1, "{backend}");

        t.clock.advance(HOUR);
        let touched = t.engine.get(&id).unwrap().unwrap();
        assert_eq!(touched.access_times.len(), 2, "{backend}");
        assert_eq!(touched.access_times[0], first.created_at, "{backend}");

        t.engine.forget(&id).unwrap();
        assert!(t.engine.get(&id).unwrap().is_none(), "{backend}");
        assert!(t.engine.forget(&id).is_err(), "{backend}");
    }
}

#[test]
fn retrieval_suppresses_competitors() {
    let t = sqlite_engine(T0);
    let winner = add(
        &t.engine,
        "the deploy password lives in the vault",
        MemoryKind::Factual,
        Some(0.8),
    );
    let competitor = add(
        &t.engine,
        "the deploy password lives in the wiki",
        MemoryKind::Factual,
        Some(0.2),
    );

    // Rehearse the winner so it leads the recall
    for _ in 0..3 {
        t.clock.advance(HOUR);
        t.engine.get(&winner).unwrap();
    }

    t.clock.advance(HOUR);
    let results = t
        .engine
        .recall(
            "deploy password",
            RecallOptions { limit: 1, ..Default::default() },
        )
        .unwrap();
    assert_eq!(results[0].id, winner);

    let competitor = t.engine.peek(&competitor).unwrap().unwrap();
    assert!(
        competitor.working_strength < 1.0,
        "competing engram should be suppressed after retrieval"
    );
}

#[test]
fn archive_is_reachable_only_by_explicit_search() {
    let t = sqlite_engine(T0);
    let id = add(&t.engine, "buried treasure map", MemoryKind::Factual, None);

    let mut e = t.engine.peek(&id).unwrap().unwrap();
    e.layer = MemoryLayer::Archive;
    t.engine.store().update(&e).unwrap();

    t.clock.advance(HOUR);
    let blind = t
        .engine
        .recall("", RecallOptions { limit: 10, ..Default::default() })
        .unwrap();
    assert!(blind.iter().all(|r| r.id != id));

    let explicit = t
        .engine
        .recall("treasure", RecallOptions { limit: 10, ..Default::default() })
        .unwrap();
    assert!(explicit.iter().any(|r| r.id == id));
}

#[test]
fn graph_expansion_pulls_linked_neighbors() {
    let t = sqlite_engine(T0);
    let top = t
        .engine
        .add(AddInput {
            kind: MemoryKind::Procedural,
            ..AddInput::new("release checklist for the api gateway")
        })
        .unwrap();
    let neighbor = add(&t.engine, "oncall rotation notes", MemoryKind::Procedural, None);

    t.engine.link(&top, "api-gateway", "describes").unwrap();
    t.engine.link(&neighbor, "api-gateway", "mentions").unwrap();

    t.clock.advance(HOUR);
    let results = t
        .engine
        .recall(
            "release checklist",
            RecallOptions { limit: 5, ..Default::default() },
        )
        .unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids[0], top.as_str());
    assert!(ids.contains(&neighbor.as_str()));
    assert_eq!(t.engine.neighbors(&top).unwrap(), vec![neighbor]);
}
