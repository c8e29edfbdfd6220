//! Property tests for the universal invariants, run against both store
//! backends.

use proptest::prelude::*;

use engram_e2e_tests::{add, both_engines};
use engram_core::{
    retrievability, Engram, EngramConfig, MemoryKind, MemoryLayer, RecallOptions, Store,
};

const T0: f64 = 1_700_000_000.0;

/// A randomly generated maintenance operation.
#[derive(Debug, Clone)]
enum Op {
    Add { kind_idx: usize, importance: f64 },
    Get { idx: usize },
    Recall,
    Consolidate { days: f64 },
    Downscale { factor: f64 },
    Reward { positive: bool },
    Pin { idx: usize },
    Prune,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, 0.0f64..=1.0).prop_map(|(kind_idx, importance)| Op::Add {
            kind_idx,
            importance
        }),
        (0usize..8).prop_map(|idx| Op::Get { idx }),
        Just(Op::Recall),
        (0.0f64..3.0).prop_map(|days| Op::Consolidate { days }),
        (0.5f64..=1.0).prop_map(|factor| Op::Downscale { factor }),
        any::<bool>().prop_map(|positive| Op::Reward { positive }),
        (0usize..8).prop_map(|idx| Op::Pin { idx }),
        Just(Op::Prune),
    ]
}

fn check_invariants(all: &[Engram], label: &str) {
    for e in all {
        assert!(e.working_strength >= 0.0, "{label}: r1 negative on {}", e.id);
        assert!(e.core_strength >= 0.0, "{label}: r2 negative on {}", e.id);
        assert!(
            (0.0..=1.0).contains(&e.importance),
            "{label}: importance out of range on {}",
            e.id
        );
        assert!(
            !e.access_times.is_empty() && e.access_times[0] == e.created_at,
            "{label}: access log head must be created_at on {}",
            e.id
        );
        assert!(
            e.access_times.windows(2).all(|w| w[0] <= w[1]),
            "{label}: access log must be non-decreasing on {}",
            e.id
        );
        if e.pinned {
            assert_eq!(e.layer, MemoryLayer::Core, "{label}: pinned off-core {}", e.id);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any sequence of public operations keeps every persisted engram
    /// inside the documented invariants, and pinned engrams keep their
    /// traces byte-for-byte.
    #[test]
    fn invariants_hold_under_random_operations(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        for (backend, t) in both_engines(T0) {
            let mut ids: Vec<String> = Vec::new();
            let mut pinned_snapshots: Vec<(String, f64, f64, f64)> = Vec::new();

            for op in &ops {
                t.clock.advance(600.0);
                match op {
                    Op::Add { kind_idx, importance } => {
                        let kind = MemoryKind::ALL[*kind_idx];
                        ids.push(add(&t.engine, &format!("engram number {}", ids.len()), kind, Some(*importance)));
                    }
                    Op::Get { idx } => {
                        if let Some(id) = ids.get(idx % ids.len().max(1)) {
                            t.engine.get(id).unwrap();
                        }
                    }
                    Op::Recall => {
                        t.engine.recall("engram", RecallOptions::default()).unwrap();
                    }
                    Op::Consolidate { days } => {
                        t.engine.consolidate(*days).unwrap();
                    }
                    Op::Downscale { factor } => {
                        t.engine.downscale(Some(*factor)).unwrap();
                    }
                    Op::Reward { positive } => {
                        let feedback = if *positive { "good, thanks" } else { "wrong, stop" };
                        t.engine.reward(feedback, None).unwrap();
                    }
                    Op::Pin { idx } => {
                        if let Some(id) = ids.get(idx % ids.len().max(1)) {
                            t.engine.pin(id).unwrap();
                            let e = t.engine.peek(id).unwrap().unwrap();
                            pinned_snapshots.push((
                                id.clone(),
                                e.working_strength,
                                e.core_strength,
                                e.importance,
                            ));
                        }
                    }
                    Op::Prune => {
                        t.engine.prune_forgotten(None).unwrap();
                    }
                }

                let all = t.engine.store().all().unwrap();
                check_invariants(&all, backend);
            }

            // Pinned traces must be exactly what they were at pin time
            for (id, r1, r2, importance) in &pinned_snapshots {
                let e = t.engine.peek(id).unwrap().unwrap();
                prop_assert_eq!(e.working_strength, *r1, "{}: pinned r1 drifted", backend);
                prop_assert_eq!(e.core_strength, *r2, "{}: pinned r2 drifted", backend);
                prop_assert_eq!(e.importance, *importance, "{}: pinned importance drifted", backend);
                prop_assert_eq!(e.layer, MemoryLayer::Core, "{}", backend);
            }
        }
    }

    /// Downscaling preserves the ranking of r1 + r2 across the non-pinned
    /// set exactly.
    #[test]
    fn downscale_preserves_trace_ordering(
        strengths in proptest::collection::vec((0.0f64..2.0, 0.0f64..2.0), 2..12),
        factor in 0.01f64..=1.0,
    ) {
        for (backend, t) in both_engines(T0) {
            let mut ids = Vec::new();
            for (i, (r1, r2)) in strengths.iter().enumerate() {
                let id = add(&t.engine, &format!("row {i}"), MemoryKind::Factual, Some(0.5));
                let mut e = t.engine.peek(&id).unwrap().unwrap();
                e.working_strength = *r1;
                e.core_strength = *r2;
                t.engine.store().update(&e).unwrap();
                ids.push(id);
            }

            let rank_before = ranked(&t, &ids);
            t.engine.downscale(Some(factor)).unwrap();
            let rank_after = ranked(&t, &ids);

            prop_assert_eq!(rank_before, rank_after, "{}: ordering changed", backend);
        }
    }

    /// A consolidation step followed by a zero-length step equals the
    /// single step: dt = 0 must not transfer, decay, replay or count.
    #[test]
    fn zero_step_consolidation_is_idempotent(days in 0.1f64..5.0) {
        for (backend, t) in both_engines(T0) {
            for kind in [MemoryKind::Factual, MemoryKind::Emotional, MemoryKind::Episodic] {
                add(&t.engine, &format!("{kind} row"), kind, None);
            }

            t.engine.consolidate(days).unwrap();
            let after_dt = snapshot(&t);

            let report = t.engine.consolidate(0.0).unwrap();
            prop_assert_eq!(report.working_consolidated, 0, "{}", backend);
            prop_assert_eq!(report.replayed, 0, "{}", backend);
            prop_assert_eq!(snapshot(&t), after_dt, "{}: zero step changed state", backend);
        }
    }

    /// Retrievability is exactly 1.0 when queried at the last access time.
    #[test]
    fn retrievability_is_one_at_last_access(
        kind_idx in 0usize..6,
        importance in 0.0f64..=1.0,
        age_days in 0.0f64..400.0,
    ) {
        let config = EngramConfig::default();
        let created = T0;
        let last = T0 + age_days * 86_400.0;
        let engram = Engram {
            id: "prop".into(),
            content: "retrievability probe".into(),
            kind: MemoryKind::ALL[kind_idx],
            layer: MemoryLayer::Working,
            created_at: created,
            access_times: vec![created, last],
            working_strength: 1.0,
            core_strength: 0.0,
            importance,
            pinned: false,
            consolidation_count: 0,
            last_consolidated: None,
            source: String::new(),
        };

        prop_assert_eq!(retrievability(&engram, last, &config), 1.0);
        prop_assert!(retrievability(&engram, last + 86_400.0, &config) < 1.0);
    }
}

fn ranked(t: &engram_e2e_tests::TestEngine, ids: &[String]) -> Vec<String> {
    let mut rows: Vec<(String, f64)> = ids
        .iter()
        .map(|id| {
            let e = t.engine.peek(id).unwrap().unwrap();
            (id.clone(), e.working_strength + e.core_strength)
        })
        .collect();
    // Stable sort keeps equal-strength rows in id order for comparability
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    rows.into_iter().map(|(id, _)| id).collect()
}

fn snapshot(t: &engram_e2e_tests::TestEngine) -> Vec<String> {
    let mut rows: Vec<String> = t
        .engine
        .store()
        .all()
        .unwrap()
        .iter()
        .map(|e| {
            format!(
                "{}|{:.12}|{:.12}|{:.12}|{}|{}",
                e.id, e.working_strength, e.core_strength, e.importance, e.layer, e.consolidation_count
            )
        })
        .collect();
    rows.sort();
    rows
}
