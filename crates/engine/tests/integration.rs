//! End-to-end reconciliation scenarios and universal invariants.

use std::collections::HashSet;

use chrono::NaiveDate;
use ledgermatch_engine::progress::RunOptions;
use ledgermatch_engine::similarity::similarity;
use ledgermatch_engine::subset_sum::find_subset;
use ledgermatch_engine::{
    reconcile, reconcile_with, MatchKind, Mode, ReconReport, Transaction, TxnKind,
};

fn txn(id: &str, date: &str, desc: &str, cents: i64, kind: TxnKind) -> Transaction {
    Transaction::new(
        id,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        desc,
        cents,
        kind,
    )
}

fn run(bank: &[Transaction], ledger: &[Transaction], mode: Mode) -> ReconReport {
    reconcile(bank, ledger, mode, RunOptions::default()).unwrap()
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[test]
fn reference_id_match_over_wide_date_gap() {
    let bank = [txn("b1", "2024-01-05", "TRF INV-99821 ACME", 125_000, TxnKind::Debit)];
    let ledger = [txn("l1", "2024-02-15", "Invoice 99821 payment", 125_000, TxnKind::Debit)];
    let result = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(result.matches.len(), 1);
    let g = &result.matches[0];
    assert_eq!(g.kind, MatchKind::Exact);
    assert_eq!(g.confidence, 0.99);
    assert!(g.reason.contains("Reference ID"), "reason: {}", g.reason);
    assert!(result.unmatched_bank.is_empty());
    assert!(result.unmatched_ledger.is_empty());
}

#[test]
fn perfect_match_beats_near_miss_on_same_amount() {
    let bank = [txn("b1", "2024-03-10", "ACME CORP SERVICES", 50_000, TxnKind::Debit)];
    let ledger = [
        txn("l1", "2024-03-10", "Acme Corp Services Ltd", 50_000, TxnKind::Debit),
        txn("l2", "2024-03-10", "Unrelated", 50_000, TxnKind::Debit),
    ];
    let result = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(result.matches.len(), 1);
    let g = &result.matches[0];
    assert_eq!(g.kind, MatchKind::Exact);
    assert_eq!(g.confidence, 0.95);
    assert_eq!(g.reason, "Perfect Match");
    assert_eq!(g.ledger[0].id, "l1");
    assert_eq!(result.unmatched_ledger.len(), 1);
    assert_eq!(result.unmatched_ledger[0].id, "l2");
}

#[test]
fn fuzzy_match_with_date_offset() {
    let bank = [txn("b1", "2024-04-01", "Salary June K Mensah", 300_000, TxnKind::Credit)];
    let ledger = [txn("l1", "2024-04-08", "K. Mensah salary payment", 300_000, TxnKind::Credit)];
    let result = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(result.matches.len(), 1);
    let g = &result.matches[0];
    assert_eq!(g.kind, MatchKind::Fuzzy);
    let raw = similarity("Salary June K Mensah", "K. Mensah salary payment");
    assert!(raw >= 0.6, "raw similarity {raw}");
    let expected = raw - (7.0 / 10.0) * 0.2;
    assert!((g.confidence - expected).abs() < 1e-9, "confidence {}", g.confidence);
    assert!(g.reason.contains("% text sim"), "reason: {}", g.reason);
    assert!(g.reason.contains("7d offset"), "reason: {}", g.reason);
}

#[test]
fn one_to_many_split() {
    let bank = [txn("b1", "2024-05-02", "Bulk payment", 100_000, TxnKind::Debit)];
    let ledger = [
        txn("l1", "2024-05-01", "Part A", 40_000, TxnKind::Debit),
        txn("l2", "2024-05-03", "Part B", 60_000, TxnKind::Debit),
        txn("l3", "2024-05-02", "Noise", 25_000, TxnKind::Debit),
    ];
    let result = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(result.matches.len(), 1);
    let g = &result.matches[0];
    assert_eq!(g.kind, MatchKind::OneToMany);
    assert_eq!(g.confidence, 0.85);
    assert_eq!(g.bank.len(), 1);
    let mut ids: Vec<&str> = g.ledger.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["l1", "l2"]);
    assert_eq!(result.unmatched_ledger.len(), 1);
    assert_eq!(result.unmatched_ledger[0].id, "l3");
}

#[test]
fn loose_amount_fee_variant() {
    let bank = [txn("b1", "2024-06-10", "Wire ACME Holdings", 99_875, TxnKind::Debit)];
    let ledger = [txn("l1", "2024-06-10", "Wire ACME Holdings", 100_000, TxnKind::Debit)];
    let result = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(result.matches.len(), 1);
    let g = &result.matches[0];
    assert_eq!(g.kind, MatchKind::Fuzzy);
    assert_eq!(g.confidence, 0.88);
    assert!(
        g.reason.contains("Approx Amount (Diff: 1.25)"),
        "reason: {}",
        g.reason
    );
}

#[test]
fn speed_mode_leaves_wide_offset_unmatched() {
    // Matches under accuracy (window 10, threshold 0.60); under speed the
    // window shrinks to 3 days and the threshold rises to 0.85.
    let bank = [txn("b1", "2024-04-01", "Salary June K Mensah", 300_000, TxnKind::Credit)];
    let ledger = [txn("l1", "2024-04-09", "K. Mensah salary payment", 300_000, TxnKind::Credit)];

    let accurate = run(&bank, &ledger, Mode::Accuracy);
    assert_eq!(accurate.matches.len(), 1);

    let fast = run(&bank, &ledger, Mode::Speed);
    assert!(fast.matches.is_empty());
    assert_eq!(fast.unmatched_bank.len(), 1);
    assert_eq!(fast.unmatched_ledger.len(), 1);
}

#[test]
fn debit_never_matches_credit() {
    let bank = [txn("b1", "2024-01-05", "TRF INV-99821", 125_000, TxnKind::Debit)];
    let ledger = [txn("l1", "2024-01-05", "Invoice 99821", 125_000, TxnKind::Credit)];
    let result = run(&bank, &ledger, Mode::Accuracy);
    assert!(result.matches.is_empty());
}

// ---------------------------------------------------------------------------
// Universal invariants over a mixed fixture
// ---------------------------------------------------------------------------

/// One of each: reference hit, perfect match, strict-window, loose-amount,
/// fuzzy-date, split, merge, and two orphans.
fn mixed_fixture() -> (Vec<Transaction>, Vec<Transaction>) {
    let bank = vec![
        txn("b1", "2024-01-05", "TRF INV-99821 ACME", 125_000, TxnKind::Debit),
        txn("b2", "2024-03-10", "ACME CORP SERVICES", 50_000, TxnKind::Debit),
        txn("b3", "2024-03-20", "Office rent March", 80_000, TxnKind::Debit),
        txn("b4", "2024-06-10", "Wire Beta Industries", 99_875, TxnKind::Debit),
        txn("b5", "2024-04-01", "Salary June K Mensah", 300_000, TxnKind::Credit),
        txn("b6", "2024-05-02", "Bulk supplier payment", 100_000, TxnKind::Debit),
        txn("b7", "2024-07-01", "Refund part one", 15_000, TxnKind::Credit),
        txn("b8", "2024-07-02", "Refund part two", 25_000, TxnKind::Credit),
        txn("b9", "2024-09-09", "Orphan entry", 77_700, TxnKind::Debit),
    ];
    let ledger = vec![
        txn("l1", "2024-02-15", "Invoice 99821 payment", 125_000, TxnKind::Debit),
        txn("l2", "2024-03-10", "Acme Corp Services Ltd", 50_000, TxnKind::Debit),
        txn("l3", "2024-03-22", "Office rent March", 80_000, TxnKind::Debit),
        txn("l4", "2024-06-10", "Wire Beta Industries", 100_000, TxnKind::Debit),
        txn("l5", "2024-04-08", "K. Mensah salary payment", 300_000, TxnKind::Credit),
        txn("l6", "2024-05-01", "Supplier part A", 40_000, TxnKind::Debit),
        txn("l7", "2024-05-03", "Supplier part B", 60_000, TxnKind::Debit),
        txn("l8", "2024-07-01", "Customer refund combined", 40_000, TxnKind::Credit),
        txn("l9", "2024-10-10", "Orphan ledger entry", 88_800, TxnKind::Credit),
    ];
    (bank, ledger)
}

fn matched_ids(result: &ReconReport) -> (HashSet<String>, HashSet<String>) {
    let bank = result
        .matches
        .iter()
        .flat_map(|g| g.bank.iter().map(|t| t.id.clone()))
        .collect();
    let ledger = result
        .matches
        .iter()
        .flat_map(|g| g.ledger.iter().map(|t| t.id.clone()))
        .collect();
    (bank, ledger)
}

#[test]
fn mixed_fixture_exercises_every_pass() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let kinds: HashSet<MatchKind> = result.matches.iter().map(|g| g.kind).collect();
    assert!(kinds.contains(&MatchKind::Exact));
    assert!(kinds.contains(&MatchKind::Fuzzy));
    assert!(kinds.contains(&MatchKind::OneToMany));
    assert!(kinds.contains(&MatchKind::ManyToOne));
    assert_eq!(result.unmatched_bank.len(), 1);
    assert_eq!(result.unmatched_bank[0].id, "b9");
    assert_eq!(result.unmatched_ledger.len(), 1);
    assert_eq!(result.unmatched_ledger[0].id, "l9");
}

#[test]
fn disjointness_and_coverage() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let (matched_bank, matched_ledger) = matched_ids(&result);

    for t in &result.unmatched_bank {
        assert!(!matched_bank.contains(&t.id), "{} both matched and unmatched", t.id);
    }
    for t in &result.unmatched_ledger {
        assert!(!matched_ledger.contains(&t.id), "{} both matched and unmatched", t.id);
    }
    assert_eq!(matched_bank.len() + result.unmatched_bank.len(), bank.len());
    assert_eq!(matched_ledger.len() + result.unmatched_ledger.len(), ledger.len());
}

#[test]
fn no_transaction_appears_in_two_groups() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for g in &result.matches {
        for t in &g.bank {
            assert!(seen.insert(("bank", t.id.as_str())), "duplicate {}", t.id);
        }
        for t in &g.ledger {
            assert!(seen.insert(("ledger", t.id.as_str())), "duplicate {}", t.id);
        }
    }
}

#[test]
fn amount_closure_per_group() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let config = Mode::Accuracy.config();
    for g in &result.matches {
        let delta = (g.bank_total_cents() - g.ledger_total_cents()).abs();
        assert!(
            delta <= config.amount_tolerance_loose_cents,
            "group {} delta {delta}",
            g.id
        );
        if g.kind != MatchKind::Fuzzy {
            assert!(
                delta <= config.amount_tolerance_cents,
                "non-fuzzy group {} delta {delta}",
                g.id
            );
        }
    }
}

#[test]
fn type_homogeneity_per_group() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    for g in &result.matches {
        let polarity = g.bank[0].kind;
        assert!(g.bank.iter().chain(g.ledger.iter()).all(|t| t.kind == polarity));
    }
}

#[test]
fn deterministic_across_runs() {
    let (bank, ledger) = mixed_fixture();
    let a = run(&bank, &ledger, Mode::Accuracy);
    let b = run(&bank, &ledger, Mode::Accuracy);

    assert_eq!(a.matches.len(), b.matches.len());
    for (ga, gb) in a.matches.iter().zip(&b.matches) {
        assert_eq!(ga.kind, gb.kind);
        assert_eq!(ga.reason, gb.reason);
        assert_eq!(ga.confidence, gb.confidence);
        let ids = |g: &ledgermatch_engine::MatchGroup| {
            (
                g.bank.iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
                g.ledger.iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
            )
        };
        assert_eq!(ids(ga), ids(gb));
    }
    let order = |txns: &[Transaction]| txns.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
    assert_eq!(order(&a.unmatched_bank), order(&b.unmatched_bank));
    assert_eq!(order(&a.unmatched_ledger), order(&b.unmatched_ledger));
}

#[test]
fn tighter_config_never_adds_matches() {
    let (bank, ledger) = mixed_fixture();
    let loose = run(&bank, &ledger, Mode::Accuracy);
    let (loose_bank, loose_ledger) = matched_ids(&loose);

    let mut tight = Mode::Accuracy.config();
    tight.date_window_strict = 1;
    tight.date_window_loose = 3;
    tight.date_window_reference = 10;
    tight.fuzzy_text_threshold = 0.85;
    tight.max_combination_depth = 2;
    let tightened = reconcile_with(&tight, &bank, &ledger, RunOptions::default()).unwrap();
    let (tight_bank, tight_ledger) = matched_ids(&tightened);

    assert!(tight_bank.is_subset(&loose_bank), "new bank matches under tighter config");
    assert!(tight_ledger.is_subset(&loose_ledger), "new ledger matches under tighter config");
}

#[test]
fn stats_are_consistent() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let s = &result.stats;
    assert_eq!(s.matched_bank_count + s.unmatched_bank_count, s.total_bank);
    assert_eq!(s.matched_ledger_count + s.unmatched_ledger_count, s.total_ledger);
    let expected = (s.matched_bank_count + s.matched_ledger_count) as f64
        / (s.total_bank + s.total_ledger) as f64
        * 100.0;
    assert!((s.match_rate - expected).abs() < 1e-9);
}

#[test]
fn report_serializes_with_kind_literals() {
    let (bank, ledger) = mixed_fixture();
    let result = run(&bank, &ledger, Mode::Accuracy);
    let json = serde_json::to_value(&result).unwrap();
    let kinds: Vec<&str> = json["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["kind"].as_str().unwrap())
        .collect();
    for kind in kinds {
        assert!(["exact", "fuzzy", "one-to-many", "many-to-one"].contains(&kind));
    }
    assert!(json["stats"]["match_rate"].is_number());
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn similarity_bounded_and_symmetric(a in ".{0,40}", b in ".{0,40}") {
            let ab = similarity(&a, &b);
            let ba = similarity(&b, &a);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn similarity_reflexive(a in ".{0,40}") {
            prop_assert_eq!(similarity(&a, &a), 1.0);
        }

        #[test]
        fn subset_sum_result_is_valid(
            amounts in proptest::collection::vec(0i64..10_000, 0..12),
            target in 0i64..30_000,
            tolerance in 0i64..100,
            depth in 0usize..5,
        ) {
            if let Some(picked) = find_subset(&amounts, target, tolerance, depth) {
                prop_assert!(!picked.is_empty());
                prop_assert!(picked.len() <= depth);
                let mut unique = picked.clone();
                unique.dedup();
                prop_assert_eq!(unique.len(), picked.len());
                let sum: i64 = picked.iter().map(|&i| amounts[i]).sum();
                prop_assert!((sum - target).abs() <= tolerance);
            }
        }

        #[test]
        fn subset_sum_finds_planted_subset(
            planted in proptest::collection::vec(1i64..5_000, 1..4),
            noise in proptest::collection::vec(1i64..5_000, 0..6),
        ) {
            let target: i64 = planted.iter().sum();
            let mut pool = planted.clone();
            pool.extend(&noise);
            let found = find_subset(&pool, target, 0, 4);
            prop_assert!(found.is_some());
        }
    }
}
