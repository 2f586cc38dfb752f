use std::collections::HashSet;

use crate::amount_index::AmountIndex;
use crate::cascade::{self, CascadeState, PassContext};
use crate::config::{MatchConfig, Mode};
use crate::error::ReconError;
use crate::model::{ReconMeta, ReconReport, ReconStats, Transaction};
use crate::progress::RunOptions;

type PassFn = fn(&PassContext<'_>, &mut CascadeState) -> Result<(), ReconError>;

/// The cascade in confidence order. The two combination passes sit last
/// and only see what every single-candidate pass declined.
const PASSES: [PassFn; 7] = [
    cascade::pass_reference_id,
    cascade::pass_exact_date,
    cascade::pass_strict_window,
    cascade::pass_loose_amount,
    cascade::pass_fuzzy_date,
    cascade::pass_one_to_many,
    cascade::pass_many_to_one,
];

/// Fixed progress checkpoints: one before the first pass, one after each
/// pass, one with the assembled result.
const PROGRESS_STEPS: [u8; 9] = [5, 15, 30, 50, 65, 75, 85, 92, 100];

/// Run reconciliation with a built-in mode profile.
pub fn reconcile(
    bank: &[Transaction],
    ledger: &[Transaction],
    mode: Mode,
    options: RunOptions<'_>,
) -> Result<ReconReport, ReconError> {
    run(&mode.config(), mode.to_string(), bank, ledger, options)
}

/// Run reconciliation with explicit tuning, e.g. a TOML override file.
pub fn reconcile_with(
    config: &MatchConfig,
    bank: &[Transaction],
    ledger: &[Transaction],
    options: RunOptions<'_>,
) -> Result<ReconReport, ReconError> {
    config.validate()?;
    run(config, "custom".into(), bank, ledger, options)
}

fn run(
    config: &MatchConfig,
    mode: String,
    bank: &[Transaction],
    ledger: &[Transaction],
    mut options: RunOptions<'_>,
) -> Result<ReconReport, ReconError> {
    validate_side("bank", bank)?;
    validate_side("ledger", ledger)?;

    let bank_order = date_order(bank);
    let ledger_order = date_order(ledger);
    let bank_index = AmountIndex::build(bank);
    let ledger_index = AmountIndex::build(ledger);
    let ctx = PassContext {
        bank,
        ledger,
        bank_order: &bank_order,
        ledger_order: &ledger_order,
        bank_index: &bank_index,
        ledger_index: &ledger_index,
        config,
    };

    let mut state = CascadeState::new();
    report(&mut options, PROGRESS_STEPS[0]);

    for (i, pass) in PASSES.iter().enumerate() {
        check_cancelled(&options)?;
        let combination_pass = i >= PASSES.len() - 2;
        if !(combination_pass && config.max_combination_depth == 0) {
            pass(&ctx, &mut state)?;
        }
        report(&mut options, PROGRESS_STEPS[i + 1]);
    }

    check_cancelled(&options)?;
    let matches = state.into_groups();

    let matched_bank: HashSet<&str> = matches
        .iter()
        .flat_map(|g| g.bank.iter().map(|t| t.id.as_str()))
        .collect();
    let matched_ledger: HashSet<&str> = matches
        .iter()
        .flat_map(|g| g.ledger.iter().map(|t| t.id.as_str()))
        .collect();

    let unmatched_bank: Vec<Transaction> = bank
        .iter()
        .filter(|t| !matched_bank.contains(t.id.as_str()))
        .cloned()
        .collect();
    let unmatched_ledger: Vec<Transaction> = ledger
        .iter()
        .filter(|t| !matched_ledger.contains(t.id.as_str()))
        .cloned()
        .collect();

    let stats = build_stats(
        bank.len(),
        ledger.len(),
        unmatched_bank.len(),
        unmatched_ledger.len(),
    );

    let report_out = ReconReport {
        meta: ReconMeta {
            mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        matches,
        unmatched_bank,
        unmatched_ledger,
        stats,
    };
    report(&mut options, PROGRESS_STEPS[8]);
    Ok(report_out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pass iteration order: ascending date, ties by original input position.
fn date_order(side: &[Transaction]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..side.len()).collect();
    order.sort_by(|&a, &b| side[a].date.cmp(&side[b].date).then(a.cmp(&b)));
    order
}

fn validate_side(side: &str, txns: &[Transaction]) -> Result<(), ReconError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(txns.len());
    for t in txns {
        if !seen.insert(t.id.as_str()) {
            return Err(ReconError::DuplicateId {
                side: side.into(),
                id: t.id.clone(),
            });
        }
        if t.amount_cents < 0 {
            return Err(ReconError::NegativeAmount {
                side: side.into(),
                id: t.id.clone(),
            });
        }
    }
    Ok(())
}

fn build_stats(
    total_bank: usize,
    total_ledger: usize,
    unmatched_bank: usize,
    unmatched_ledger: usize,
) -> ReconStats {
    let matched_bank = total_bank - unmatched_bank;
    let matched_ledger = total_ledger - unmatched_ledger;
    let total = total_bank + total_ledger;
    let match_rate = if total == 0 {
        0.0
    } else {
        (matched_bank + matched_ledger) as f64 / total as f64 * 100.0
    };
    ReconStats {
        total_bank,
        total_ledger,
        matched_bank_count: matched_bank,
        matched_ledger_count: matched_ledger,
        unmatched_bank_count: unmatched_bank,
        unmatched_ledger_count: unmatched_ledger,
        match_rate,
    }
}

fn report(options: &mut RunOptions<'_>, percent: u8) {
    if let Some(sink) = options.progress.as_mut() {
        sink.report(percent);
    }
}

fn check_cancelled(options: &RunOptions<'_>) -> Result<(), ReconError> {
    if options.cancel.is_some_and(|c| c.is_cancelled()) {
        return Err(ReconError::Cancelled);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
