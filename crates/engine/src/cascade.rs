//! The ordered match passes and their shared bookkeeping.
//!
//! Each pass is a standalone function from `(PassContext, CascadeState)` to
//! a set of committed match groups. Passes run in a fixed order of
//! decreasing confidence; a committed group is never revisited, so a later
//! pass can only consume transactions every earlier pass declined.

use std::collections::HashSet;

use crate::amount_index::AmountIndex;
use crate::config::MatchConfig;
use crate::error::ReconError;
use crate::model::{MatchGroup, MatchKind, Transaction};
use crate::similarity::similarity;
use crate::subset_sum::find_subset;
use crate::text::reference_tokens;

// ---------------------------------------------------------------------------
// Pass context
// ---------------------------------------------------------------------------

/// Read-only view shared by every pass: both sides, their date-sorted
/// iteration orders, and their amount indexes.
pub struct PassContext<'a> {
    pub bank: &'a [Transaction],
    pub ledger: &'a [Transaction],
    pub bank_order: &'a [usize],
    pub ledger_order: &'a [usize],
    pub bank_index: &'a AmountIndex,
    pub ledger_index: &'a AmountIndex,
    pub config: &'a MatchConfig,
}

/// Absolute calendar distance in whole days.
fn date_diff(a: &Transaction, b: &Transaction) -> i64 {
    (a.date - b.date).num_days().abs()
}

// ---------------------------------------------------------------------------
// Cascade state
// ---------------------------------------------------------------------------

/// The only mutable data in the engine: which ids are consumed, and the
/// append-only group list. Threaded through every pass in order.
#[derive(Debug, Default)]
pub struct CascadeState {
    matched_bank: HashSet<String>,
    matched_ledger: HashSet<String>,
    groups: Vec<MatchGroup>,
}

impl CascadeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bank_is_matched(&self, id: &str) -> bool {
        self.matched_bank.contains(id)
    }

    pub fn ledger_is_matched(&self, id: &str) -> bool {
        self.matched_ledger.contains(id)
    }

    pub fn groups(&self) -> &[MatchGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<MatchGroup> {
        self.groups
    }

    /// Append a new group and consume its transaction ids. Validates the
    /// commit-time invariants; a violation aborts the reconciliation.
    pub fn commit(
        &mut self,
        bank_items: Vec<Transaction>,
        ledger_items: Vec<Transaction>,
        kind: MatchKind,
        reason: String,
        confidence: f64,
        closure_tolerance_cents: i64,
    ) -> Result<(), ReconError> {
        if bank_items.is_empty() || ledger_items.is_empty() {
            return Err(ReconError::InvariantViolation(
                "match group must have items on both sides".into(),
            ));
        }

        let polarity = bank_items[0].kind;
        if bank_items
            .iter()
            .chain(ledger_items.iter())
            .any(|t| t.kind != polarity)
        {
            return Err(ReconError::InvariantViolation(format!(
                "mixed debit/credit polarity in group '{reason}'"
            )));
        }

        for t in &bank_items {
            if !self.matched_bank.insert(t.id.clone()) {
                return Err(ReconError::InvariantViolation(format!(
                    "bank transaction '{}' matched twice",
                    t.id
                )));
            }
        }
        for t in &ledger_items {
            if !self.matched_ledger.insert(t.id.clone()) {
                return Err(ReconError::InvariantViolation(format!(
                    "ledger transaction '{}' matched twice",
                    t.id
                )));
            }
        }

        let bank_total: i64 = bank_items.iter().map(|t| t.amount_cents).sum();
        let ledger_total: i64 = ledger_items.iter().map(|t| t.amount_cents).sum();
        let delta = (bank_total - ledger_total).abs();
        if delta > closure_tolerance_cents {
            return Err(ReconError::InvariantViolation(format!(
                "group amount delta {delta} exceeds tolerance {closure_tolerance_cents}"
            )));
        }

        let id = format!("mg_{}", self.groups.len());
        self.groups.push(MatchGroup {
            id,
            bank: bank_items,
            ledger: ledger_items,
            kind,
            reason,
            confidence,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pass 1: reference-id match
// ---------------------------------------------------------------------------

/// Same amount, same polarity, wide date window, and a shared reference
/// token in the narratives. The strongest evidence the cascade accepts.
pub fn pass_reference_id(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }
        let refs = reference_tokens(&b.description);
        if refs.is_empty() {
            continue;
        }

        let hit = ctx
            .ledger_index
            .near(b.amount_cents, tol)
            .map(|li| &ctx.ledger[li])
            .filter(|l| {
                !state.ledger_is_matched(&l.id)
                    && l.kind == b.kind
                    && date_diff(b, l) <= ctx.config.date_window_reference
            })
            .find(|l| reference_tokens(&l.description).iter().any(|t| refs.contains(t)))
            .cloned();

        if let Some(l) = hit {
            state.commit(
                vec![b.clone()],
                vec![l],
                MatchKind::Exact,
                "Matched by Amount & Reference ID".into(),
                0.99,
                tol,
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 2: perfect date
// ---------------------------------------------------------------------------

/// Same amount, same day. Takes the textually closest candidate; ties go
/// to candidate order.
pub fn pass_exact_date(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for li in ctx.ledger_index.near(b.amount_cents, tol) {
            let l = &ctx.ledger[li];
            if state.ledger_is_matched(&l.id) || l.kind != b.kind || date_diff(b, l) != 0 {
                continue;
            }
            let score = similarity(&b.description, &l.description);
            if best.map_or(true, |(_, bs)| score > bs) {
                best = Some((li, score));
            }
        }

        if let Some((li, score)) = best {
            let reason = if score > 0.8 {
                "Perfect Match"
            } else {
                "Matched by Amount & Exact Date"
            };
            state.commit(
                vec![b.clone()],
                vec![ctx.ledger[li].clone()],
                MatchKind::Exact,
                reason.into(),
                0.95,
                tol,
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 3: strict window
// ---------------------------------------------------------------------------

/// Same amount within a few days. Scores within 0.1 of each other count as
/// tied and fall back to the smaller day offset.
pub fn pass_strict_window(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }

        let mut best: Option<(usize, f64, i64)> = None;
        for li in ctx.ledger_index.near(b.amount_cents, tol) {
            let l = &ctx.ledger[li];
            if state.ledger_is_matched(&l.id) || l.kind != b.kind {
                continue;
            }
            let dd = date_diff(b, l);
            if dd > ctx.config.date_window_strict {
                continue;
            }
            let score = similarity(&b.description, &l.description);
            let better = match best {
                None => true,
                Some((_, bs, bdd)) => {
                    if (score - bs).abs() < 0.1 {
                        dd < bdd
                    } else {
                        score > bs
                    }
                }
            };
            if better {
                best = Some((li, score, dd));
            }
        }

        if let Some((li, score, dd)) = best {
            if score >= 0.5 || dd <= 1 {
                let reason = if score >= 0.8 {
                    "Strong Text & Nearby Date"
                } else {
                    "Amount & Nearby Date"
                };
                state.commit(
                    vec![b.clone()],
                    vec![ctx.ledger[li].clone()],
                    MatchKind::Exact,
                    reason.into(),
                    0.90,
                    tol,
                )?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 3.5: loose amount, strong text
// ---------------------------------------------------------------------------

/// Near-identical narratives where the amounts drift apart (bank fees,
/// rounding). The only pass allowed the loose amount tolerance, and it
/// demands strong text in exchange.
pub fn pass_loose_amount(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let loose = ctx.config.amount_tolerance_loose_cents;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }

        let mut best: Option<(usize, f64, i64)> = None;
        for li in ctx.ledger_index.near(b.amount_cents, loose) {
            let l = &ctx.ledger[li];
            if state.ledger_is_matched(&l.id) || l.kind != b.kind {
                continue;
            }
            if date_diff(b, l) > ctx.config.date_window_strict {
                continue;
            }
            let score = similarity(&b.description, &l.description);
            if score <= 0.85 {
                continue;
            }
            let amount_diff = (b.amount_cents - l.amount_cents).abs();
            let better = match best {
                None => true,
                Some((_, bs, bdiff)) => {
                    if (score - bs).abs() < 0.05 {
                        amount_diff < bdiff
                    } else {
                        score > bs
                    }
                }
            };
            if better {
                best = Some((li, score, amount_diff));
            }
        }

        if let Some((li, _, amount_diff)) = best {
            state.commit(
                vec![b.clone()],
                vec![ctx.ledger[li].clone()],
                MatchKind::Fuzzy,
                format!(
                    "Strong Text, Approx Amount (Diff: {:.2})",
                    amount_diff as f64 / 100.0
                ),
                0.88,
                loose,
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 4: fuzzy date
// ---------------------------------------------------------------------------

/// Same amount across the wide window. Text similarity carries the match;
/// every day of offset shaves up to 0.2 off the recorded confidence.
pub fn pass_fuzzy_date(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    let window = ctx.config.date_window_loose;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }

        let mut best: Option<(usize, f64, f64, i64)> = None; // (pos, raw, final, dd)
        for li in ctx.ledger_index.near(b.amount_cents, tol) {
            let l = &ctx.ledger[li];
            if state.ledger_is_matched(&l.id) || l.kind != b.kind {
                continue;
            }
            let dd = date_diff(b, l);
            if dd > window {
                continue;
            }
            let raw = similarity(&b.description, &l.description);
            let penalty = if window > 0 {
                dd as f64 / window as f64 * 0.2
            } else {
                0.0
            };
            let final_score = raw - penalty;
            if best.map_or(true, |(_, _, bf, _)| final_score > bf) {
                best = Some((li, raw, final_score, dd));
            }
        }

        if let Some((li, raw, final_score, dd)) = best {
            if raw >= ctx.config.fuzzy_text_threshold {
                state.commit(
                    vec![b.clone()],
                    vec![ctx.ledger[li].clone()],
                    MatchKind::Fuzzy,
                    format!("Fuzzy Match ({:.0}% text sim, {dd}d offset)", raw * 100.0),
                    final_score.max(0.0),
                    tol,
                )?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 5: split / merge
// ---------------------------------------------------------------------------

/// One bank entry covered by several ledger entries (a bulk payment posted
/// in parts). Pool is every compatible ledger entry at or under the bank
/// amount, nearest dates first.
pub fn pass_one_to_many(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    for &bi in ctx.bank_order {
        let b = &ctx.bank[bi];
        if state.bank_is_matched(&b.id) {
            continue;
        }

        let mut pool: Vec<usize> = ctx
            .ledger_index
            .at_most(b.amount_cents + tol)
            .filter(|&li| {
                let l = &ctx.ledger[li];
                !state.ledger_is_matched(&l.id)
                    && l.kind == b.kind
                    && date_diff(b, l) <= ctx.config.date_window_strict
            })
            .collect();
        pool.sort_by_key(|&li| date_diff(b, &ctx.ledger[li]));

        let amounts: Vec<i64> = pool.iter().map(|&li| ctx.ledger[li].amount_cents).collect();
        if let Some(picked) =
            find_subset(&amounts, b.amount_cents, tol, ctx.config.max_combination_depth)
        {
            if picked.len() >= 2 {
                let items: Vec<Transaction> =
                    picked.iter().map(|&i| ctx.ledger[pool[i]].clone()).collect();
                let count = items.len();
                state.commit(
                    vec![b.clone()],
                    items,
                    MatchKind::OneToMany,
                    format!("One-to-Many Split ({count} ledger entries)"),
                    0.85,
                    tol,
                )?;
            }
        }
    }
    Ok(())
}

/// Mirror of the split pass: several bank entries against one ledger entry.
pub fn pass_many_to_one(ctx: &PassContext<'_>, state: &mut CascadeState) -> Result<(), ReconError> {
    let tol = ctx.config.amount_tolerance_cents;
    for &li in ctx.ledger_order {
        let l = &ctx.ledger[li];
        if state.ledger_is_matched(&l.id) {
            continue;
        }

        let mut pool: Vec<usize> = ctx
            .bank_index
            .at_most(l.amount_cents + tol)
            .filter(|&bi| {
                let b = &ctx.bank[bi];
                !state.bank_is_matched(&b.id)
                    && b.kind == l.kind
                    && date_diff(l, b) <= ctx.config.date_window_strict
            })
            .collect();
        pool.sort_by_key(|&bi| date_diff(l, &ctx.bank[bi]));

        let amounts: Vec<i64> = pool.iter().map(|&bi| ctx.bank[bi].amount_cents).collect();
        if let Some(picked) =
            find_subset(&amounts, l.amount_cents, tol, ctx.config.max_combination_depth)
        {
            if picked.len() >= 2 {
                let items: Vec<Transaction> =
                    picked.iter().map(|&i| ctx.bank[pool[i]].clone()).collect();
                let count = items.len();
                state.commit(
                    items,
                    vec![l.clone()],
                    MatchKind::ManyToOne,
                    format!("Many-to-One Merge ({count} bank entries)"),
                    0.85,
                    tol,
                )?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
