use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Debit/credit polarity tag. Two transactions may only be matched when
/// their tags are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Debit,
    Credit,
}

impl TxnKind {
    /// Parse a statement polarity tag. Accepts the long form and the
    /// two-letter column codes banks commonly emit.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" | "dr" => Some(Self::Debit),
            "credit" | "cr" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// A single normalized transaction from either side. Inputs are never
/// mutated by the engine; amounts are non-negative integer cents.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount_cents: i64,
    pub kind: TxnKind,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount_cents: i64,
        kind: TxnKind,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            description: description.into(),
            amount_cents,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Match groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    OneToMany,
    ManyToOne,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::OneToMany => write!(f, "one-to-many"),
            Self::ManyToOne => write!(f, "many-to-one"),
        }
    }
}

/// One atomic match decision. Both sides are non-empty; `reason` names the
/// pass that produced the group plus any quantitative hint.
#[derive(Debug, Clone, Serialize)]
pub struct MatchGroup {
    pub id: String,
    pub bank: Vec<Transaction>,
    pub ledger: Vec<Transaction>,
    pub kind: MatchKind,
    pub reason: String,
    pub confidence: f64,
}

impl MatchGroup {
    pub fn bank_total_cents(&self) -> i64 {
        self.bank.iter().map(|t| t.amount_cents).sum()
    }

    pub fn ledger_total_cents(&self) -> i64 {
        self.ledger.iter().map(|t| t.amount_cents).sum()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconStats {
    pub total_bank: usize,
    pub total_ledger: usize,
    pub matched_bank_count: usize,
    pub matched_ledger_count: usize,
    pub unmatched_bank_count: usize,
    pub unmatched_ledger_count: usize,
    /// Matched items across both sides over total items, as a percentage.
    pub match_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub mode: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub matches: Vec<MatchGroup>,
    pub unmatched_bank: Vec<Transaction>,
    pub unmatched_ledger: Vec<Transaction>,
    pub stats: ReconStats,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
