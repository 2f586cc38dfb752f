//! `ledgermatch-engine` — bank-to-ledger reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded transactions, runs the multi-pass
//! matching cascade, returns match groups and residuals. No file IO.

pub mod amount_index;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod model;
pub mod progress;
pub mod similarity;
pub mod subset_sum;
pub mod text;

pub use config::{MatchConfig, Mode};
pub use engine::{reconcile, reconcile_with};
pub use error::ReconError;
pub use model::{MatchGroup, MatchKind, ReconReport, ReconStats, Transaction, TxnKind};
pub use progress::{CancelToken, ProgressSink, RunOptions};
