// ledgermatch CLI - batch reconciliation of bank statements against ledgers

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_PARSE, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_UNMATCHED};
use ledgermatch_engine::ingest::load_csv_transactions;
use ledgermatch_engine::progress::{ProgressSink, RunOptions};
use ledgermatch_engine::{
    reconcile, reconcile_with, MatchConfig, MatchKind, Mode, ReconError, ReconReport,
};

#[derive(Parser)]
#[command(name = "lmatch")]
#[command(about = "Match bank-statement entries against ledger entries")]
#[command(version)]
#[command(after_help = "\
Examples:
  lmatch bank.csv ledger.csv
  lmatch bank.csv ledger.csv --mode speed --json
  lmatch bank.csv ledger.csv --config tuning.toml --output result.json

Input layout: CSV with header id,date,description,amount,type
  (dates YYYY-MM-DD, amounts with up to two decimals, type debit|credit)")]
struct Cli {
    /// Bank-side statement CSV
    bank: PathBuf,

    /// Ledger-side statement CSV
    ledger: PathBuf,

    /// Tuning profile
    #[arg(long, value_enum, default_value_t = CliMode::Accuracy)]
    mode: CliMode,

    /// TOML tuning override; takes precedence over --mode
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full JSON report to stdout
    #[arg(long)]
    json: bool,

    /// Write the JSON report to a file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Show pass-by-pass progress on stderr
    #[arg(long)]
    progress: bool,

    /// Suppress the human summary
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    Speed,
    Accuracy,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Speed => Mode::Speed,
            CliMode::Accuracy => Mode::Accuracy,
        }
    }
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("lmatch: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

fn run(cli: &Cli) -> Result<u8, CliError> {
    let result = run_files(
        &cli.bank,
        &cli.ledger,
        cli.mode.into(),
        cli.config.as_deref(),
        cli.progress,
    )?;

    if cli.output.is_some() || cli.json {
        let json = serde_json::to_string_pretty(&result).map_err(|e| CliError {
            code: EXIT_RUNTIME,
            message: format!("JSON serialization error: {e}"),
        })?;
        if let Some(ref path) = cli.output {
            std::fs::write(path, &json).map_err(|e| CliError {
                code: EXIT_RUNTIME,
                message: format!("cannot write {}: {e}", path.display()),
            })?;
            if !cli.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if cli.json {
            println!("{json}");
        }
    }

    if !cli.quiet {
        eprintln!("{}", summarize(&result));
    }

    if result.stats.unmatched_bank_count + result.stats.unmatched_ledger_count > 0 {
        Ok(EXIT_UNMATCHED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Load both sides, pick the tuning, run the engine.
fn run_files(
    bank_path: &Path,
    ledger_path: &Path,
    mode: Mode,
    config_path: Option<&Path>,
    show_progress: bool,
) -> Result<ReconReport, CliError> {
    let bank_csv = read_input(bank_path)?;
    let ledger_csv = read_input(ledger_path)?;

    let bank = load_csv_transactions("bank", &bank_csv).map_err(engine_error)?;
    let ledger = load_csv_transactions("ledger", &ledger_csv).map_err(engine_error)?;

    let mut stderr_progress = StderrProgress;
    let options = RunOptions {
        progress: show_progress.then_some(&mut stderr_progress as &mut dyn ProgressSink),
        cancel: None,
    };

    let result = match config_path {
        Some(path) => {
            let toml_str = read_input(path)?;
            let config = MatchConfig::from_toml(&toml_str).map_err(engine_error)?;
            reconcile_with(&config, &bank, &ledger, options)
        }
        None => reconcile(&bank, &ledger, mode, options),
    };
    result.map_err(engine_error)
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_RUNTIME,
        message: format!("cannot read {}: {e}", path.display()),
    })
}

fn engine_error(e: ReconError) -> CliError {
    CliError {
        code: error_exit_code(&e),
        message: e.to_string(),
    }
}

fn error_exit_code(e: &ReconError) -> u8 {
    match e {
        ReconError::DuplicateId { .. }
        | ReconError::NegativeAmount { .. }
        | ReconError::DateParse { .. }
        | ReconError::AmountParse { .. }
        | ReconError::KindParse { .. }
        | ReconError::MissingColumn { .. } => EXIT_PARSE,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Cancelled | ReconError::InvariantViolation(_) | ReconError::Io(_) => {
            EXIT_RUNTIME
        }
    }
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn report(&mut self, percent: u8) {
        eprintln!("  progress: {percent}%");
    }
}

/// Human summary, one screen, stderr-friendly.
fn summarize(result: &ReconReport) -> String {
    let s = &result.stats;
    let count = |kind: MatchKind| result.matches.iter().filter(|g| g.kind == kind).count();
    format!(
        "{} recon: {} bank / {} ledger entries\n\
         matched: {} groups ({} exact, {} fuzzy, {} split, {} merge)\n\
         unmatched: {} bank, {} ledger\n\
         match rate: {:.1}%",
        result.meta.mode,
        s.total_bank,
        s.total_ledger,
        result.matches.len(),
        count(MatchKind::Exact),
        count(MatchKind::Fuzzy),
        count(MatchKind::OneToMany),
        count(MatchKind::ManyToOne),
        s.unmatched_bank_count,
        s.unmatched_ledger_count,
        s.match_rate,
    )
}
