use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// Duplicate transaction id within one side.
    DuplicateId { side: String, id: String },
    /// Negative amount on an input transaction.
    NegativeAmount { side: String, id: String },
    /// Date parse error during ingest.
    DateParse { side: String, record: String, value: String },
    /// Amount parse error during ingest (non-numeric, or more than two
    /// fractional digits).
    AmountParse { side: String, record: String, value: String },
    /// Unknown debit/credit tag during ingest.
    KindParse { side: String, record: String, value: String },
    /// Missing required column in input data.
    MissingColumn { side: String, column: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad tolerance ordering, threshold range, etc.).
    ConfigValidation(String),
    /// Caller requested cancellation between passes.
    Cancelled,
    /// A commit would break an engine invariant; fatal.
    InvariantViolation(String),
    /// IO error (CSV read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { side, id } => {
                write!(f, "side '{side}': duplicate transaction id '{id}'")
            }
            Self::NegativeAmount { side, id } => {
                write!(f, "side '{side}', transaction '{id}': negative amount")
            }
            Self::DateParse { side, record, value } => {
                write!(f, "side '{side}', record '{record}': cannot parse date '{value}'")
            }
            Self::AmountParse { side, record, value } => {
                write!(f, "side '{side}', record '{record}': cannot parse amount '{value}'")
            }
            Self::KindParse { side, record, value } => {
                write!(f, "side '{side}', record '{record}': unknown type '{value}'")
            }
            Self::MissingColumn { side, column } => {
                write!(f, "side '{side}': missing column '{column}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Cancelled => write!(f, "reconciliation cancelled"),
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
