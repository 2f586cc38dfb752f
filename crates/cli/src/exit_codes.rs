//! CLI Exit Code Registry
//!
//! Single source of truth for exit codes. They are part of the shell
//! contract: close scripts branch on them.
//!
//! | Code | Meaning                                      |
//! |------|----------------------------------------------|
//! | 0    | Fully reconciled, no residual entries        |
//! | 1    | Reconciliation ran but entries remain open   |
//! | 2    | CLI usage error (bad args, handled by clap)  |
//! | 5    | Parse error in an input statement            |
//! | 6    | Invalid tuning config                        |
//! | 7    | Runtime error (IO, internal invariant)       |

/// Fully reconciled.
pub const EXIT_SUCCESS: u8 = 0;

/// Residual unmatched entries on either side.
/// Like `diff(1)`, exit 1 means "the sides differ."
pub const EXIT_UNMATCHED: u8 = 1;

/// Parse error reading input statements.
pub const EXIT_PARSE: u8 = 5;

/// Tuning config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// IO failure or fatal engine error.
pub const EXIT_RUNTIME: u8 = 7;
