//! Harness errors and their process exit codes.

use puppet_types::TransactionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the simulation harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Input file could not be opened.
    #[error("file doesn't exist: {0}")]
    FileNotFound(PathBuf),

    /// Input file had no header line.
    #[error("no header found in {0}")]
    MissingHeader(PathBuf),

    /// Header declares more object columns than a transaction can carry.
    #[error("too many {kind} object columns: {count}")]
    TooManyColumns {
        /// "read" or "written".
        kind: &'static str,
        /// Number of matching columns.
        count: usize,
    },

    /// A non-empty cell did not parse as a decimal address.
    #[error("not an address: {0:?}")]
    NotAnAddress(String),

    /// Address value exceeds the configured width.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Row carries more objects than a transaction can hold.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Configuration file missing, malformed, or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input file failed mid-read.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarnessError::FileNotFound(_) => 1,
            HarnessError::MissingHeader(_) => 2,
            HarnessError::TooManyColumns { .. } => 2,
            HarnessError::NotAnAddress(_) => 3,
            HarnessError::OutOfRange(_) => 4,
            HarnessError::Transaction(_) => 2,
            HarnessError::InvalidConfig(_) => 1,
            HarnessError::Io(_) => 1,
        }
    }
}
