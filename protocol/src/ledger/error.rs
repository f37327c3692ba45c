use thiserror::Error;

use crate::cell::{BocError, CellError};
use crate::crypto::ContentHash;

/// Why a transaction document could not be turned into a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("transaction document: {0}")]
    Boc(#[from] BocError),

    #[error("transaction cell: {0}")]
    Cell(#[from] CellError),

    #[error("not a transaction: tag {0:#06b}")]
    InvalidTag(u64),

    #[error("transaction hash mismatch: indexer says {reported}, cell hashes to {computed}")]
    HashMismatch {
        reported: ContentHash,
        computed: ContentHash,
    },

    #[error("malformed indexer field `{field}`: {reason}")]
    Field { field: &'static str, reason: String },
}

/// Errors returned by a [`LedgerClient`](super::LedgerClient).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The request never produced a response: connect failure, timeout,
    /// unreadable body.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The indexer answered with an error.
    #[error("ledger API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The indexer answered, but a record could not be decoded.
    #[error("ledger decode error: {0}")]
    Decode(#[from] RecordError),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
