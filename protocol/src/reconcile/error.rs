use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors produced while matching an envelope to a ledger transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A caller-supplied input is missing or malformed. Never retried; no
    /// ledger query is made.
    #[error("invalid {argument}: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// One attempt finished without a match. Drives the retry loop and is
    /// never returned by [`HashReconciler::reconcile`](super::HashReconciler::reconcile).
    #[error("no matching transaction yet")]
    NotFoundYet,

    /// Every attempt finished without a match.
    #[error("no matching transaction after {attempts} attempts{}", last_cause(.last_error))]
    NotFound {
        attempts: u32,
        /// Most recent ledger failure seen along the way, if any.
        last_error: Option<LedgerError>,
    },

    /// The ledger query of a single attempt failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReconcileError {
    pub(crate) fn invalid(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }
}

fn last_cause(last_error: &Option<LedgerError>) -> String {
    match last_error {
        Some(err) => format!(" (last ledger error: {err})"),
        None => String::new(),
    }
}
