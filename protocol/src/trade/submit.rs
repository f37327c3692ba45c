//! Turning a broadcast envelope into a recorded trade.

use thiserror::Error;
use tracing::{info, warn};

use super::session::{Quote, SharedSession};
use crate::ledger::{LedgerClient, TransactionId};
use crate::reconcile::{HashReconciler, ReconcileError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The envelope could not be matched to a ledger transaction. The
    /// traded quote has been cleared.
    #[error("trade not confirmed: {0}")]
    Unconfirmed(#[source] ReconcileError),

    /// The trade was found, but the session inputs changed while it was
    /// being searched for. The session was left as is.
    #[error("trade {tx} confirmed after the session changed; result discarded")]
    Superseded { tx: TransactionId },
}

/// Record `quote` as traded, find the transaction the broadcast `envelope`
/// produced for `owner`, and store it in the session.
///
/// The session lock is only taken for the bookkeeping steps, never across
/// the reconciliation itself.
pub async fn submit_trade<L: LedgerClient>(
    session: &SharedSession,
    reconciler: &HashReconciler<L>,
    quote: Quote,
    envelope: &str,
    owner: &str,
) -> Result<TransactionId, SubmitError> {
    let quote_id = quote.quote_id.clone();
    let ticket = session.write().begin_submission(quote);

    match reconciler.reconcile(envelope, owner).await {
        Ok(tx) => {
            if session.write().record_outgoing(ticket, tx) {
                info!(quote_id = %quote_id, tx = %tx, "trade confirmed");
                Ok(tx)
            } else {
                warn!(quote_id = %quote_id, tx = %tx, "trade confirmed for a superseded session");
                Err(SubmitError::Superseded { tx })
            }
        }
        Err(e) => {
            session.write().abandon_submission(ticket);
            warn!(quote_id = %quote_id, error = %e, "trade not confirmed");
            Err(SubmitError::Unconfirmed(e))
        }
    }
}
