//! # Hash Reconciliation
//!
//! A wallet broadcasts a signed envelope but the ledger never tells the
//! sender which transaction it became. The reconciler closes that gap: it
//! hashes the envelope, then polls the owner's most recent transactions
//! until one of them carries an external inbound message whose canonical
//! re-encoding has the same hash.
//!
//! ```text
//! envelope (base64 BoC) ──► root hash ─┐
//!                                      ├─ equal? ──► transaction id
//! getTransactions(owner, 5) ──► in_msg ─► Message::to_cell() ──► hash
//! ```
//!
//! The loop is bounded: [`RetryPolicy`] caps the number of attempts and
//! fixes the pause between them (30 × 1 s by default). Input problems
//! fail immediately; ledger failures count as an unsuccessful attempt and
//! the last one is reported if the search gives up.

mod error;
mod reconciler;
mod retry;

pub use error::ReconcileError;
pub use reconciler::{find_match, HashReconciler, ReconcileRequest};
pub use retry::RetryPolicy;
