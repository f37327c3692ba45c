//! # Ledger Access
//!
//! The reconciler only needs one question answered: "what are the latest
//! transactions of this account?". [`LedgerClient`] is that question as a
//! trait so the reconciler can be driven by the real indexer
//! ([`ToncenterClient`]) or by an in-memory fake ([`MemoryLedger`]) in
//! tests and dry runs.
//!
//! ```text
//! record.rs     -- TransactionRecord: decoded transaction header + inbound message
//! toncenter.rs  -- JSON-RPC client over reqwest
//! memory.rs     -- scripted in-memory ledger with a query counter
//! error.rs      -- LedgerError / RecordError
//! ```

mod error;
pub mod memory;
pub mod record;
pub mod toncenter;

pub use error::{LedgerError, RecordError};
pub use memory::MemoryLedger;
pub use record::{AccountStatus, TransactionRecord};
pub use toncenter::ToncenterClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::address::Address;
use crate::crypto::ContentHash;

/// A transaction is identified by the hash of its root cell.
pub type TransactionId = ContentHash;

/// Read access to an account's transaction history.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Up to `limit` of the account's most recent transactions, newest
    /// first.
    async fn get_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn get_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        (**self).get_transactions(address, limit).await
    }
}
