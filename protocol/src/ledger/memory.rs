//! In-memory ledger.
//!
//! Serves a fixed history, optionally preceded by scripted per-query
//! responses (errors, empty pages, a history that changes between attempts).
//! Counts queries so callers can assert how often the ledger was hit.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::record::TRANSACTION_TAG;
use super::{LedgerClient, LedgerError, RecordError, TransactionRecord};
use crate::address::Address;
use crate::cell::{Cell, CellBuilder, CellError, CellRef};

/// Scripted [`LedgerClient`].
#[derive(Default)]
pub struct MemoryLedger {
    history: Mutex<Vec<TransactionRecord>>,
    scripted: Mutex<VecDeque<Result<Vec<TransactionRecord>, LedgerError>>>,
    queries: AtomicUsize,
    last_query: Mutex<Option<(Address, usize)>>,
}

impl MemoryLedger {
    /// A ledger that always answers with `history` (newest first).
    pub fn new(history: Vec<TransactionRecord>) -> Self {
        Self {
            history: Mutex::new(history),
            ..Default::default()
        }
    }

    /// Queue a response for the next unscripted query. Queued responses are
    /// served in order before falling back to the history.
    pub fn push_response(&self, response: Result<Vec<TransactionRecord>, LedgerError>) {
        self.scripted.lock().push_back(response);
    }

    pub fn set_history(&self, history: Vec<TransactionRecord>) {
        *self.history.lock() = history;
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Address and limit of the most recent query.
    pub fn last_query(&self) -> Option<(Address, usize)> {
        *self.last_query.lock()
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some((*address, limit));

        let page = match self.scripted.lock().pop_front() {
            Some(response) => response?,
            None => self.history.lock().clone(),
        };
        Ok(page.into_iter().take(limit).collect())
    }
}

/// Build an ordinary transaction cell for `account` with the given
/// inbound message. Fees, state update and description are left empty.
pub fn transaction_cell(
    account: &Address,
    lt: u64,
    now: u32,
    in_message: Option<CellRef>,
) -> Result<Cell, CellError> {
    let mut messages = CellBuilder::new();
    messages.store_maybe_ref(in_message)?.store_bit(false)?;
    let messages = messages.build()?;

    let mut b = CellBuilder::new();
    b.store_uint(TRANSACTION_TAG, 4)?
        .store_bytes(&account.hash)?
        .store_uint(lt, 64)?
        .store_bytes(&[0; 32])?
        .store_uint(lt.saturating_sub(1), 64)?
        .store_uint(now as u64, 32)?
        .store_uint(0, 15)?
        .store_uint(0b10, 2)?
        .store_uint(0b10, 2)?
        .store_ref(Arc::new(messages))?;
    b.build()
}

/// A decoded record around [`transaction_cell`].
pub fn synthetic_record(
    account: &Address,
    lt: u64,
    in_message: Option<Cell>,
) -> Result<TransactionRecord, RecordError> {
    let root = Arc::new(transaction_cell(
        account,
        lt,
        1_700_000_000,
        in_message.map(Arc::new),
    )?);
    TransactionRecord::from_cell(account.workchain, &root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Address {
        Address::new(0, [7; 32])
    }

    #[tokio::test]
    async fn test_serves_history_up_to_limit() {
        let history = (0..8)
            .map(|i| synthetic_record(&account(), 100 - i, None).unwrap())
            .collect();
        let ledger = MemoryLedger::new(history);

        let page = ledger.get_transactions(&account(), 5).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].lt, 100);
        assert_eq!(ledger.query_count(), 1);
        assert_eq!(ledger.last_query(), Some((account(), 5)));
    }

    #[tokio::test]
    async fn test_scripted_responses_come_first() {
        let ledger = MemoryLedger::new(vec![synthetic_record(&account(), 1, None).unwrap()]);
        ledger.push_response(Err(LedgerError::Transport("connection reset".into())));
        ledger.push_response(Ok(vec![]));

        assert!(ledger.get_transactions(&account(), 5).await.is_err());
        assert!(ledger.get_transactions(&account(), 5).await.unwrap().is_empty());
        assert_eq!(ledger.get_transactions(&account(), 5).await.unwrap().len(), 1);
        assert_eq!(ledger.query_count(), 3);
    }

    #[test]
    fn test_synthetic_record_hash_is_root_hash() {
        let cell = transaction_cell(&account(), 9, 1_700_000_000, None).unwrap();
        let record = synthetic_record(&account(), 9, None).unwrap();
        assert_eq!(record.hash, cell.hash());
        assert_eq!(record.account, account());
    }
}
