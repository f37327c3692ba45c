//! Caller-owned trade session state.
//!
//! The session remembers what the trader picked (assets and amount), the
//! quote being executed, and the transaction that executed it. Any change
//! to the trader's inputs invalidates the last two. A generation counter
//! makes that visible to in-flight submissions, so a reconciliation that
//! finishes after the inputs changed cannot write a stale transaction id
//! back into the session.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::units::{to_base_units, UnitsError};
use crate::address::Address;
use crate::ledger::TransactionId;

/// Session shared between the UI side and submission tasks.
pub type SharedSession = Arc<RwLock<TradeSession>>;

/// A tradable asset as listed by the asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub contract_address: String,
    /// Fractional digits; the default applies when the catalog omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

/// A quote selected for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: String,
    pub resolver_name: String,
    pub bid_units: u128,
    pub ask_units: u128,
}

/// Proof that a submission was started against a particular generation of
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SubmissionTicket {
    generation: u64,
}

/// Everything the trade tracker needs to follow a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackKey {
    pub quote_id: String,
    pub trader: Address,
    pub outgoing_tx: TransactionId,
}

#[derive(Debug, Clone, Default)]
pub struct TradeSession {
    from_asset: Option<Asset>,
    to_asset: Option<Asset>,
    amount: String,
    trader: Option<Address>,
    traded_quote: Option<Quote>,
    outgoing_tx: Option<TransactionId>,
    generation: u64,
}

impl TradeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    // -----------------------------------------------------------------------
    // Trader inputs
    // -----------------------------------------------------------------------

    pub fn set_from_asset(&mut self, asset: Option<Asset>) {
        if self.from_asset != asset {
            self.from_asset = asset;
            self.invalidate("from asset changed");
        }
    }

    pub fn set_to_asset(&mut self, asset: Option<Asset>) {
        if self.to_asset != asset {
            self.to_asset = asset;
            self.invalidate("to asset changed");
        }
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        let amount = amount.into();
        if self.amount != amount {
            self.amount = amount;
            self.invalidate("amount changed");
        }
    }

    /// Connected wallet. Does not invalidate the current trade.
    pub fn set_trader(&mut self, trader: Option<Address>) {
        self.trader = trader;
    }

    pub fn from_asset(&self) -> Option<&Asset> {
        self.from_asset.as_ref()
    }

    pub fn to_asset(&self) -> Option<&Asset> {
        self.to_asset.as_ref()
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn trader(&self) -> Option<&Address> {
        self.trader.as_ref()
    }

    pub fn traded_quote(&self) -> Option<&Quote> {
        self.traded_quote.as_ref()
    }

    pub fn outgoing_tx(&self) -> Option<TransactionId> {
        self.outgoing_tx
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a quote should be requested: both assets chosen, an amount
    /// entered, and no trade already executed in this session.
    pub fn quotes_enabled(&self) -> bool {
        let chosen = |asset: &Option<Asset>| {
            asset
                .as_ref()
                .is_some_and(|a| !a.contract_address.is_empty())
        };
        chosen(&self.from_asset)
            && chosen(&self.to_asset)
            && !self.amount.is_empty()
            && self.outgoing_tx.is_none()
    }

    /// The entered amount in the from asset's base units; zero while no from
    /// asset is selected.
    pub fn bid_units(&self) -> Result<u128, UnitsError> {
        match &self.from_asset {
            Some(asset) => to_base_units(&self.amount, asset.decimals),
            None => Ok(0),
        }
    }

    // -----------------------------------------------------------------------
    // Submission lifecycle
    // -----------------------------------------------------------------------

    /// Mark `quote` as being executed.
    pub fn begin_submission(&mut self, quote: Quote) -> SubmissionTicket {
        debug!(quote_id = %quote.quote_id, generation = self.generation, "submission started");
        self.traded_quote = Some(quote);
        SubmissionTicket {
            generation: self.generation,
        }
    }

    /// Store the transaction a submission produced. Returns `false`, leaving
    /// the session untouched, when the inputs changed since the ticket was
    /// issued.
    pub fn record_outgoing(&mut self, ticket: SubmissionTicket, tx: TransactionId) -> bool {
        if !self.is_current(ticket) {
            debug!(tx = %tx, "ignoring stale submission result");
            return false;
        }
        self.outgoing_tx = Some(tx);
        true
    }

    /// Forget the quote of a failed submission. Stale tickets are ignored.
    pub fn abandon_submission(&mut self, ticket: SubmissionTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.traded_quote = None;
        true
    }

    pub fn is_current(&self, ticket: SubmissionTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Lookup key for the trade tracker, once quote, trader and transaction
    /// are all known.
    pub fn track_key(&self) -> Option<TrackKey> {
        let quote = self.traded_quote.as_ref().filter(|q| !q.quote_id.is_empty())?;
        Some(TrackKey {
            quote_id: quote.quote_id.clone(),
            trader: self.trader?,
            outgoing_tx: self.outgoing_tx?,
        })
    }

    fn invalidate(&mut self, reason: &'static str) {
        self.traded_quote = None;
        self.outgoing_tx = None;
        self.generation += 1;
        debug!(generation = self.generation, reason, "trade session reset");
    }
}
