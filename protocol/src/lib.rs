// Copyright (c) 2026 Omniswap Contributors. MIT License.
// See LICENSE for details.

//! # Omniswap Protocol: Core Library
//!
//! A swap front-end hands the trader's wallet a set of messages, the wallet
//! signs them into an external envelope and broadcasts it, and then the
//! ledger goes quiet: nobody tells the front-end which transaction the
//! envelope turned into. Yet that transaction id is exactly what the trade
//! tracker needs. This crate recovers it.
//!
//! ## Architecture
//!
//! - **cell**: Cells, representation hashes and the bag-of-cells codec.
//! - **address**: Account addresses in raw, user-friendly and cell form.
//! - **message**: Message decoding and canonical re-encoding.
//! - **ledger**: Transaction records and the indexer client.
//! - **reconcile**: The hash reconciler: envelope hash in, transaction id out.
//! - **trade**: Trade session state, submission, units and results.
//! - **crypto**: SHA-256 content hashes and the two checksums the formats use.
//! - **config**: Protocol constants and config structs.
//!
//! ## Design Philosophy
//!
//! 1. Hashes are computed, never trusted: the indexer's own transaction hash
//!    is cross-checked against the decoded cell.
//! 2. Retry loops are bounded and their pacing is explicit.
//! 3. State belongs to the caller. The library keeps no globals.

pub mod address;
pub mod cell;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod message;
pub mod reconcile;
pub mod trade;

pub use address::Address;
pub use cell::{Cell, CellBuilder, CellRef};
pub use crypto::ContentHash;
pub use ledger::{LedgerClient, MemoryLedger, ToncenterClient, TransactionId, TransactionRecord};
pub use message::Message;
pub use reconcile::{HashReconciler, ReconcileError, RetryPolicy};
pub use trade::{submit_trade, SubmitError, TradeSession};
