//! # Protocol Configuration & Constants
//!
//! Every magic number the reconciler and the codecs rely on lives here, along
//! with the two config structs the binary fills in from flags and
//! environment variables.
//!
//! The retry numbers are not arbitrary: a wallet broadcast usually lands in a
//! block within a few seconds, and thirty one-second polls of the five most
//! recent transactions cover the slow tail without hammering the public
//! endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::reconcile::RetryPolicy;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Crate-level protocol version, printed by `omniswap version`.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// How many of the owner's most recent transactions each attempt inspects.
pub const TRANSACTION_WINDOW: usize = 5;

/// Upper bound on reconciliation attempts before giving up.
pub const MAX_RECONCILE_ATTEMPTS: u32 = 30;

/// Fixed pause between two attempts.
pub const RECONCILE_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Same delay as a plain integer, for CLI defaults.
/// Keep in sync with `RECONCILE_RETRY_DELAY`.
pub const RECONCILE_RETRY_DELAY_MS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Ledger endpoint
// ---------------------------------------------------------------------------

/// Public v2 JSON-RPC endpoint of the ledger indexer.
pub const DEFAULT_LEDGER_ENDPOINT: &str = "https://toncenter.com/api/v2/jsonRPC";

/// Header carrying the optional indexer API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Per-request timeout for ledger queries. A hung request still counts as a
/// failed attempt, so this bounds the total reconciliation time too.
pub const LEDGER_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Maximum number of data bits in a single cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of child references per cell.
pub const MAX_CELL_REFS: usize = 4;

/// Maximum depth of a cell tree.
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Magic prefix of a serialized bag of cells.
pub const BOC_MAGIC: u32 = 0xB5EE_9C72;

// ---------------------------------------------------------------------------
// Trade defaults
// ---------------------------------------------------------------------------

/// Decimals assumed for an asset whose metadata does not say otherwise.
pub const DEFAULT_ASSET_DECIMALS: u32 = 9;

/// Decimals shown when rendering base units back to the user.
pub const DISPLAY_DECIMALS: usize = 2;

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Knobs for the hash reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Number of recent transactions fetched per attempt.
    pub window: usize,
    /// Attempt bound and inter-attempt delay.
    pub retry: RetryPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            window: TRANSACTION_WINDOW,
            retry: RetryPolicy::default(),
        }
    }
}

/// Where and how to reach the ledger indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Optional API key, sent as [`API_KEY_HEADER`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LEDGER_ENDPOINT.to_string(),
            api_key: None,
            request_timeout: LEDGER_REQUEST_TIMEOUT,
        }
    }
}

/// Durations travel as whole milliseconds in config files.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
