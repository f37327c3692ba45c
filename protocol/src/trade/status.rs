//! Settlement results reported by the trade tracker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a settled trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeResult {
    #[serde(rename = "TRADE_RESULT_FULLY_FILLED")]
    FullyFilled,
    #[serde(rename = "TRADE_RESULT_PARTIALLY_FILLED")]
    PartiallyFilled,
    #[serde(rename = "TRADE_RESULT_ABORTED")]
    Aborted,
    #[serde(rename = "TRADE_RESULT_UNKNOWN", other)]
    Unknown,
}

impl TradeResult {
    /// Message shown to the trader.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FullyFilled => "Trade completed successfully and fully filled",
            Self::PartiallyFilled => "Trade partially filled - something went wrong",
            Self::Aborted => "Trade was aborted",
            Self::Unknown => "Unknown trade result",
        }
    }

    /// Parse a tracker result string. Unrecognized values map to
    /// [`TradeResult::Unknown`].
    pub fn from_tracker(value: &str) -> Self {
        match value {
            "TRADE_RESULT_FULLY_FILLED" => Self::FullyFilled,
            "TRADE_RESULT_PARTIALLY_FILLED" => Self::PartiallyFilled,
            "TRADE_RESULT_ABORTED" => Self::Aborted,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Text for a possibly unsettled trade: empty until a result exists.
pub fn settlement_text(result: Option<TradeResult>) -> &'static str {
    result.map(|r| r.description()).unwrap_or("")
}
