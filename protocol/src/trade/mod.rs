//! # Trade Flow
//!
//! The state a swap front-end keeps around a single trade, and the step
//! that links a broadcast wallet envelope back to it.
//!
//! ```text
//! session.rs  -- TradeSession: selected assets, amount, traded quote, outgoing tx
//! submit.rs   -- submit_trade: begin submission -> reconcile -> record / abandon
//! units.rs    -- decimal amount <-> integer base units
//! status.rs   -- TradeResult reported by the trade tracker
//! ```

pub mod session;
pub mod status;
pub mod submit;
pub mod units;

pub use session::{Asset, Quote, SharedSession, SubmissionTicket, TrackKey, TradeSession};
pub use status::{settlement_text, TradeResult};
pub use submit::{submit_trade, SubmitError};
pub use units::{from_base_units, to_base_units, UnitsError};
