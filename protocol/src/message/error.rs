use thiserror::Error;

use crate::address::AddressError;
use crate::cell::CellError;

/// Errors from decoding or re-encoding a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("message cell: {0}")]
    Cell(#[from] CellError),

    #[error("message address: {0}")]
    Address(#[from] AddressError),

    #[error("{what} does not fit into the message cell")]
    DoesNotFit {
        /// Which part overflowed.
        what: &'static str,
    },
}
