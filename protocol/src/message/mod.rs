//! # Messages
//!
//! Decoding and canonical re-encoding of ledger messages.
//!
//! ```text
//! message$_ {X:Type} info:CommonMsgInfo
//!   init:(Maybe (Either StateInit ^StateInit))
//!   body:(Either X ^X) = Message X;
//! ```
//!
//! A message may be laid out several ways: the state init and the body can
//! each live inline or behind a reference. The layout changes the root
//! cell, and so the hash. [`Message::to_cell`] always picks the same layout
//! for the same logical message, using the placement rule wallets use when
//! they build the envelope in the first place. Decoding a transaction's
//! inbound message and re-encoding it therefore yields the hash of the
//! envelope the user signed.

mod error;
mod info;
mod state_init;

pub use error::MessageError;
pub use info::{
    CommonMsgInfo, CurrencyCollection, ExternalInMessageInfo, ExternalOutMessageInfo,
    InternalMessageInfo, MessageKind,
};
pub use state_init::{StateInit, TickTock};

use std::sync::Arc;

use crate::address::Address;
use crate::cell::{Cell, CellBuilder, CellRef, CellSlice};
use crate::config::MAX_CELL_REFS;
use crate::crypto::ContentHash;

/// A decoded message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub info: CommonMsgInfo,
    pub init: Option<StateInit>,
    /// `None` when the message carries an empty inline body.
    pub body: Option<CellRef>,
}

impl Message {
    /// Build an external-in message to `dest` with the given body.
    pub fn external_in(dest: Address, body: Cell) -> Self {
        Self {
            info: CommonMsgInfo::ExternalIn(ExternalInMessageInfo {
                src: None,
                dest,
                import_fee: 0,
            }),
            init: None,
            body: Some(Arc::new(body)),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.info.kind()
    }

    pub fn is_external_in(&self) -> bool {
        self.kind() == MessageKind::ExternalIn
    }

    /// Whether the message carries a non-empty body.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|body| !body.is_empty())
    }

    /// Decode a message rooted at `cell`.
    pub fn from_cell(cell: &Cell) -> Result<Self, MessageError> {
        let mut slice = cell.parse();
        Self::load(&mut slice)
    }

    /// Decode a message from the current slice position. Consumes the
    /// remainder of the slice when the body is inline.
    pub fn load(slice: &mut CellSlice<'_>) -> Result<Self, MessageError> {
        let info = CommonMsgInfo::load(slice)?;

        let init = if slice.load_bit()? {
            if slice.load_bit()? {
                let init_cell = slice.load_ref()?;
                let mut init_slice = init_cell.parse();
                Some(StateInit::load(&mut init_slice)?)
            } else {
                Some(StateInit::load(slice)?)
            }
        } else {
            None
        };

        let body = if slice.load_bit()? {
            Some(slice.load_ref()?)
        } else {
            let rest = slice.to_cell()?;
            let remaining = slice.remaining_bits();
            slice.skip_bits(remaining)?;
            while slice.remaining_refs() > 0 {
                slice.load_ref()?;
            }
            if rest.is_empty() {
                None
            } else {
                Some(Arc::new(rest))
            }
        };

        Ok(Self { info, init, body })
    }

    /// Encode into the canonical root cell.
    pub fn to_cell(&self) -> Result<Cell, MessageError> {
        let mut b = CellBuilder::new();
        self.info.store(&mut b)?;

        let (body_bits, body_refs) = self
            .body
            .as_ref()
            .map(|body| (body.bit_len(), body.references().len()))
            .unwrap_or((0, 0));

        match &self.init {
            Some(init) => {
                // Placement is decided on bits alone, before the presence
                // bit, reserving the two Either tags. Refs are not checked.
                let init_builder = init.to_builder()?;
                let inline =
                    b.available_bits().saturating_sub(2) >= init_builder.bit_len() + body_bits;
                b.store_bit(true)?;
                if inline {
                    b.store_bit(false)?.store_builder(&init_builder)?;
                } else {
                    let init_cell = init_builder.build()?;
                    b.store_bit(true)?.store_ref(Arc::new(init_cell))?;
                }
            }
            None => {
                b.store_bit(false)?;
            }
        }

        match &self.body {
            Some(body) => {
                let inline = b.available_bits() > body_bits
                    && b.refs_len() + body_refs <= MAX_CELL_REFS;
                if inline {
                    b.store_bit(false)?.store_cell_contents(body)?;
                } else {
                    if b.available_refs() == 0 {
                        return Err(MessageError::DoesNotFit { what: "body reference" });
                    }
                    b.store_bit(true)?.store_ref(body.clone())?;
                }
            }
            None => {
                b.store_bit(false)?;
            }
        }

        Ok(b.build()?)
    }

    /// Representation hash of the canonical encoding.
    pub fn hash(&self) -> Result<ContentHash, MessageError> {
        Ok(self.to_cell()?.hash())
    }
}
