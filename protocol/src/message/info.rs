//! Message headers (`CommonMsgInfo`).
//!
//! ```text
//! int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
//!   src:MsgAddressInt dest:MsgAddressInt value:CurrencyCollection
//!   ihr_fee:Grams fwd_fee:Grams created_lt:uint64 created_at:uint32
//! ext_in_msg_info$10 src:MsgAddressExt dest:MsgAddressInt import_fee:Grams
//! ext_out_msg_info$11 src:MsgAddressInt dest:MsgAddressExt
//!   created_lt:uint64 created_at:uint32
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::MessageError;
use crate::address::{
    load_address, load_external_address, load_maybe_address, store_address,
    store_external_address, store_maybe_address, Address, ExternalAddress,
};
use crate::cell::{CellBuilder, CellRef, CellSlice};

/// Which of the three message shapes a header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Account-to-account message carrying value.
    Internal,
    /// Message injected from outside the chain, e.g. a signed wallet request.
    ExternalIn,
    /// Log-style message emitted by a contract to the outside world.
    ExternalOut,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::ExternalIn => write!(f, "external-in"),
            Self::ExternalOut => write!(f, "external-out"),
        }
    }
}

/// Coins plus an optional extra-currency dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrencyCollection {
    /// Native coin amount in nano units.
    pub coins: u128,
    /// Root of the extra-currency dictionary, if any.
    pub other: Option<CellRef>,
}

impl CurrencyCollection {
    pub fn new(coins: u128) -> Self {
        Self { coins, other: None }
    }

    fn store(&self, builder: &mut CellBuilder) -> Result<(), MessageError> {
        builder.store_coins(self.coins)?;
        builder.store_maybe_ref(self.other.clone())?;
        Ok(())
    }

    fn load(slice: &mut CellSlice<'_>) -> Result<Self, MessageError> {
        Ok(Self {
            coins: slice.load_coins()?,
            other: slice.load_maybe_ref()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalMessageInfo {
    pub ihr_disabled: bool,
    pub bounce: bool,
    pub bounced: bool,
    pub src: Option<Address>,
    pub dest: Address,
    pub value: CurrencyCollection,
    pub ihr_fee: u128,
    pub fwd_fee: u128,
    pub created_lt: u64,
    pub created_at: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalInMessageInfo {
    pub src: Option<ExternalAddress>,
    pub dest: Address,
    pub import_fee: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalOutMessageInfo {
    pub src: Address,
    pub dest: Option<ExternalAddress>,
    pub created_lt: u64,
    pub created_at: u32,
}

/// Message header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommonMsgInfo {
    Internal(InternalMessageInfo),
    ExternalIn(ExternalInMessageInfo),
    ExternalOut(ExternalOutMessageInfo),
}

impl CommonMsgInfo {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Internal(_) => MessageKind::Internal,
            Self::ExternalIn(_) => MessageKind::ExternalIn,
            Self::ExternalOut(_) => MessageKind::ExternalOut,
        }
    }

    /// Destination account, when the destination is internal.
    pub fn destination(&self) -> Option<&Address> {
        match self {
            Self::Internal(info) => Some(&info.dest),
            Self::ExternalIn(info) => Some(&info.dest),
            Self::ExternalOut(_) => None,
        }
    }

    pub(crate) fn store(&self, builder: &mut CellBuilder) -> Result<(), MessageError> {
        match self {
            Self::Internal(info) => {
                builder
                    .store_bit(false)?
                    .store_bit(info.ihr_disabled)?
                    .store_bit(info.bounce)?
                    .store_bit(info.bounced)?;
                store_maybe_address(builder, info.src.as_ref())?;
                store_address(builder, &info.dest)?;
                info.value.store(builder)?;
                builder
                    .store_coins(info.ihr_fee)?
                    .store_coins(info.fwd_fee)?
                    .store_uint(info.created_lt, 64)?
                    .store_uint(info.created_at as u64, 32)?;
            }
            Self::ExternalIn(info) => {
                builder.store_uint(0b10, 2)?;
                store_external_address(builder, info.src.as_ref())?;
                store_address(builder, &info.dest)?;
                builder.store_coins(info.import_fee)?;
            }
            Self::ExternalOut(info) => {
                builder.store_uint(0b11, 2)?;
                store_address(builder, &info.src)?;
                store_external_address(builder, info.dest.as_ref())?;
                builder
                    .store_uint(info.created_lt, 64)?
                    .store_uint(info.created_at as u64, 32)?;
            }
        }
        Ok(())
    }

    pub(crate) fn load(slice: &mut CellSlice<'_>) -> Result<Self, MessageError> {
        if !slice.load_bit()? {
            let ihr_disabled = slice.load_bit()?;
            let bounce = slice.load_bit()?;
            let bounced = slice.load_bit()?;
            let src = load_maybe_address(slice)?;
            let dest = load_address(slice)?;
            let value = CurrencyCollection::load(slice)?;
            let ihr_fee = slice.load_coins()?;
            let fwd_fee = slice.load_coins()?;
            let created_lt = slice.load_uint(64)?;
            let created_at = slice.load_uint(32)? as u32;
            return Ok(Self::Internal(InternalMessageInfo {
                ihr_disabled,
                bounce,
                bounced,
                src,
                dest,
                value,
                ihr_fee,
                fwd_fee,
                created_lt,
                created_at,
            }));
        }

        if !slice.load_bit()? {
            let src = load_external_address(slice)?;
            let dest = load_address(slice)?;
            let import_fee = slice.load_coins()?;
            return Ok(Self::ExternalIn(ExternalInMessageInfo {
                src,
                dest,
                import_fee,
            }));
        }

        let src = load_address(slice)?;
        let dest = load_external_address(slice)?;
        let created_lt = slice.load_uint(64)?;
        let created_at = slice.load_uint(32)? as u32;
        Ok(Self::ExternalOut(ExternalOutMessageInfo {
            src,
            dest,
            created_lt,
            created_at,
        }))
    }
}
