//! Transaction records as returned by the indexer.
//!
//! ```text
//! transaction$0111 account_addr:bits256 lt:uint64
//!   prev_trans_hash:bits256 prev_trans_lt:uint64 now:uint32
//!   outmsg_cnt:uint15 orig_status:AccountStatus end_status:AccountStatus
//!   ^[ in_msg:(Maybe ^(Message Any)) out_msgs:(HashmapE 15 ^(Message Any)) ]
//!   total_fees:CurrencyCollection state_update:^(HASH_UPDATE Account)
//!   description:^TransactionDescr = Transaction;
//! ```
//!
//! Only the header and the message reference are decoded. Fees, state
//! update and description are not needed to identify a transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordError, TransactionId};
use crate::address::Address;
use crate::cell::{decode_base64, CellRef};
use crate::crypto::ContentHash;
use crate::message::{Message, MessageError};

pub(crate) const TRANSACTION_TAG: u64 = 0b0111;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Uninit,
    Frozen,
    Active,
    NonExist,
}

impl AccountStatus {
    fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0b00 => Self::Uninit,
            0b01 => Self::Frozen,
            0b10 => Self::Active,
            _ => Self::NonExist,
        }
    }
}

/// One transaction of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Representation hash of the transaction root cell.
    pub hash: TransactionId,
    pub account: Address,
    pub lt: u64,
    pub prev_hash: ContentHash,
    pub prev_lt: u64,
    /// Unix time the transaction was included.
    pub now: u32,
    pub outgoing_count: u16,
    pub orig_status: AccountStatus,
    pub end_status: AccountStatus,
    /// Raw inbound message, if the transaction had one.
    pub in_message_cell: Option<CellRef>,
    /// Root of the out-message dictionary, left undecoded.
    pub outgoing_messages: Option<CellRef>,
}

impl TransactionRecord {
    /// Decode a transaction rooted at `root`. The cell only stores the
    /// account hash, so the workchain comes from the caller.
    pub fn from_cell(workchain: i8, root: &CellRef) -> Result<Self, RecordError> {
        let mut slice = root.parse();

        let tag = slice.load_uint(4)?;
        if tag != TRANSACTION_TAG {
            return Err(RecordError::InvalidTag(tag));
        }

        let account = Address::new(workchain, slice.load_array::<32>()?);
        let lt = slice.load_uint(64)?;
        let prev_hash = ContentHash::from_bytes(slice.load_array::<32>()?);
        let prev_lt = slice.load_uint(64)?;
        let now = slice.load_uint(32)? as u32;
        let outgoing_count = slice.load_uint(15)? as u16;
        let orig_status = AccountStatus::from_bits(slice.load_uint(2)?);
        let end_status = AccountStatus::from_bits(slice.load_uint(2)?);

        let messages = slice.load_ref()?;
        let mut messages = messages.parse();
        let in_message_cell = messages.load_maybe_ref()?;
        let outgoing_messages = messages.load_maybe_ref()?;

        Ok(Self {
            hash: root.hash(),
            account,
            lt,
            prev_hash,
            prev_lt,
            now,
            outgoing_count,
            orig_status,
            end_status,
            in_message_cell,
            outgoing_messages,
        })
    }

    /// Decode a base64 transaction document.
    pub fn from_boc(workchain: i8, data: &str) -> Result<Self, RecordError> {
        let root = decode_base64(data)?;
        Self::from_cell(workchain, &root)
    }

    /// Decode the inbound message, if any.
    pub fn in_message(&self) -> Result<Option<Message>, MessageError> {
        self.in_message_cell
            .as_ref()
            .map(|cell| Message::from_cell(cell))
            .transpose()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.now as i64, 0)
    }
}
