//! # Account Addresses
//!
//! Accounts are identified by a workchain id and a 256-bit hash. Humans see
//! them in one of two string forms:
//!
//! ```text
//! raw       0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8
//! friendly  EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N
//! ```
//!
//! The friendly form is 36 bytes in base64: a flag byte (bounceable or not,
//! plus a test-only bit), the workchain as a signed byte, the hash, and a
//! CRC16/XMODEM of the preceding 34 bytes. Wallets hand out the friendly form;
//! the indexer accepts either.
//!
//! This module also owns the cell encodings of addresses (`MsgAddressInt`
//! and `MsgAddressExt`), since messages carry them.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::cell::{CellBuilder, CellError, CellSlice};
use crate::crypto::crc16_xmodem;

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TEST_ONLY: u8 = 0x80;
const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

/// Errors from parsing or decoding an address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("unrecognized address format: {0}")]
    InvalidFormat(String),

    #[error("invalid workchain: {0}")]
    InvalidWorkchain(String),

    #[error("invalid account hash: {0}")]
    InvalidHash(String),

    #[error("invalid base64 in friendly address")]
    InvalidBase64,

    #[error("unknown friendly address flag 0x{0:02x}")]
    InvalidFlag(u8),

    #[error("checksum mismatch in friendly address")]
    ChecksumMismatch,

    #[error("unsupported address encoding: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Cell(#[from] CellError),
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A standard internal account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Workchain id: 0 for the basechain, -1 for the masterchain.
    pub workchain: i8,
    /// Account id within the workchain.
    pub hash: [u8; 32],
}

/// A friendly address together with the flags it was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub address: Address,
    pub bounceable: bool,
    pub test_only: bool,
}

impl Address {
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either string form. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.contains(':') {
            return Self::parse_raw(s);
        }
        Self::parse_friendly(s).map(|f| f.address)
    }

    /// Parse the raw `<workchain>:<64 hex chars>` form.
    pub fn parse_raw(s: &str) -> Result<Self, AddressError> {
        let (wc, hash) = s
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
        let workchain = wc
            .parse::<i8>()
            .map_err(|_| AddressError::InvalidWorkchain(wc.to_string()))?;
        let bytes = hex::decode(hash).map_err(|e| AddressError::InvalidHash(e.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AddressError::InvalidHash(format!("{} bytes", b.len())))?;
        Ok(Self { workchain, hash })
    }

    /// Parse the 48-character base64 form (standard or URL-safe alphabet).
    pub fn parse_friendly(s: &str) -> Result<FriendlyAddress, AddressError> {
        if s.len() != FRIENDLY_LEN {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }
        let bytes = URL_SAFE
            .decode(s)
            .or_else(|_| STANDARD.decode(s))
            .map_err(|_| AddressError::InvalidBase64)?;
        if bytes.len() != FRIENDLY_BYTES {
            return Err(AddressError::InvalidFormat(s.to_string()));
        }

        let checksum = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc16_xmodem(&bytes[..34]) != checksum {
            return Err(AddressError::ChecksumMismatch);
        }

        let test_only = bytes[0] & FLAG_TEST_ONLY != 0;
        let bounceable = match bytes[0] & !FLAG_TEST_ONLY {
            FLAG_BOUNCEABLE => true,
            FLAG_NON_BOUNCEABLE => false,
            other => return Err(AddressError::InvalidFlag(other)),
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(FriendlyAddress {
            address: Self {
                workchain: bytes[1] as i8,
                hash,
            },
            bounceable,
            test_only,
        })
    }

    /// Raw form, lower-case hex.
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// Friendly form with the given flags, URL-safe alphabet.
    pub fn to_friendly(&self, bounceable: bool, test_only: bool) -> String {
        let mut bytes = Vec::with_capacity(FRIENDLY_BYTES);
        let mut flag = if bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if test_only {
            flag |= FLAG_TEST_ONLY;
        }
        bytes.push(flag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let checksum = crc16_xmodem(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());
        URL_SAFE.encode(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(true, false))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_raw_string())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// External addresses
// ---------------------------------------------------------------------------

/// `addr_extern$01 len:(## 9) external_address:(bits len)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalAddress {
    /// Left-aligned address bits.
    pub bits: Vec<u8>,
    /// Number of meaningful bits (at most 511).
    pub bit_len: usize,
}

// ---------------------------------------------------------------------------
// Cell codecs
// ---------------------------------------------------------------------------

/// Store `addr_std$10 anycast:nothing workchain:int8 address:bits256`.
pub fn store_address(builder: &mut CellBuilder, address: &Address) -> Result<(), AddressError> {
    builder
        .store_uint(0b10, 2)?
        .store_bit(false)?
        .store_int(address.workchain as i64, 8)?
        .store_bytes(&address.hash)?;
    Ok(())
}

/// Load a `MsgAddressInt`, accepting only `addr_std` without anycast.
pub fn load_address(slice: &mut CellSlice<'_>) -> Result<Address, AddressError> {
    match slice.load_uint(2)? {
        0b10 => {}
        0b11 => return Err(AddressError::Unsupported("addr_var")),
        0b00 => return Err(AddressError::Unsupported("addr_none where an address is required")),
        _ => return Err(AddressError::Unsupported("addr_extern where an internal address is required")),
    }
    if slice.load_bit()? {
        return Err(AddressError::Unsupported("anycast"));
    }
    let workchain = slice.load_int(8)? as i8;
    let hash = slice.load_array::<32>()?;
    Ok(Address { workchain, hash })
}

/// Store an optional internal address, `addr_none$00` when absent.
pub fn store_maybe_address(
    builder: &mut CellBuilder,
    address: Option<&Address>,
) -> Result<(), AddressError> {
    match address {
        Some(address) => store_address(builder, address),
        None => {
            builder.store_uint(0b00, 2)?;
            Ok(())
        }
    }
}

/// Load an internal address that may be `addr_none`.
pub fn load_maybe_address(slice: &mut CellSlice<'_>) -> Result<Option<Address>, AddressError> {
    let mut lookahead = slice.clone();
    if lookahead.load_uint(2)? == 0b00 {
        *slice = lookahead;
        return Ok(None);
    }
    load_address(slice).map(Some)
}

/// Store a `MsgAddressExt` (`addr_none$00` or `addr_extern$01`).
pub fn store_external_address(
    builder: &mut CellBuilder,
    address: Option<&ExternalAddress>,
) -> Result<(), AddressError> {
    match address {
        None => {
            builder.store_uint(0b00, 2)?;
        }
        Some(ext) => {
            builder
                .store_uint(0b01, 2)?
                .store_uint(ext.bit_len as u64, 9)?
                .store_bits(&ext.bits, ext.bit_len)?;
        }
    }
    Ok(())
}

/// Load a `MsgAddressExt`.
pub fn load_external_address(
    slice: &mut CellSlice<'_>,
) -> Result<Option<ExternalAddress>, AddressError> {
    match slice.load_uint(2)? {
        0b00 => Ok(None),
        0b01 => {
            let bit_len = slice.load_uint(9)? as usize;
            let bits = slice.load_bits(bit_len)?;
            Ok(Some(ExternalAddress { bits, bit_len }))
        }
        _ => Err(AddressError::Unsupported("internal address where MsgAddressExt is required")),
    }
}
