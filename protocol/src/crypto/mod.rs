//! # Hashing & Checksums
//!
//! Everything the reconciler compares ends up as a SHA-256 digest of a cell
//! tree, and everything it parses off the wire carries a CRC. Both live here.
//!
//! None of this is novel. SHA-256 comes from `sha2`; the CRCs are the
//! textbook bitwise loops with their standard check values pinned in tests.

pub mod checksum;
pub mod hash;

pub use checksum::{crc16_xmodem, crc32c};
pub use hash::{sha256_array, sha256_multi, ContentHash, HashParseError, HASH_LENGTH};
