//! # Cells
//!
//! The ledger encodes every message and transaction as a tree of cells: up to
//! 1023 bits of data plus up to four references to child cells. A cell's
//! identity is its *representation hash*, a SHA-256 over its descriptors,
//! its data, and its children's depths and hashes. Two cell trees with the
//! same content always have the same hash, which is exactly the property the
//! reconciler leans on.
//!
//! ```text
//! builder.rs  -- CellBuilder: append bits, integers, coins and references
//! slice.rs    -- CellSlice: cursor that reads them back
//! boc.rs      -- bag-of-cells (de)serialization and base64 helpers
//! error.rs    -- CellError / BocError
//! ```
//!
//! Hash and depth are computed once, when the cell is constructed, and
//! cached. Children are shared through `Arc`, so cloning a subtree is cheap.

pub mod boc;
pub mod builder;
pub mod slice;

mod error;

pub use boc::{decode_base64, deserialize, deserialize_single, serialize, serialize_base64};
pub use builder::CellBuilder;
pub use error::{BocError, CellError};
pub use slice::CellSlice;

use std::fmt;
use std::sync::Arc;

use crate::config::{MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};
use crate::crypto::{sha256_multi, ContentHash};

/// Shared handle to a cell; what references point at.
pub type CellRef = Arc<Cell>;

/// An immutable cell with its cached representation hash and depth.
#[derive(Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<CellRef>,
    exotic: bool,
    level_mask: u8,
    depth: u16,
    hash: ContentHash,
}

impl Cell {
    /// Construct a cell from raw parts.
    ///
    /// `data` must hold exactly `ceil(bit_len / 8)` bytes, left-aligned; any
    /// bits past `bit_len` in the final byte are cleared. Locally built cells
    /// are ordinary (`exotic = false`, `level_mask = 0`); the other values
    /// only come from decoded documents.
    pub fn new(
        mut data: Vec<u8>,
        bit_len: usize,
        refs: Vec<CellRef>,
        exotic: bool,
        level_mask: u8,
    ) -> Result<Self, CellError> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::BitOverflow {
                requested: bit_len,
                available: MAX_CELL_BITS,
            });
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(CellError::RefOverflow {
                requested: refs.len(),
                available: MAX_CELL_REFS,
            });
        }
        let expected = bit_len.div_ceil(8);
        if data.len() != expected {
            return Err(CellError::InvalidDataLength {
                bytes: data.len(),
                bits: bit_len,
                expected,
            });
        }
        if bit_len % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xFFu8 << (8 - bit_len % 8);
            }
        }

        let depth = match refs.iter().map(|r| r.depth).max() {
            Some(max_child) => max_child + 1,
            None => 0,
        };
        if depth > MAX_CELL_DEPTH {
            return Err(CellError::DepthExceeded(depth));
        }

        Ok(Self::assemble(data, bit_len, refs, exotic, level_mask & 0x07, depth))
    }

    /// The cell with no data and no references.
    pub fn empty() -> Self {
        Self::assemble(Vec::new(), 0, Vec::new(), false, 0, 0)
    }

    fn assemble(
        data: Vec<u8>,
        bit_len: usize,
        refs: Vec<CellRef>,
        exotic: bool,
        level_mask: u8,
        depth: u16,
    ) -> Self {
        let mut cell = Self {
            data,
            bit_len,
            refs,
            exotic,
            level_mask,
            depth,
            hash: ContentHash::from_bytes([0u8; 32]),
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// Representation hash: the cell's content identity.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Longest path to a leaf, in edges.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Number of data bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Left-aligned data bytes (trailing bits of the last byte are zero).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Child references, in order.
    pub fn references(&self) -> &[CellRef] {
        &self.refs
    }

    /// Whether this cell was decoded with the exotic flag set.
    pub fn is_exotic(&self) -> bool {
        self.exotic
    }

    /// Level mask as carried in the first descriptor byte.
    pub fn level_mask(&self) -> u8 {
        self.level_mask
    }

    /// Start reading this cell from the beginning.
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    /// Whether the cell carries neither data nor references.
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.refs.is_empty()
    }

    /// First descriptor byte: reference count, exotic flag, level mask.
    pub(crate) fn refs_descriptor(&self) -> u8 {
        self.refs.len() as u8 + if self.exotic { 8 } else { 0 } + self.level_mask * 32
    }

    /// Second descriptor byte: `floor(bits / 8) + ceil(bits / 8)`.
    pub(crate) fn bits_descriptor(&self) -> u8 {
        (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8
    }

    /// Data with the completion tag appended when the bit length is not a
    /// whole number of bytes.
    pub(crate) fn augmented_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> rem;
            }
        }
        out
    }

    fn compute_hash(&self) -> ContentHash {
        let descriptors = [self.refs_descriptor(), self.bits_descriptor()];
        let data = self.augmented_data();
        let depths: Vec<[u8; 2]> = self.refs.iter().map(|r| r.depth.to_be_bytes()).collect();

        let mut parts: Vec<&[u8]> = Vec::with_capacity(2 + self.refs.len() * 2);
        parts.push(&descriptors);
        parts.push(&data);
        for depth in &depths {
            parts.push(depth);
        }
        for child in &self.refs {
            parts.push(child.hash.as_bytes());
        }
        ContentHash::from_bytes(sha256_multi(&parts))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.refs.len())
            .field("hash", &self.hash)
            .finish()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cell_known_hash() {
        // SHA-256 of the two zero descriptor bytes.
        assert_eq!(
            Cell::empty().hash().to_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
        assert_eq!(Cell::empty().depth(), 0);
    }

    #[test]
    fn test_descriptors() {
        let child: CellRef = Arc::new(Cell::empty());
        let cell = Cell::new(vec![0xA0], 3, vec![child.clone(), child], false, 0).unwrap();
        assert_eq!(cell.refs_descriptor(), 2);
        // 3 bits: floor = 0, ceil = 1.
        assert_eq!(cell.bits_descriptor(), 1);
        assert_eq!(cell.depth(), 1);
    }

    #[test]
    fn test_augmented_data_completion_tag() {
        // 101 followed by the completion bit -> 1011_0000.
        let cell = Cell::new(vec![0xA0], 3, Vec::new(), false, 0).unwrap();
        assert_eq!(cell.augmented_data(), vec![0xB0]);

        let aligned = Cell::new(vec![0xFF], 8, Vec::new(), false, 0).unwrap();
        assert_eq!(aligned.augmented_data(), vec![0xFF]);
    }

    #[test]
    fn test_trailing_bits_are_cleared() {
        let dirty = Cell::new(vec![0xBF], 3, Vec::new(), false, 0).unwrap();
        let clean = Cell::new(vec![0xA0], 3, Vec::new(), false, 0).unwrap();
        assert_eq!(dirty.data(), clean.data());
        assert_eq!(dirty.hash(), clean.hash());
    }

    #[test]
    fn test_limits_are_enforced() {
        assert!(matches!(
            Cell::new(vec![0u8; 128], 1024, Vec::new(), false, 0),
            Err(CellError::BitOverflow { .. })
        ));
        let child: CellRef = Arc::new(Cell::empty());
        assert!(matches!(
            Cell::new(Vec::new(), 0, vec![child; 5], false, 0),
            Err(CellError::RefOverflow { .. })
        ));
        assert!(matches!(
            Cell::new(vec![0u8; 2], 8, Vec::new(), false, 0),
            Err(CellError::InvalidDataLength { .. })
        ));
    }

    #[test]
    fn test_hash_depends_on_children() {
        let leaf_a: CellRef = Arc::new(Cell::new(vec![0x01], 8, Vec::new(), false, 0).unwrap());
        let leaf_b: CellRef = Arc::new(Cell::new(vec![0x02], 8, Vec::new(), false, 0).unwrap());
        let parent_a = Cell::new(Vec::new(), 0, vec![leaf_a], false, 0).unwrap();
        let parent_b = Cell::new(Vec::new(), 0, vec![leaf_b], false, 0).unwrap();
        assert_ne!(parent_a.hash(), parent_b.hash());
    }
}
