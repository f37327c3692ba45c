//! Incremental cell construction.
//!
//! Every `store_*` method checks capacity before writing and returns
//! `&mut Self`, so encoders can chain writes with `?` and never end up with a
//! half-written field.

use super::{Cell, CellError, CellRef, CellSlice};
use crate::config::{MAX_CELL_BITS, MAX_CELL_REFS};

/// Largest value a `VarUInteger 16` coins field can carry (15 bytes).
const MAX_COINS_BYTES: usize = 15;

/// Mutable bit/reference accumulator that produces a [`Cell`].
#[derive(Clone, Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<CellRef>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// References attached so far.
    pub fn refs_len(&self) -> usize {
        self.refs.len()
    }

    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.refs.len()
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store the low `bits` bits of `value`, most significant first.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(CellError::ValueTooLarge { bits });
        }
        self.store_u128(value as u128, bits)
    }

    /// Store a two's-complement signed integer in `bits` bits.
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::ValueTooLarge { bits });
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::ValueTooLarge { bits });
            }
        }
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self.store_u128(((value as u64) & mask) as u128, bits)
    }

    /// Store an unsigned value of up to 128 bits.
    pub fn store_u128(&mut self, value: u128, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return Err(CellError::ValueTooLarge { bits });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Store a `VarUInteger 16`: four bits of byte length, then the value.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self, CellError> {
        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if byte_len > MAX_COINS_BYTES {
            return Err(CellError::ValueTooLarge {
                bits: MAX_COINS_BYTES * 8,
            });
        }
        self.ensure_bits(4 + byte_len * 8)?;
        self.store_uint(byte_len as u64, 4)?;
        self.store_u128(amount, byte_len * 8)
    }

    /// Store the first `bit_len` bits of a left-aligned byte buffer.
    pub fn store_bits(&mut self, data: &[u8], bit_len: usize) -> Result<&mut Self, CellError> {
        if bit_len > data.len() * 8 {
            return Err(CellError::DataUnderflow {
                requested: bit_len,
                remaining: data.len() * 8,
            });
        }
        self.ensure_bits(bit_len)?;
        if self.bit_len % 8 == 0 && bit_len % 8 == 0 {
            self.data.extend_from_slice(&data[..bit_len / 8]);
            self.bit_len += bit_len;
            return Ok(self);
        }
        for i in 0..bit_len {
            self.push_bit(data[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, data: &[u8]) -> Result<&mut Self, CellError> {
        self.store_bits(data, data.len() * 8)
    }

    pub fn store_ref(&mut self, cell: CellRef) -> Result<&mut Self, CellError> {
        self.ensure_refs(1)?;
        self.refs.push(cell);
        Ok(self)
    }

    /// `Maybe ^X`: a presence bit, then the reference if present.
    pub fn store_maybe_ref(&mut self, cell: Option<CellRef>) -> Result<&mut Self, CellError> {
        match cell {
            Some(cell) => {
                self.ensure_bits(1)?;
                self.ensure_refs(1)?;
                self.store_bit(true)?.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// Append the unread remainder of a slice, bits and references.
    pub fn store_slice(&mut self, slice: &CellSlice<'_>) -> Result<&mut Self, CellError> {
        let tail = slice.to_builder()?;
        self.store_builder(&tail)
    }

    /// Append another builder's contents.
    pub fn store_builder(&mut self, other: &CellBuilder) -> Result<&mut Self, CellError> {
        self.ensure_bits(other.bit_len)?;
        self.ensure_refs(other.refs.len())?;
        self.store_bits(&other.data, other.bit_len)?;
        self.refs.extend(other.refs.iter().cloned());
        Ok(self)
    }

    /// Append a whole cell's data and references inline.
    pub fn store_cell_contents(&mut self, cell: &Cell) -> Result<&mut Self, CellError> {
        self.store_slice(&cell.parse())
    }

    /// Freeze the current contents into an ordinary cell.
    pub fn build(&self) -> Result<Cell, CellError> {
        Cell::new(self.data.clone(), self.bit_len, self.refs.clone(), false, 0)
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.available_bits() {
            return Err(CellError::BitOverflow {
                requested: bits,
                available: self.available_bits(),
            });
        }
        Ok(())
    }

    fn ensure_refs(&self, refs: usize) -> Result<(), CellError> {
        if refs > self.available_refs() {
            return Err(CellError::RefOverflow {
                requested: refs,
                available: self.available_refs(),
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        let index = self.bit_len / 8;
        if index == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[index] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn stores_bits_msb_first() {
        let mut b = CellBuilder::new();
        b.store_bit(true).unwrap().store_uint(0b01, 2).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 3);
        assert_eq!(cell.data(), &[0b1010_0000]);
    }

    #[test]
    fn uint_range_is_checked() {
        let mut b = CellBuilder::new();
        assert!(b.store_uint(8, 3).is_err());
        assert!(b.store_uint(7, 3).is_ok());
        assert!(b.store_uint(u64::MAX, 64).is_ok());
        assert!(b.store_uint(1, 65).is_err());
    }

    #[test]
    fn negative_ints_are_twos_complement() {
        let mut b = CellBuilder::new();
        b.store_int(-1, 8).unwrap();
        assert_eq!(b.build().unwrap().data(), &[0xFF]);

        let mut b = CellBuilder::new();
        assert!(b.store_int(-129, 8).is_err());
        assert!(b.store_int(128, 8).is_err());
        assert!(b.store_int(-128, 8).is_ok());
    }

    #[test]
    fn coins_encoding() {
        let mut zero = CellBuilder::new();
        zero.store_coins(0).unwrap();
        assert_eq!(zero.bit_len(), 4);

        // 1_000_000_000 needs 4 bytes -> 4 + 32 bits.
        let mut one_ton = CellBuilder::new();
        one_ton.store_coins(1_000_000_000).unwrap();
        assert_eq!(one_ton.bit_len(), 36);
        let cell = one_ton.build().unwrap();
        assert_eq!(cell.data(), &[0x43, 0xB9, 0xAC, 0xA0, 0x00]);

        let mut too_big = CellBuilder::new();
        assert!(too_big.store_coins(u128::MAX).is_err());
    }

    #[test]
    fn capacity_limits() {
        let mut b = CellBuilder::new();
        b.store_bits(&[0u8; 128], 1023).unwrap();
        assert_eq!(b.available_bits(), 0);
        assert!(matches!(
            b.store_bit(false),
            Err(CellError::BitOverflow { .. })
        ));

        let leaf = Arc::new(Cell::empty());
        for _ in 0..4 {
            b.store_ref(leaf.clone()).unwrap();
        }
        assert!(matches!(
            b.store_ref(leaf),
            Err(CellError::RefOverflow { .. })
        ));
    }

    #[test]
    fn unaligned_store_bits() {
        let mut b = CellBuilder::new();
        b.store_bit(true).unwrap();
        b.store_bits(&[0xF0], 4).unwrap();
        let cell = b.build().unwrap();
        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.data(), &[0b1111_1000]);
    }

    #[test]
    fn store_builder_appends_refs() {
        let leaf = Arc::new(Cell::empty());
        let mut inner = CellBuilder::new();
        inner.store_uint(0xAB, 8).unwrap().store_ref(leaf).unwrap();

        let mut outer = CellBuilder::new();
        outer.store_bit(false).unwrap().store_builder(&inner).unwrap();
        let cell = outer.build().unwrap();
        assert_eq!(cell.bit_len(), 9);
        assert_eq!(cell.references().len(), 1);
        assert_eq!(cell.data(), &[0x55, 0x80]);
    }

    #[test]
    fn maybe_ref_writes_presence_bit() {
        let mut none = CellBuilder::new();
        none.store_maybe_ref(None).unwrap();
        assert_eq!(none.bit_len(), 1);
        assert_eq!(none.refs_len(), 0);

        let mut some = CellBuilder::new();
        some.store_maybe_ref(Some(Arc::new(Cell::empty()))).unwrap();
        assert_eq!(some.bit_len(), 1);
        assert_eq!(some.refs_len(), 1);
        assert_eq!(some.build().unwrap().data(), &[0x80]);
    }
}
