//! Read cursor over a cell.

use super::{Cell, CellBuilder, CellError, CellRef};

/// A read position inside a [`Cell`]: the next unread bit and reference.
#[derive(Clone, Debug)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.references().len() - self.ref_pos
    }

    /// Nothing left to read, neither bits nor references.
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        let bit = self.bit_at(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Read an unsigned integer of up to 64 bits.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::ValueTooLarge { bits });
        }
        Ok(self.load_u128(bits)? as u64)
    }

    /// Read a two's-complement signed integer of up to 64 bits.
    pub fn load_int(&mut self, bits: usize) -> Result<i64, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::ValueTooLarge { bits });
        }
        let raw = self.load_uint(bits)?;
        if bits == 64 {
            return Ok(raw as i64);
        }
        let sign = 1u64 << (bits - 1);
        Ok(if raw & sign != 0 {
            (raw | !((1u64 << bits) - 1)) as i64
        } else {
            raw as i64
        })
    }

    /// Read an unsigned integer of up to 128 bits.
    pub fn load_u128(&mut self, bits: usize) -> Result<u128, CellError> {
        if bits > 128 {
            return Err(CellError::ValueTooLarge { bits });
        }
        self.ensure_bits(bits)?;
        let mut value: u128 = 0;
        for _ in 0..bits {
            value = (value << 1) | self.bit_at(self.bit_pos) as u128;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Read a `VarUInteger 16` coins amount.
    pub fn load_coins(&mut self) -> Result<u128, CellError> {
        let byte_len = self.load_uint(4)? as usize;
        self.load_u128(byte_len * 8)
    }

    /// Read `bits` bits into a left-aligned byte buffer.
    pub fn load_bits(&mut self, bits: usize) -> Result<Vec<u8>, CellError> {
        self.ensure_bits(bits)?;
        let mut out = vec![0u8; bits.div_ceil(8)];
        for i in 0..bits {
            if self.bit_at(self.bit_pos + i) {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        self.bit_pos += bits;
        Ok(out)
    }

    /// Read exactly `N` whole bytes.
    pub fn load_array<const N: usize>(&mut self) -> Result<[u8; N], CellError> {
        let bytes = self.load_bits(N * 8)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    pub fn load_ref(&mut self) -> Result<CellRef, CellError> {
        let cell = self
            .cell
            .references()
            .get(self.ref_pos)
            .cloned()
            .ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(cell)
    }

    /// `Maybe ^X`: a presence bit, then the reference if present.
    pub fn load_maybe_ref(&mut self) -> Result<Option<CellRef>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Skip `bits` bits without decoding them.
    pub fn skip_bits(&mut self, bits: usize) -> Result<(), CellError> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Copy the unread remainder (bits and references) into a builder.
    pub fn to_builder(&self) -> Result<CellBuilder, CellError> {
        let mut lookahead = self.clone();
        let remaining = lookahead.remaining_bits();
        let bits = lookahead.load_bits(remaining)?;
        let mut builder = CellBuilder::new();
        builder.store_bits(&bits, remaining)?;
        for child in &self.cell.references()[self.ref_pos..] {
            builder.store_ref(child.clone())?;
        }
        Ok(builder)
    }

    /// Freeze the unread remainder into a standalone cell.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        self.to_builder()?.build()
    }

    fn bit_at(&self, index: usize) -> bool {
        self.cell.data()[index / 8] & (0x80 >> (index % 8)) != 0
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::DataUnderflow {
                requested: bits,
                remaining: self.remaining_bits(),
            });
        }
        Ok(())
    }
}
