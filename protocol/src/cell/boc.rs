//! # Bag of Cells
//!
//! The wire format for cell trees. Wallets hand back a broadcast envelope as
//! a base64 BoC, and the indexer returns each transaction the same way.
//!
//! ```text
//! magic        u32  b5ee9c72
//! flags        u8   has_idx | has_crc32c | has_cache_bits | flags(2) | ref_size(3)
//! off_bytes    u8
//! cells        ref_size bytes
//! roots        ref_size bytes
//! absent       ref_size bytes
//! tot_size     off_bytes bytes
//! root_list    roots * ref_size
//! index        cells * off_bytes        (only if has_idx)
//! cell_data    tot_size bytes
//! crc32c       u32 little-endian        (only if has_crc32c)
//! ```
//!
//! Each cell record is `d1 d2 data refs`, where references are indices of
//! cells that appear *later* in the document. We serialize without an index
//! and with a single root.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{BocError, Cell, CellRef};
use crate::config::{BOC_MAGIC, MAX_CELL_REFS};
use crate::crypto::{crc32c, ContentHash};

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const REF_SIZE_MASK: u8 = 0x07;
const DESCRIPTOR_WITH_HASHES: u8 = 0x10;

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a base64 bag of cells with exactly one root.
///
/// Accepts the standard and URL-safe alphabets, padded or not; surrounding
/// whitespace is ignored.
pub fn decode_base64(encoded: &str) -> Result<CellRef, BocError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(BocError::Empty);
    }
    let bytes = STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE.decode(trimmed))
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|e| BocError::InvalidBase64(e.to_string()))?;
    deserialize_single(&bytes)
}

/// Decode a bag of cells that must carry exactly one root.
pub fn deserialize_single(bytes: &[u8]) -> Result<CellRef, BocError> {
    let mut roots = deserialize(bytes)?;
    if roots.len() != 1 {
        return Err(BocError::RootCount(roots.len()));
    }
    Ok(roots.remove(0))
}

/// Decode a bag of cells into its root cells.
pub fn deserialize(bytes: &[u8]) -> Result<Vec<CellRef>, BocError> {
    if bytes.is_empty() {
        return Err(BocError::Empty);
    }
    let mut reader = Reader::new(bytes);

    let magic = reader.read_uint(4)? as u32;
    if magic != BOC_MAGIC {
        return Err(BocError::InvalidMagic(magic));
    }

    let flags = reader.read_u8()?;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc = flags & FLAG_HAS_CRC32C != 0;
    let ref_size = (flags & REF_SIZE_MASK) as usize;
    if ref_size == 0 || ref_size > 4 {
        return Err(BocError::InvalidHeader(format!("ref size {ref_size}")));
    }
    let off_bytes = reader.read_u8()? as usize;
    if off_bytes == 0 || off_bytes > 8 {
        return Err(BocError::InvalidHeader(format!("offset size {off_bytes}")));
    }

    let cell_count = reader.read_uint(ref_size)? as usize;
    let root_count = reader.read_uint(ref_size)? as usize;
    let _absent = reader.read_uint(ref_size)?;
    let total_size = reader.read_uint(off_bytes)? as usize;

    if root_count == 0 || root_count > cell_count {
        return Err(BocError::InvalidHeader(format!(
            "{root_count} roots for {cell_count} cells"
        )));
    }

    if has_crc {
        if bytes.len() < 4 {
            return Err(BocError::Truncated(bytes.len()));
        }
        let (body, tail) = bytes.split_at(bytes.len() - 4);
        let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let computed = crc32c(body);
        if stored != computed {
            return Err(BocError::CrcMismatch { stored, computed });
        }
    }

    let mut root_indices = Vec::with_capacity(root_count.min(bytes.len()));
    for _ in 0..root_count {
        let index = reader.read_uint(ref_size)? as usize;
        if index >= cell_count {
            return Err(BocError::InvalidRoot(index));
        }
        root_indices.push(index);
    }

    if has_idx {
        reader.skip(cell_count * off_bytes)?;
    }

    let data_start = reader.position();
    let mut raw_cells = Vec::with_capacity(cell_count.min(bytes.len() / 2));
    for index in 0..cell_count {
        raw_cells.push(read_raw_cell(&mut reader, index, cell_count, ref_size)?);
    }
    if reader.position() - data_start != total_size {
        return Err(BocError::InvalidHeader(format!(
            "declared {total_size} bytes of cell data, read {}",
            reader.position() - data_start
        )));
    }

    // References only point forward, so building back to front always finds
    // every child already constructed.
    let mut built: Vec<Option<CellRef>> = vec![None; cell_count];
    for index in (0..cell_count).rev() {
        let raw = &raw_cells[index];
        let mut refs = Vec::with_capacity(raw.refs.len());
        for &child in &raw.refs {
            let cell = built[child].clone().ok_or(BocError::InvalidReference {
                cell: index,
                reference: child,
            })?;
            refs.push(cell);
        }
        let cell = Cell::new(
            raw.data.clone(),
            raw.bit_len,
            refs,
            raw.exotic,
            raw.level_mask,
        )?;
        built[index] = Some(Arc::new(cell));
    }

    root_indices
        .into_iter()
        .map(|i| built[i].clone().ok_or(BocError::InvalidRoot(i)))
        .collect()
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
    exotic: bool,
    level_mask: u8,
}

fn read_raw_cell(
    reader: &mut Reader<'_>,
    index: usize,
    cell_count: usize,
    ref_size: usize,
) -> Result<RawCell, BocError> {
    let d1 = reader.read_u8()?;
    let d2 = reader.read_u8()?;

    let ref_count = (d1 & 0x07) as usize;
    if ref_count > MAX_CELL_REFS {
        return Err(BocError::InvalidDescriptor {
            index,
            reason: format!("{ref_count} references"),
        });
    }
    let exotic = d1 & 0x08 != 0;
    let level_mask = d1 >> 5;

    if d1 & DESCRIPTOR_WITH_HASHES != 0 {
        let hash_count = level_mask.count_ones() as usize + 1;
        reader.skip(hash_count * (32 + 2))?;
    }

    let byte_len = (d2 as usize).div_ceil(2);
    let mut data = reader.read_bytes(byte_len)?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        byte_len * 8
    } else {
        let last = data.last_mut().ok_or_else(|| BocError::InvalidDescriptor {
            index,
            reason: "odd d2 with no data".to_string(),
        })?;
        if *last == 0 {
            return Err(BocError::InvalidDescriptor {
                index,
                reason: "missing completion tag".to_string(),
            });
        }
        let tag_position = last.trailing_zeros() as usize;
        *last &= !(1u8 << tag_position);
        byte_len * 8 - tag_position - 1
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let child = reader.read_uint(ref_size)? as usize;
        if child <= index || child >= cell_count {
            return Err(BocError::InvalidReference {
                cell: index,
                reference: child,
            });
        }
        refs.push(child);
    }

    Ok(RawCell {
        data,
        bit_len,
        refs,
        exotic,
        level_mask,
    })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], BocError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(BocError::Truncated(self.pos))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, BocError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_uint(&mut self, len: usize) -> Result<u64, BocError> {
        Ok(self
            .read_bytes(len)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }

    fn skip(&mut self, len: usize) -> Result<(), BocError> {
        self.read_bytes(len).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize a single-root tree, deduplicating identical subtrees.
pub fn serialize(root: &Cell, with_crc: bool) -> Vec<u8> {
    let order = topological_order(root);
    let index_of: HashMap<ContentHash, usize> = order
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell.hash(), i))
        .collect();

    let ref_size = bytes_needed(order.len() as u64);

    let mut cell_data = Vec::new();
    for cell in &order {
        cell_data.push(cell.refs_descriptor());
        cell_data.push(cell.bits_descriptor());
        cell_data.extend_from_slice(&cell.augmented_data());
        for child in cell.references() {
            let index = index_of[&child.hash()];
            write_uint(&mut cell_data, index as u64, ref_size);
        }
    }
    let off_bytes = bytes_needed(cell_data.len() as u64);

    let mut out = Vec::with_capacity(cell_data.len() + 32);
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
    out.push(if with_crc { FLAG_HAS_CRC32C } else { 0 } | ref_size as u8);
    out.push(off_bytes as u8);
    write_uint(&mut out, order.len() as u64, ref_size);
    write_uint(&mut out, 1, ref_size);
    write_uint(&mut out, 0, ref_size);
    write_uint(&mut out, cell_data.len() as u64, off_bytes);
    write_uint(&mut out, 0, ref_size);
    out.extend_from_slice(&cell_data);

    if with_crc {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }
    out
}

/// Serialize with CRC32C and encode as standard base64.
pub fn serialize_base64(root: &Cell) -> String {
    STANDARD.encode(serialize(root, true))
}

/// Reverse post-order: every cell precedes all of its descendants, the root
/// comes first, and each distinct subtree appears once.
fn topological_order(root: &Cell) -> Vec<&Cell> {
    fn visit<'c>(
        cell: &'c Cell,
        seen: &mut HashSet<ContentHash>,
        post_order: &mut Vec<&'c Cell>,
    ) {
        if !seen.insert(cell.hash()) {
            return;
        }
        for child in cell.references() {
            visit(child, seen, post_order);
        }
        post_order.push(cell);
    }

    let mut seen = HashSet::new();
    let mut post_order = Vec::new();
    visit(root, &mut seen, &mut post_order);
    post_order.reverse();
    post_order
}

fn bytes_needed(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

fn write_uint(out: &mut Vec<u8>, value: u64, len: usize) {
    out.extend_from_slice(&value.to_be_bytes()[8 - len..]);
}
