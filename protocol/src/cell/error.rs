//! Error types for cell construction, slicing and bag-of-cells decoding.

use thiserror::Error;

/// Errors raised while building or reading a single cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    /// A write would push the cell past its bit capacity.
    #[error("cell bit overflow: need {requested} bits, {available} available")]
    BitOverflow {
        /// Bits the write needed.
        requested: usize,
        /// Bits left in the builder.
        available: usize,
    },

    /// A write would attach more than four references.
    #[error("cell reference overflow: need {requested} refs, {available} available")]
    RefOverflow {
        /// References the write needed.
        requested: usize,
        /// Reference slots left in the builder.
        available: usize,
    },

    /// An integer does not fit the requested bit width.
    #[error("value does not fit in {bits} bits")]
    ValueTooLarge {
        /// Target width.
        bits: usize,
    },

    /// A read ran past the end of the cell's data.
    #[error("cell data underflow: need {requested} bits, {remaining} remaining")]
    DataUnderflow {
        /// Bits the read needed.
        requested: usize,
        /// Bits left in the slice.
        remaining: usize,
    },

    /// A read asked for a reference that is not there.
    #[error("cell reference underflow")]
    RefUnderflow,

    /// The raw data buffer does not match the declared bit length.
    #[error("cell data is {bytes} bytes, expected {expected} for {bits} bits")]
    InvalidDataLength {
        /// Actual buffer length.
        bytes: usize,
        /// Declared bit length.
        bits: usize,
        /// Buffer length implied by `bits`.
        expected: usize,
    },

    /// The tree is deeper than the network allows.
    #[error("cell depth {0} exceeds the maximum")]
    DepthExceeded(u16),
}

/// Errors raised while decoding a serialized bag of cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BocError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("empty input")]
    Empty,

    #[error("bad magic 0x{0:08x}")]
    InvalidMagic(u32),

    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("crc32c mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    CrcMismatch {
        /// Checksum carried by the document.
        stored: u32,
        /// Checksum of the bytes we received.
        computed: u32,
    },

    #[error("invalid descriptor for cell {index}: {reason}")]
    InvalidDescriptor {
        /// Position of the cell in the document.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    #[error("cell {cell} references {reference}, which is not a later cell")]
    InvalidReference {
        /// Referencing cell.
        cell: usize,
        /// Referenced index.
        reference: usize,
    },

    #[error("root index {0} out of range")]
    InvalidRoot(usize),

    #[error("expected exactly one root, found {0}")]
    RootCount(usize),

    #[error(transparent)]
    Cell(#[from] CellError),
}
