//! Checksums used by the ledger's wire formats.
//!
//! User-friendly addresses end in a CRC16/XMODEM of their first 34 bytes, and
//! a bag of cells may carry a trailing CRC32C (Castagnoli). Both are tiny
//! bitwise implementations; these run once per address or per envelope, never
//! on a hot path.

const CRC16_XMODEM_POLY: u16 = 0x1021;
const CRC32C_POLY_REFLECTED: u32 = 0x82F6_3B78;

/// CRC16/XMODEM: poly 0x1021, init 0, no reflection, no final xor.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_XMODEM_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC32C (Castagnoli), reflected, init and final xor `0xFFFF_FFFF`.
pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32C_POLY_REFLECTED
            } else {
                crc >> 1
            };
        }
    }
    crc ^ 0xFFFF_FFFF
}
