//! Checksum engines
//!
//! The framing logic only needs "bytes in, fixed-width integer out", so the
//! engine is a trait. [`CrcAlgorithm`] pins the named CRC standards both
//! endpoints may agree on; [`Xor8`] is the single-byte XOR sum used by
//! very small links.

use crc::{Crc, CRC_16_IBM_3740, CRC_16_KERMIT, CRC_16_XMODEM, CRC_32_ISO_HDLC, CRC_8_SMBUS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CRC8_SMBUS: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC16_XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const CRC16_IBM_3740: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);
const CRC16_KERMIT: Crc<u16> = Crc::<u16>::new(&CRC_16_KERMIT);
const CRC32_ISO_HDLC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Largest checksum width supported on the wire
pub const MAX_CHECKSUM_LEN: usize = 4;

/// A checksum over id + payload bytes
pub trait Checksum {
    /// Number of checksum bytes on the wire (1..=4)
    fn width(&self) -> usize;

    /// Compute the checksum of `data`
    ///
    /// Only the low [`width`](Checksum::width) bytes are transmitted.
    fn compute(&self, data: &[u8]) -> u32;
}

/// Named CRC standards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CrcAlgorithm {
    /// CRC-8/SMBUS (poly 0x07)
    Crc8Smbus,
    /// CRC-16/XMODEM (poly 0x1021, init 0)
    #[default]
    Crc16Xmodem,
    /// CRC-16/IBM-3740, also known as CRC-16/CCITT-FALSE
    Crc16Ccitt,
    /// CRC-16/KERMIT (reflected CCITT)
    Crc16Kermit,
    /// CRC-32/ISO-HDLC, the Ethernet/zlib CRC
    Crc32,
}

impl Checksum for CrcAlgorithm {
    fn width(&self) -> usize {
        match self {
            CrcAlgorithm::Crc8Smbus => 1,
            CrcAlgorithm::Crc16Xmodem | CrcAlgorithm::Crc16Ccitt | CrcAlgorithm::Crc16Kermit => 2,
            CrcAlgorithm::Crc32 => 4,
        }
    }

    fn compute(&self, data: &[u8]) -> u32 {
        match self {
            CrcAlgorithm::Crc8Smbus => u32::from(CRC8_SMBUS.checksum(data)),
            CrcAlgorithm::Crc16Xmodem => u32::from(CRC16_XMODEM.checksum(data)),
            CrcAlgorithm::Crc16Ccitt => u32::from(CRC16_IBM_3740.checksum(data)),
            CrcAlgorithm::Crc16Kermit => u32::from(CRC16_KERMIT.checksum(data)),
            CrcAlgorithm::Crc32 => CRC32_ISO_HDLC.checksum(data),
        }
    }
}

/// XOR of all bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Xor8;

impl Checksum for Xor8 {
    fn width(&self) -> usize {
        1
    }

    fn compute(&self, data: &[u8]) -> u32 {
        u32::from(data.iter().fold(0u8, |acc, &byte| acc ^ byte))
    }
}

/// Truncate `value` to `width` bytes
pub(crate) fn truncate(value: u32, width: usize) -> u32 {
    if width >= MAX_CHECKSUM_LEN {
        value
    } else {
        value & ((1u32 << (8 * width)) - 1)
    }
}

/// Little-endian wire bytes of `value`; the first `width` are meaningful
pub(crate) fn to_wire(value: u32) -> [u8; MAX_CHECKSUM_LEN] {
    value.to_le_bytes()
}

/// Read a little-endian integer of up to four bytes
pub(crate) fn from_wire(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte))
}
