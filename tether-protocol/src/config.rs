//! Protocol configuration
//!
//! Both endpoints must be built with the same configuration. There is no
//! handshake, so a mismatch shows up as a stream of decode failures rather
//! than as an error here.

use crate::checksum::{Checksum, CrcAlgorithm, MAX_CHECKSUM_LEN};
use crate::codec::FrameCodec;
use crate::error::ConfigError;
use crate::packet::MAX_PAYLOAD_SIZE;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default frame start delimiter
pub const DEFAULT_START_BYTE: u8 = 0x7E;

/// Default frame end delimiter
pub const DEFAULT_END_BYTE: u8 = 0x7D;

/// Default escape byte
pub const DEFAULT_ESCAPE_BYTE: u8 = 0x7C;

/// Default mask XORed into escaped bytes
pub const DEFAULT_ESCAPE_MASK: u8 = 0x20;

/// Width of the packet id field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum IdWidth {
    /// No id field; every packet decodes with id 0
    None,
    /// One byte
    #[default]
    U8,
    /// Two bytes, little-endian
    U16,
}

impl IdWidth {
    /// Number of id bytes on the wire
    pub fn len(self) -> usize {
        match self {
            IdWidth::None => 0,
            IdWidth::U8 => 1,
            IdWidth::U16 => 2,
        }
    }

    /// Largest id that fits
    pub fn max_id(self) -> u16 {
        match self {
            IdWidth::None => 0,
            IdWidth::U8 => u16::from(u8::MAX),
            IdWidth::U16 => u16::MAX,
        }
    }

    /// Check if `id` can be sent with this width
    pub fn fits(self, id: u16) -> bool {
        id <= self.max_id()
    }
}

/// Framing parameters shared by encoder and decoder
///
/// The checksum width is implied by the checksum engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(default, bound(deserialize = "C: Deserialize<'de> + Default"))
)]
pub struct ProtocolConfig<C = CrcAlgorithm> {
    /// Frame start delimiter
    pub start_byte: u8,
    /// Frame end delimiter
    pub end_byte: u8,
    /// Escape introducer
    pub escape_byte: u8,
    /// XOR mask applied to escaped bytes
    pub escape_mask: u8,
    /// Width of the id field
    pub id_width: IdWidth,
    /// Checksum engine over id + payload
    pub checksum: C,
    /// Largest payload accepted by encoder and decoder
    pub max_payload_size: usize,
}

impl<C: Default> Default for ProtocolConfig<C> {
    fn default() -> Self {
        Self {
            start_byte: DEFAULT_START_BYTE,
            end_byte: DEFAULT_END_BYTE,
            escape_byte: DEFAULT_ESCAPE_BYTE,
            escape_mask: DEFAULT_ESCAPE_MASK,
            id_width: IdWidth::U8,
            checksum: C::default(),
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl<C> ProtocolConfig<C> {
    /// Swap the checksum engine, keeping the framing parameters
    pub fn with_checksum<D>(self, checksum: D) -> ProtocolConfig<D> {
        ProtocolConfig {
            start_byte: self.start_byte,
            end_byte: self.end_byte,
            escape_byte: self.escape_byte,
            escape_mask: self.escape_mask,
            id_width: self.id_width,
            checksum,
            max_payload_size: self.max_payload_size,
        }
    }

    /// Escape grammar for this configuration
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(
            self.start_byte,
            self.end_byte,
            self.escape_byte,
            self.escape_mask,
        )
    }
}

impl<C: Checksum> ProtocolConfig<C> {
    /// Number of checksum bytes on the wire
    pub fn checksum_width(&self) -> usize {
        self.checksum.width()
    }

    /// Smallest body that can hold a packet (id + checksum)
    pub fn min_body_len(&self) -> usize {
        self.id_width.len() + self.checksum_width()
    }

    /// Largest unescaped body (id + max payload + checksum)
    pub fn max_body_len(&self) -> usize {
        self.min_body_len() + self.max_payload_size
    }

    /// Worst-case frame length, with every body byte escaped
    pub fn max_frame_len(&self) -> usize {
        2 + 2 * self.max_body_len()
    }

    /// Check the configuration for values that would break the framing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reserved = [self.start_byte, self.end_byte, self.escape_byte];
        if self.start_byte == self.end_byte
            || self.start_byte == self.escape_byte
            || self.end_byte == self.escape_byte
        {
            return Err(ConfigError::ReservedBytesNotDistinct);
        }

        // Every escaped byte must land outside the reserved set
        if self.escape_mask == 0
            || reserved
                .iter()
                .any(|&byte| reserved.contains(&(byte ^ self.escape_mask)))
        {
            return Err(ConfigError::InvalidEscapeMask {
                mask: self.escape_mask,
            });
        }

        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::PayloadCapacityExceeded {
                requested: self.max_payload_size,
                capacity: MAX_PAYLOAD_SIZE,
            });
        }

        let width = self.checksum_width();
        if width == 0 || width > MAX_CHECKSUM_LEN {
            return Err(ConfigError::InvalidChecksumWidth(width));
        }

        Ok(())
    }
}

#[cfg(feature = "toml")]
impl ProtocolConfig<CrcAlgorithm> {
    /// Parse and validate a configuration from TOML text
    ///
    /// Missing keys fall back to the defaults:
    /// ```toml
    /// start_byte = 0x7E
    /// end_byte = 0x7D
    /// escape_byte = 0x7C
    /// escape_mask = 0x20
    /// id_width = "u8"
    /// checksum = "crc16-xmodem"
    /// max_payload_size = 256
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, crate::error::ConfigLoadError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Xor8;

    #[test]
    fn test_default_is_valid() {
        let config = ProtocolConfig::<CrcAlgorithm>::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.checksum, CrcAlgorithm::Crc16Xmodem);
        assert_eq!(config.checksum_width(), 2);
        assert_eq!(config.min_body_len(), 3);
        assert_eq!(config.max_body_len(), 3 + MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_reserved_bytes_must_differ() {
        let config = ProtocolConfig::<CrcAlgorithm> {
            end_byte: DEFAULT_START_BYTE,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ReservedBytesNotDistinct)
        );
    }

    #[test]
    fn test_zero_mask_rejected() {
        let config = ProtocolConfig::<CrcAlgorithm> {
            escape_mask: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidEscapeMask { mask: 0 })
        );
    }

    #[test]
    fn test_mask_mapping_into_reserved_set_rejected() {
        // 0x7E ^ 0x03 = 0x7D, the end delimiter
        let config = ProtocolConfig::<CrcAlgorithm> {
            escape_mask: 0x03,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidEscapeMask { mask: 0x03 })
        );
    }

    #[test]
    fn test_payload_capacity_enforced() {
        let config = ProtocolConfig::<CrcAlgorithm> {
            max_payload_size: MAX_PAYLOAD_SIZE + 1,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PayloadCapacityExceeded {
                requested: MAX_PAYLOAD_SIZE + 1,
                capacity: MAX_PAYLOAD_SIZE,
            })
        );
    }

    #[test]
    fn test_id_width() {
        assert_eq!(IdWidth::None.len(), 0);
        assert!(IdWidth::None.fits(0));
        assert!(!IdWidth::None.fits(1));
        assert!(IdWidth::U8.fits(255));
        assert!(!IdWidth::U8.fits(256));
        assert!(IdWidth::U16.fits(u16::MAX));
    }

    #[test]
    fn test_with_checksum_keeps_framing() {
        let config = ProtocolConfig::<CrcAlgorithm> {
            id_width: IdWidth::U16,
            max_payload_size: 32,
            ..Default::default()
        }
        .with_checksum(Xor8);
        assert_eq!(config.id_width, IdWidth::U16);
        assert_eq!(config.max_payload_size, 32);
        assert_eq!(config.checksum_width(), 1);
        assert_eq!(config.max_frame_len(), 2 + 2 * (2 + 32 + 1));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml_partial() {
        let config = ProtocolConfig::<CrcAlgorithm>::from_toml_str(
            "id_width = \"u16\"\nchecksum = \"crc32\"\nmax_payload_size = 64\n",
        )
        .unwrap();
        assert_eq!(config.id_width, IdWidth::U16);
        assert_eq!(config.checksum, CrcAlgorithm::Crc32);
        assert_eq!(config.max_payload_size, 64);
        assert_eq!(config.start_byte, DEFAULT_START_BYTE);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml_rejects_invalid() {
        let result = ProtocolConfig::<CrcAlgorithm>::from_toml_str("start_byte = 0x7D\n");
        assert!(matches!(
            result,
            Err(crate::error::ConfigLoadError::Invalid(
                ConfigError::ReservedBytesNotDistinct
            ))
        ));
    }
}
