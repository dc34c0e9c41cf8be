//! Error types for encoding, decoding and configuration

use crate::config::IdWidth;

/// Errors returned synchronously by the encoder.
///
/// An encode error never leaves partial output behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Payload exceeds the configured maximum
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
    /// Packet id does not fit the configured id width
    #[error("packet id {id} does not fit id width {width:?}")]
    IdOutOfRange { id: u16, width: IdWidth },
    /// Output buffer cannot hold the encoded frame
    #[error("buffer too small ({available} bytes, need {needed})")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Failures reported by the decoder.
///
/// None of these are fatal: the decoder has already resynchronized by the
/// time the error is handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Body grew past the maximum before END arrived
    #[error("frame body exceeds maximum size")]
    FrameTooLarge,
    /// ESCAPE followed by a delimiter or by a byte that was never escaped
    #[error("malformed escape sequence")]
    MalformedEscape,
    /// Body shorter than id + checksum, or abandoned by a new START
    #[error("truncated frame")]
    TruncatedFrame,
    /// Structurally valid frame whose checksum does not match
    #[error("checksum mismatch (received {received:#x}, computed {computed:#x})")]
    ChecksumMismatch { received: u32, computed: u32 },
}

/// Errors from the standalone escape/unescape helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Dangling ESCAPE, invalid escaped byte or raw delimiter in the body
    #[error("malformed escaped body")]
    Malformed,
    /// Output buffer too small
    #[error("buffer too small ({available} bytes, need {needed})")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Protocol configuration rejected by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// START, END and ESCAPE must be three different values
    #[error("start, end and escape bytes must be distinct")]
    ReservedBytesNotDistinct,
    /// Mask is zero or maps a reserved byte onto another reserved byte
    #[error("escape mask {mask:#04x} does not move reserved bytes out of the reserved set")]
    InvalidEscapeMask { mask: u8 },
    /// Requested payload size is larger than the compiled-in capacity
    #[error("max payload size {requested} exceeds capacity {capacity}")]
    PayloadCapacityExceeded { requested: usize, capacity: usize },
    /// Checksum engine reports an unsupported width
    #[error("checksum width {0} is not in 1..=4")]
    InvalidChecksumWidth(usize),
}

/// Errors loading a configuration from TOML
#[cfg(feature = "toml")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// TOML text could not be parsed into a configuration
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed configuration failed validation
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
