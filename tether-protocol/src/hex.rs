//! Byte-string formatting for logs and test fixtures
//!
//! ```text
//! HexStyle::Prefixed  0x00 0x11 0xff
//! HexStyle::Plain     00 11 ff
//! DecDisplay          000 017 255
//! ```

use core::fmt;

/// Hex parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    /// Some tokens carry a `0x` prefix and some do not
    #[error("mixed '0x' and plain hex tokens")]
    MixedFormat,
    /// Character that is not a hex digit
    #[error("invalid hex digit in token {0}")]
    InvalidDigit(usize),
    /// Plain token with an odd number of digits
    #[error("odd number of digits in token {0}")]
    OddLength(usize),
    /// Prefixed token larger than one byte
    #[error("token {0} does not fit in a byte")]
    ByteOutOfRange(usize),
    /// Output buffer too small
    #[error("output buffer too small")]
    BufferTooSmall,
}

/// Token style for [`HexDisplay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexStyle {
    /// `0x00 0x11`
    #[default]
    Prefixed,
    /// `00 11`
    Plain,
}

/// Space-separated lowercase hex rendering of a byte slice
#[derive(Debug, Clone, Copy)]
pub struct HexDisplay<'a> {
    bytes: &'a [u8],
    style: HexStyle,
}

impl<'a> HexDisplay<'a> {
    /// Render `bytes` in the given style
    pub fn new(bytes: &'a [u8], style: HexStyle) -> Self {
        Self { bytes, style }
    }
}

impl fmt::Display for HexDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match self.style {
                HexStyle::Prefixed => write!(f, "0x{byte:02x}")?,
                HexStyle::Plain => write!(f, "{byte:02x}")?,
            }
        }
        Ok(())
    }
}

/// Prefixed hex rendering, the common case
pub fn hex(bytes: &[u8]) -> HexDisplay<'_> {
    HexDisplay::new(bytes, HexStyle::Prefixed)
}

/// Space-separated, zero-padded decimal rendering of a byte slice
#[derive(Debug, Clone, Copy)]
pub struct DecDisplay<'a>(pub &'a [u8]);

impl fmt::Display for DecDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:03}")?;
        }
        Ok(())
    }
}

/// Check whether every whitespace-separated token is `0x` prefixed
///
/// Returns `Ok(false)` when no token is prefixed. A string without tokens
/// counts as prefixed.
pub fn is_0x_format(s: &str) -> Result<bool, HexError> {
    let mut prefixed = 0;
    let mut total = 0;
    for token in s.split_whitespace() {
        total += 1;
        if token.starts_with("0x") {
            prefixed += 1;
        }
    }

    match prefixed {
        p if p == total => Ok(true),
        0 => Ok(false),
        _ => Err(HexError::MixedFormat),
    }
}

/// Parse a hex string in either style into `out`
///
/// Prefixed tokens are one byte each. Plain tokens may hold several bytes
/// as digit pairs (`"0011 ff"`). Returns the number of bytes written.
pub fn parse_hex(s: &str, out: &mut [u8]) -> Result<usize, HexError> {
    let prefixed = is_0x_format(s)?;
    let mut written = 0;
    let mut emit = |byte: u8| -> Result<(), HexError> {
        let slot = out.get_mut(written).ok_or(HexError::BufferTooSmall)?;
        *slot = byte;
        written += 1;
        Ok(())
    };

    for (index, token) in s.split_whitespace().enumerate() {
        if prefixed {
            let digits = &token[2..];
            if digits.is_empty() {
                return Err(HexError::InvalidDigit(index));
            }
            let value = digits.bytes().try_fold(0u32, |acc, c| {
                let digit = hex_digit(c).ok_or(HexError::InvalidDigit(index))?;
                acc.checked_mul(16)
                    .map(|acc| acc + u32::from(digit))
                    .ok_or(HexError::ByteOutOfRange(index))
            })?;
            let byte = u8::try_from(value).map_err(|_| HexError::ByteOutOfRange(index))?;
            emit(byte)?;
        } else {
            let digits = token.as_bytes();
            if digits.len() % 2 != 0 {
                return Err(HexError::OddLength(index));
            }
            for pair in digits.chunks_exact(2) {
                let high = hex_digit(pair[0]).ok_or(HexError::InvalidDigit(index))?;
                let low = hex_digit(pair[1]).ok_or(HexError::InvalidDigit(index))?;
                emit((high << 4) | low)?;
            }
        }
    }

    Ok(written)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
