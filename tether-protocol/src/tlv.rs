//! Type-Length-Value payload records
//!
//! A TLV record is a convenient packet payload:
//! ```text
//! ┌──────┬────────────┬─────────────┐
//! │ TYPE │ LENGTH     │ VALUE       │
//! │ 1B   │ 1, 2 or 4B │ LENGTH B    │
//! └──────┴────────────┴─────────────┘
//! ```
//!
//! LENGTH and numeric values are little-endian.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// TLV encoding and decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TlvError {
    /// Record shorter than its TYPE and LENGTH header
    #[error("record too short for header ({0} bytes)")]
    TooShort(usize),
    /// LENGTH field disagrees with the record size
    #[error("length field {declared} but {actual} value bytes present")]
    LengthMismatch { declared: u32, actual: usize },
    /// Value bytes do not match the size of the requested format
    #[error("value is {actual} bytes, format needs {expected}")]
    ValueSizeMismatch { expected: usize, actual: usize },
    /// Value longer than the LENGTH field can express
    #[error("value of {0} bytes does not fit the length field")]
    ValueTooLarge(usize),
    /// Output buffer too small
    #[error("output buffer too small")]
    BufferTooSmall,
}

/// Width of the LENGTH field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum LengthWidth {
    #[default]
    U8,
    U16,
    U32,
}

impl LengthWidth {
    /// Number of LENGTH bytes
    pub fn len(self) -> usize {
        match self {
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
            LengthWidth::U32 => 4,
        }
    }

    /// Longest value the field can describe
    pub fn max_value_len(self) -> u32 {
        match self {
            LengthWidth::U8 => u32::from(u8::MAX),
            LengthWidth::U16 => u32::from(u16::MAX),
            LengthWidth::U32 => u32::MAX,
        }
    }
}

/// Encoding of a typed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ValueFormat {
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ValueFormat {
    /// Encoded size in bytes
    pub fn size(self) -> usize {
        match self {
            ValueFormat::U8 => 1,
            ValueFormat::U16 => 2,
            ValueFormat::U32 | ValueFormat::F32 => 4,
            ValueFormat::U64 | ValueFormat::F64 => 8,
        }
    }

    /// Check if this is an unsigned integer format
    pub fn is_uint(self) -> bool {
        !self.is_float()
    }

    /// Check if this is a floating point format
    pub fn is_float(self) -> bool {
        matches!(self, ValueFormat::F32 | ValueFormat::F64)
    }
}

/// A typed TLV value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Format this value is encoded with
    pub fn format(&self) -> ValueFormat {
        match self {
            Value::U8(_) => ValueFormat::U8,
            Value::U16(_) => ValueFormat::U16,
            Value::U32(_) => ValueFormat::U32,
            Value::U64(_) => ValueFormat::U64,
            Value::F32(_) => ValueFormat::F32,
            Value::F64(_) => ValueFormat::F64,
        }
    }

    /// Little-endian bytes; the first `format().size()` are meaningful
    fn to_le_bytes(self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        match self {
            Value::U8(v) => bytes[..1].copy_from_slice(&v.to_le_bytes()),
            Value::U16(v) => bytes[..2].copy_from_slice(&v.to_le_bytes()),
            Value::U32(v) => bytes[..4].copy_from_slice(&v.to_le_bytes()),
            Value::U64(v) => bytes.copy_from_slice(&v.to_le_bytes()),
            Value::F32(v) => bytes[..4].copy_from_slice(&v.to_le_bytes()),
            Value::F64(v) => bytes.copy_from_slice(&v.to_le_bytes()),
        }
        bytes
    }

    /// Parse a value of `format` from exactly `format.size()` bytes
    pub fn from_le_bytes(format: ValueFormat, bytes: &[u8]) -> Result<Self, TlvError> {
        let mismatch = TlvError::ValueSizeMismatch {
            expected: format.size(),
            actual: bytes.len(),
        };
        let value = match format {
            ValueFormat::U8 => Value::U8(u8::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?)),
            ValueFormat::U16 => {
                Value::U16(u16::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?))
            }
            ValueFormat::U32 => {
                Value::U32(u32::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?))
            }
            ValueFormat::U64 => {
                Value::U64(u64::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?))
            }
            ValueFormat::F32 => {
                Value::F32(f32::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?))
            }
            ValueFormat::F64 => {
                Value::F64(f64::from_le_bytes(bytes.try_into().map_err(|_| mismatch)?))
            }
        };
        Ok(value)
    }
}

/// A decoded record borrowing its value bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord<'a> {
    /// Record type
    pub ty: u8,
    /// Declared value length
    pub length: u32,
    /// Raw value bytes
    pub value: &'a [u8],
}

impl TlvRecord<'_> {
    /// Interpret the value bytes as `format`
    pub fn value_as(&self, format: ValueFormat) -> Result<Value, TlvError> {
        Value::from_le_bytes(format, self.value)
    }
}

/// TLV encoder/decoder with a fixed LENGTH width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TlvCodec {
    length_width: LengthWidth,
}

impl TlvCodec {
    /// Create a codec with the given LENGTH width
    pub fn new(length_width: LengthWidth) -> Self {
        Self { length_width }
    }

    /// Width of the LENGTH field
    pub fn length_width(&self) -> LengthWidth {
        self.length_width
    }

    /// Size of TYPE plus LENGTH
    pub fn header_len(&self) -> usize {
        1 + self.length_width.len()
    }

    /// Encode a typed value, returning the number of bytes written
    pub fn encode(&self, ty: u8, value: &Value, out: &mut [u8]) -> Result<usize, TlvError> {
        let bytes = value.to_le_bytes();
        self.encode_raw(ty, &bytes[..value.format().size()], out)
    }

    /// Encode raw value bytes, returning the number of bytes written
    pub fn encode_raw(&self, ty: u8, value: &[u8], out: &mut [u8]) -> Result<usize, TlvError> {
        let length = u32::try_from(value.len())
            .ok()
            .filter(|&len| len <= self.length_width.max_value_len())
            .ok_or(TlvError::ValueTooLarge(value.len()))?;

        let header_len = self.header_len();
        let total = header_len + value.len();
        let out = out.get_mut(..total).ok_or(TlvError::BufferTooSmall)?;

        out[0] = ty;
        out[1..header_len].copy_from_slice(&length.to_le_bytes()[..self.length_width.len()]);
        out[header_len..].copy_from_slice(value);
        Ok(total)
    }

    /// Decode a single record occupying all of `record`
    pub fn decode<'a>(&self, record: &'a [u8]) -> Result<TlvRecord<'a>, TlvError> {
        let header_len = self.header_len();
        if record.len() < header_len {
            return Err(TlvError::TooShort(record.len()));
        }

        let length = record[1..header_len]
            .iter()
            .rev()
            .fold(0u32, |acc, &byte| (acc << 8) | u32::from(byte));
        let value = &record[header_len..];
        if usize::try_from(length).ok() != Some(value.len()) {
            return Err(TlvError::LengthMismatch {
                declared: length,
                actual: value.len(),
            });
        }

        Ok(TlvRecord {
            ty: record[0],
            length,
            value,
        })
    }
}
