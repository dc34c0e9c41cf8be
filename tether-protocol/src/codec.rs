//! Frame codec: delimiters and the escaping grammar
//!
//! Escaping rule:
//! - START, END and ESCAPE inside the body are sent as `ESCAPE, byte ^ MASK`
//! - every other byte is sent unchanged
//!
//! The mask is chosen (and validated by [`ProtocolConfig`]) so an escaped
//! byte is never itself reserved.
//!
//! [`ProtocolConfig`]: crate::ProtocolConfig

use crate::error::CodecError;

/// Reserved byte values and the escape mask of one protocol instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameCodec {
    start: u8,
    end: u8,
    escape: u8,
    mask: u8,
}

impl FrameCodec {
    /// Create a codec from its reserved bytes and mask
    pub const fn new(start: u8, end: u8, escape: u8, mask: u8) -> Self {
        Self {
            start,
            end,
            escape,
            mask,
        }
    }

    /// Frame start delimiter
    pub fn start(&self) -> u8 {
        self.start
    }

    /// Frame end delimiter
    pub fn end(&self) -> u8 {
        self.end
    }

    /// Escape introducer
    pub fn escape_byte(&self) -> u8 {
        self.escape
    }

    /// Check if `byte` must be escaped inside a body
    pub fn is_reserved(&self, byte: u8) -> bool {
        byte == self.start || byte == self.end || byte == self.escape
    }

    /// Check if `byte` is START or END
    pub fn is_delimiter(&self, byte: u8) -> bool {
        byte == self.start || byte == self.end
    }

    /// Recover the original byte that followed an ESCAPE
    ///
    /// Returns `None` if the result would not have needed escaping, which
    /// means the sequence was never produced by [`escape`](Self::escape).
    pub fn unescape_byte(&self, byte: u8) -> Option<u8> {
        let raw = byte ^ self.mask;
        self.is_reserved(raw).then_some(raw)
    }

    /// Length of `bytes` after escaping
    pub fn escaped_len(&self, bytes: &[u8]) -> usize {
        bytes.len() + bytes.iter().filter(|&&byte| self.is_reserved(byte)).count()
    }

    /// Lazily escape a byte sequence
    pub fn escape<I>(&self, bytes: I) -> Escape<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Escape {
            codec: *self,
            bytes: bytes.into_iter(),
            pending: None,
        }
    }

    /// Escape `bytes` into `out`, returning the number of bytes written
    ///
    /// `out` is untouched if it is too small.
    pub fn escape_into(&self, bytes: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        let needed = self.escaped_len(bytes);
        if out.len() < needed {
            return Err(CodecError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }

        for (slot, byte) in out.iter_mut().zip(self.escape(bytes.iter().copied())) {
            *slot = byte;
        }
        Ok(needed)
    }

    /// Reverse [`escape_into`](Self::escape_into)
    ///
    /// `bytes` must be a body already stripped of its delimiters. Fails with
    /// [`CodecError::Malformed`] on a dangling ESCAPE, an escaped byte that
    /// does not map back to a reserved value, or a raw delimiter.
    pub fn unescape_into(&self, bytes: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        let mut written = 0;
        let mut iter = bytes.iter().copied();

        while let Some(byte) = iter.next() {
            let raw = if byte == self.escape {
                let escaped = iter.next().ok_or(CodecError::Malformed)?;
                if self.is_delimiter(escaped) {
                    return Err(CodecError::Malformed);
                }
                self.unescape_byte(escaped).ok_or(CodecError::Malformed)?
            } else if self.is_delimiter(byte) {
                return Err(CodecError::Malformed);
            } else {
                byte
            };

            let slot = out.get_mut(written).ok_or(CodecError::BufferTooSmall {
                needed: written + 1,
                available: written,
            })?;
            *slot = raw;
            written += 1;
        }

        Ok(written)
    }
}

/// Iterator returned by [`FrameCodec::escape`]
#[derive(Debug, Clone)]
pub struct Escape<I> {
    codec: FrameCodec,
    bytes: I,
    pending: Option<u8>,
}

impl<I: Iterator<Item = u8>> Iterator for Escape<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if let Some(byte) = self.pending.take() {
            return Some(byte);
        }

        let byte = self.bytes.next()?;
        if self.codec.is_reserved(byte) {
            self.pending = Some(byte ^ self.codec.mask);
            Some(self.codec.escape)
        } else {
            Some(byte)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = usize::from(self.pending.is_some());
        let (lower, upper) = self.bytes.size_hint();
        (
            lower.saturating_add(pending),
            upper.and_then(|n| n.checked_mul(2)?.checked_add(pending)),
        )
    }
}
