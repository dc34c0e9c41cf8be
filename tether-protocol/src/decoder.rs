//! Incremental packet decoder
//!
//! The decoder is fed one byte at a time and never needs the stream split
//! into frames beforehand. Noise between frames is dropped, every failure is
//! reported as a [`DecodeError`], and the decoder is ready for the next
//! START by the time the error is returned.
//!
//! A decoder mutates its state on every byte; feeding it from more than one
//! place requires the caller to serialize access (it takes `&mut self`).

use core::iter::Copied;
use core::slice::Iter;

use heapless::Vec;

use crate::checksum::{self, Checksum, CrcAlgorithm};
use crate::codec::FrameCodec;
use crate::config::ProtocolConfig;
use crate::error::{ConfigError, DecodeError};
use crate::packet::{Packet, MAX_BODY_SIZE};

/// Parse phase of a [`Decoder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    /// Waiting for START; everything else is noise
    Idle,
    /// Accumulating body bytes
    InBody,
    /// Got ESCAPE, the next byte is a transformed reserved value
    InEscape,
}

/// State machine turning a byte stream into packets
#[derive(Debug, Clone)]
pub struct Decoder<C = CrcAlgorithm> {
    config: ProtocolConfig<C>,
    codec: FrameCodec,
    state: DecoderState,
    buffer: Vec<u8, MAX_BODY_SIZE>,
}

impl<C: Checksum> Decoder<C> {
    /// Create a decoder for a validated configuration
    pub fn new(config: ProtocolConfig<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        let codec = config.codec();
        Ok(Self {
            config,
            codec,
            state: DecoderState::Idle,
            buffer: Vec::new(),
        })
    }

    /// Configuration this decoder was built with
    pub fn config(&self) -> &ProtocolConfig<C> {
        &self.config
    }

    /// Current parse phase
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Check if the decoder is between frames
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::Idle
    }

    /// Number of unescaped body bytes buffered for the frame in progress
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame and wait for the next START
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.buffer.clear();
    }

    /// Start accumulating a new frame
    fn begin_frame(&mut self) {
        self.buffer.clear();
        self.state = DecoderState::InBody;
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Ok(Some(packet))` when END completes a valid frame,
    /// `Ok(None)` when more bytes are needed, or `Err` when the frame in
    /// progress was rejected. The decoder has already recovered when `Err`
    /// is returned.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Packet>, DecodeError> {
        match self.state {
            DecoderState::Idle => {
                if byte == self.codec.start() {
                    self.begin_frame();
                }
                // Silently ignore non-START bytes while waiting
                Ok(None)
            }
            DecoderState::InBody => {
                if byte == self.codec.start() {
                    self.resynchronize()
                } else if byte == self.codec.end() {
                    self.finalize()
                } else if byte == self.codec.escape_byte() {
                    self.state = DecoderState::InEscape;
                    Ok(None)
                } else {
                    self.push(byte)
                }
            }
            DecoderState::InEscape => {
                if byte == self.codec.start() {
                    // The START still opens the next frame
                    debug!("START after ESCAPE, {} bytes dropped", self.buffer.len());
                    self.begin_frame();
                    return Err(DecodeError::MalformedEscape);
                }

                match self.codec.unescape_byte(byte) {
                    Some(raw) if !self.codec.is_delimiter(byte) => {
                        self.state = DecoderState::InBody;
                        self.push(raw)
                    }
                    _ => {
                        debug!("invalid escaped byte {=u8:#x}", byte);
                        self.reset();
                        Err(DecodeError::MalformedEscape)
                    }
                }
            }
        }
    }

    /// Lazily decode a slice of bytes
    ///
    /// Yields one item per completed or rejected frame. Bytes not yet
    /// consumed when the iterator is dropped are never fed.
    pub fn decode<'a>(&'a mut self, bytes: &'a [u8]) -> Outcomes<'a, C, Copied<Iter<'a, u8>>> {
        self.decode_iter(bytes.iter().copied())
    }

    /// Lazily decode any byte iterator
    pub fn decode_iter<I>(&mut self, bytes: I) -> Outcomes<'_, C, I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        Outcomes {
            decoder: self,
            bytes: bytes.into_iter(),
        }
    }

    /// Append an unescaped body byte, enforcing the size limit
    fn push(&mut self, byte: u8) -> Result<Option<Packet>, DecodeError> {
        if self.buffer.len() >= self.config.max_body_len() || self.buffer.push(byte).is_err() {
            warn!("frame exceeds {} body bytes", self.config.max_body_len());
            self.reset();
            return Err(DecodeError::FrameTooLarge);
        }
        Ok(None)
    }

    /// Unexpected START inside a body: abandon the partial frame
    fn resynchronize(&mut self) -> Result<Option<Packet>, DecodeError> {
        let abandoned = self.buffer.len();
        self.begin_frame();

        if abandoned == 0 {
            return Ok(None);
        }
        debug!("resync on START, {} bytes dropped", abandoned);
        Err(DecodeError::TruncatedFrame)
    }

    /// END inside a body: validate and hand out the packet
    fn finalize(&mut self) -> Result<Option<Packet>, DecodeError> {
        let result = self.parse_body();
        self.reset();

        match result {
            Ok(packet) => {
                trace!("packet {} ({} bytes)", packet.id, packet.payload.len());
                Ok(Some(packet))
            }
            Err(e) => {
                debug!("frame rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Split the body into id, payload and checksum and verify it
    fn parse_body(&self) -> Result<Packet, DecodeError> {
        let body = self.buffer.as_slice();
        if body.len() < self.config.min_body_len() {
            return Err(DecodeError::TruncatedFrame);
        }

        let width = self.config.checksum_width();
        let (data, trailer) = body.split_at(body.len() - width);
        let received = checksum::from_wire(trailer);
        let computed = checksum::truncate(self.config.checksum.compute(data), width);
        if received != computed {
            return Err(DecodeError::ChecksumMismatch { received, computed });
        }

        let (id_bytes, payload) = data.split_at(self.config.id_width.len());
        let id = id_bytes
            .iter()
            .rev()
            .fold(0u16, |acc, &byte| (acc << 8) | u16::from(byte));

        let payload = Vec::from_slice(payload).map_err(|_| DecodeError::FrameTooLarge)?;
        Ok(Packet { id, payload })
    }
}

/// Lazy sequence of decode outcomes, see [`Decoder::decode`]
#[derive(Debug)]
pub struct Outcomes<'a, C, I> {
    decoder: &'a mut Decoder<C>,
    bytes: I,
}

impl<C: Checksum, I: Iterator<Item = u8>> Iterator for Outcomes<'_, C, I> {
    type Item = Result<Packet, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        for byte in self.bytes.by_ref() {
            match self.decoder.feed(byte) {
                Ok(Some(packet)) => return Some(Ok(packet)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
