//! Packets and the packet encoder
//!
//! Frame format:
//! - START (1 byte): frame start delimiter
//! - ID (0-2 bytes): packet id, little-endian
//! - PAYLOAD (0-256 bytes): caller-defined data
//! - CHECKSUM (1-4 bytes): checksum of ID and PAYLOAD, little-endian
//! - END (1 byte): frame end delimiter
//!
//! Everything between START and END is escaped.

use heapless::Vec;

use crate::checksum::{self, Checksum, CrcAlgorithm, MAX_CHECKSUM_LEN};
use crate::codec::FrameCodec;
use crate::config::ProtocolConfig;
use crate::error::{ConfigError, EncodeError};

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 256;

/// Maximum id width in bytes
pub const MAX_ID_LEN: usize = 2;

/// Maximum unescaped body size (ID + PAYLOAD + CHECKSUM)
pub const MAX_BODY_SIZE: usize = MAX_ID_LEN + MAX_PAYLOAD_SIZE + MAX_CHECKSUM_LEN;

/// Maximum complete frame size (START + fully escaped body + END)
pub const MAX_FRAME_SIZE: usize = 1 + 2 * MAX_BODY_SIZE + 1;

/// A validated or outgoing packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    /// Application-level packet id
    pub id: u16,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Packet {
    /// Create a new packet with the given id and payload
    pub fn new(id: u16, payload: &[u8]) -> Result<Self, EncodeError> {
        let payload = Vec::from_slice(payload).map_err(|_| EncodeError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        })?;

        Ok(Self { id, payload })
    }

    /// Create a packet with no payload
    pub fn empty(id: u16) -> Self {
        Self {
            id,
            payload: Vec::new(),
        }
    }
}

/// Turns packets into wire frames
///
/// Encoding is a pure transform; the encoder holds only configuration and
/// can be shared freely.
#[derive(Debug, Clone)]
pub struct Encoder<C = CrcAlgorithm> {
    config: ProtocolConfig<C>,
    codec: FrameCodec,
}

impl<C: Checksum> Encoder<C> {
    /// Create an encoder for a validated configuration
    pub fn new(config: ProtocolConfig<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        let codec = config.codec();
        Ok(Self { config, codec })
    }

    /// Configuration this encoder was built with
    pub fn config(&self) -> &ProtocolConfig<C> {
        &self.config
    }

    /// Assemble the unescaped body: ID, PAYLOAD, CHECKSUM
    fn body(&self, id: u16, payload: &[u8]) -> Result<Vec<u8, MAX_BODY_SIZE>, EncodeError> {
        if payload.len() > self.config.max_payload_size {
            return Err(EncodeError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        let id_width = self.config.id_width;
        if !id_width.fits(id) {
            return Err(EncodeError::IdOutOfRange {
                id,
                width: id_width,
            });
        }

        let overflow = EncodeError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        };

        let mut body = Vec::new();
        body.extend_from_slice(&id.to_le_bytes()[..id_width.len()])
            .map_err(|_| overflow)?;
        body.extend_from_slice(payload).map_err(|_| overflow)?;

        let width = self.config.checksum_width();
        let crc = self.config.checksum.compute(&body);
        body.extend_from_slice(&checksum::to_wire(crc)[..width])
            .map_err(|_| overflow)?;

        Ok(body)
    }

    /// Number of bytes `encode` would write for this packet
    pub fn frame_len(&self, id: u16, payload: &[u8]) -> Result<usize, EncodeError> {
        let body = self.body(id, payload)?;
        Ok(2 + self.codec.escaped_len(&body))
    }

    /// Encode a packet into a byte buffer
    ///
    /// Returns the number of bytes written. Nothing is written on error.
    pub fn encode(&self, id: u16, payload: &[u8], buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let body = self.body(id, payload)?;
        let frame_len = 2 + self.codec.escaped_len(&body);
        if buffer.len() < frame_len {
            return Err(EncodeError::BufferTooSmall {
                needed: frame_len,
                available: buffer.len(),
            });
        }

        buffer[0] = self.codec.start();
        let escaped = self
            .codec
            .escape_into(&body, &mut buffer[1..frame_len - 1])
            .map_err(|_| EncodeError::BufferTooSmall {
                needed: frame_len,
                available: buffer.len(),
            })?;
        buffer[1 + escaped] = self.codec.end();

        Ok(frame_len)
    }

    /// Encode a packet into a heapless Vec
    pub fn encode_to_vec(
        &self,
        id: u16,
        payload: &[u8],
    ) -> Result<Vec<u8, MAX_FRAME_SIZE>, EncodeError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(id, payload, &mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| EncodeError::BufferTooSmall {
                needed: len,
                available: MAX_FRAME_SIZE,
            })?;
        Ok(vec)
    }

    /// Encode an existing [`Packet`]
    pub fn encode_packet(&self, packet: &Packet, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        self.encode(packet.id, &packet.payload, buffer)
    }
}
