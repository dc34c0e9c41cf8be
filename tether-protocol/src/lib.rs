//! Tether serial packet protocol
//!
//! This crate defines the framing used between a host and an embedded
//! device sharing a UART. Packets are protected by a CRC and wrapped in
//! reserved delimiter bytes so a receiver can find packet boundaries in a
//! noisy byte stream.
//!
//! # Protocol Overview
//!
//! Every packet is sent as a single frame:
//! ```text
//! ┌───────┬──────────────────────────────────────────┬─────┐
//! │ START │ escaped( ID │ PAYLOAD     │ CHECKSUM )   │ END │
//! │ 1B    │          0-2B │ 0-256B      │ 1-4B         │ 1B  │
//! └───────┴──────────────────────────────────────────┴─────┘
//! ```
//!
//! Inside the body, any START, END or ESCAPE byte is replaced by
//! `ESCAPE, byte ^ MASK`. Multi-byte ID and CHECKSUM fields are
//! little-endian. The checksum covers ID and PAYLOAD.
//!
//! The [`Decoder`] consumes bytes one at a time and never gets stuck: any
//! failure is reported as a [`DecodeError`] and the next well-formed frame
//! decodes normally.
//!
//! The [`cobs`], [`tlv`] and [`hex`] modules hold payload helpers that sit
//! alongside the framing: an alternative zero-delimited framing, typed
//! type-length-value records, and byte-string formatting for diagnostics.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod checksum;
pub mod cobs;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod hex;
pub mod packet;
pub mod tlv;

pub use checksum::{Checksum, CrcAlgorithm, Xor8};
pub use codec::FrameCodec;
pub use config::{IdWidth, ProtocolConfig};
pub use decoder::{Decoder, DecoderState, Outcomes};
pub use error::{CodecError, ConfigError, DecodeError, EncodeError};
pub use packet::{Encoder, Packet, MAX_BODY_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};

#[cfg(feature = "toml")]
pub use error::ConfigLoadError;
