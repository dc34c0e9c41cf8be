//! Tether Hardware Abstraction Layer
//!
//! This crate defines the byte transport a Tether link runs over. Chip
//! HALs, host serial ports and test doubles implement the same traits so
//! the link code is shared between them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tether-link (send / poll)              │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tether-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip UART    │       │   Loopback    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod loopback;
pub mod uart;

pub use loopback::Loopback;
pub use uart::{DataBits, Parity, StopBits, Uart, UartBusError, UartConfig, UartRx, UartTx};
