//! Tether packet link
//!
//! Couples a [`Uart`](tether_hal::Uart) with an encoder and decoder so an
//! application deals in packets instead of bytes:
//!
//! ```text
//! send(id, payload) ──► Encoder ──► UartTx
//! poll()            ◄── Decoder ◄── UartRx
//! ```
//!
//! Decode failures are never returned to the caller. They are logged,
//! counted in [`LinkStats`] and the decoder carries on with the next frame.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

mod stats;

pub use stats::LinkStats;

use tether_hal::{UartRx, UartTx};
use tether_protocol::{
    Checksum, ConfigError, CrcAlgorithm, Decoder, Encoder, EncodeError, Packet, ProtocolConfig,
};

/// Buffer size for UART receive
pub const RX_BUF_SIZE: usize = 64;

/// Errors returned by [`Link`] operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The UART reported an error
    #[error("uart error: {0:?}")]
    Uart(E),
    /// The packet could not be encoded
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A packet link over a UART
pub struct Link<U, C = CrcAlgorithm> {
    uart: U,
    encoder: Encoder<C>,
    decoder: Decoder<C>,
    rx: [u8; RX_BUF_SIZE],
    rx_pos: usize,
    rx_len: usize,
    stats: LinkStats,
}

impl<U, C, E> Link<U, C>
where
    U: UartTx<Error = E> + UartRx<Error = E>,
    C: Checksum + Clone,
{
    /// Create a link; both directions share `config`
    pub fn new(uart: U, config: ProtocolConfig<C>) -> Result<Self, ConfigError> {
        let encoder = Encoder::new(config.clone())?;
        let decoder = Decoder::new(config)?;
        Ok(Self {
            uart,
            encoder,
            decoder,
            rx: [0; RX_BUF_SIZE],
            rx_pos: 0,
            rx_len: 0,
            stats: LinkStats::default(),
        })
    }

    /// Encode and transmit one packet, then flush the UART
    pub fn send(&mut self, id: u16, payload: &[u8]) -> Result<(), LinkError<E>> {
        let frame = self.encoder.encode_to_vec(id, payload)?;

        if let Err(e) = self
            .uart
            .write_blocking(&frame)
            .and_then(|()| self.uart.flush())
        {
            warn!("UART write error");
            self.stats.uart_errors = self.stats.uart_errors.wrapping_add(1);
            return Err(LinkError::Uart(e));
        }

        trace!("TX: id {} ({} bytes)", id, frame.len());
        self.stats.packets_sent = self.stats.packets_sent.wrapping_add(1);
        self.stats.bytes_sent = self.stats.bytes_sent.wrapping_add(frame.len() as u32);
        Ok(())
    }

    /// Return the next received packet, if any
    ///
    /// Bytes left over from an earlier read are decoded first. Only when
    /// they hold no complete packet is the UART read, once. Bytes after the
    /// returned packet stay buffered for the next call.
    pub fn poll(&mut self) -> Result<Option<Packet>, LinkError<E>> {
        if let Some(packet) = self.drain() {
            return Ok(Some(packet));
        }

        let n = match self.uart.read_blocking(&mut self.rx) {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error");
                self.stats.uart_errors = self.stats.uart_errors.wrapping_add(1);
                return Err(LinkError::Uart(e));
            }
        };

        if n > 0 {
            trace!("RX: {} bytes", n);
        }
        self.rx_pos = 0;
        self.rx_len = n;
        self.stats.bytes_received = self.stats.bytes_received.wrapping_add(n as u32);

        Ok(self.drain())
    }

    /// Feed buffered bytes to the decoder until a packet completes
    fn drain(&mut self) -> Option<Packet> {
        while self.rx_pos < self.rx_len {
            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;

            match self.decoder.feed(byte) {
                Ok(Some(packet)) => {
                    self.stats.packets_received = self.stats.packets_received.wrapping_add(1);
                    return Some(packet);
                }
                Ok(None) => {
                    // Need more bytes
                }
                Err(e) => {
                    warn!("Frame decode error: {:?}", e);
                    self.stats.record(&e);
                }
            }
        }
        None
    }

    /// Received bytes not yet fed to the decoder
    pub fn pending(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    /// Drop buffered bytes and any partial frame
    pub fn reset(&mut self) {
        self.rx_pos = 0;
        self.rx_len = 0;
        self.decoder.reset();
    }

    /// Traffic and error counters
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Access the underlying UART
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Release the underlying UART
    pub fn into_inner(self) -> U {
        self.uart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_hal::{Loopback, UartBusError};
    use tether_protocol::{DecodeError, IdWidth};

    type TestLink = Link<Loopback<512>>;

    fn link() -> TestLink {
        Link::new(Loopback::new(), ProtocolConfig::default()).unwrap()
    }

    #[test]
    fn test_send_then_poll() {
        let mut link = link();
        link.send(7, &[0x01, 0x7E, 0x02]).unwrap();

        let packet = link.poll().unwrap().unwrap();
        assert_eq!(packet, Packet::new(7, &[0x01, 0x7E, 0x02]).unwrap());
        assert_eq!(link.uart_mut().flushes(), 1);

        let stats = link.stats();
        assert_eq!(stats.packets_sent, 1);
        assert_eq!(stats.packets_received, 1);
        assert_eq!(stats.bytes_sent, stats.bytes_received);
        assert_eq!(stats.decode_errors(), 0);
    }

    #[test]
    fn test_poll_without_data() {
        let mut link = link();
        assert_eq!(link.poll(), Ok(None));
        assert_eq!(link.stats(), LinkStats::default());
    }

    #[test]
    fn test_leftover_bytes_kept_for_next_poll() {
        let mut link = link();
        link.send(1, &[0xAA]).unwrap();
        link.send(2, &[0xBB]).unwrap();

        assert_eq!(link.poll().unwrap().map(|p| p.id), Some(1));
        assert!(link.pending() > 0);
        assert_eq!(link.uart_mut().pending(), 0);

        assert_eq!(link.poll().unwrap().map(|p| p.id), Some(2));
        assert_eq!(link.pending(), 0);
        assert_eq!(link.poll(), Ok(None));
    }

    #[test]
    fn test_frame_split_across_reads() {
        let mut link = link();
        let payload = [0x55u8; 80];
        link.send(3, &payload).unwrap();

        // First read fills the buffer without reaching END
        assert_eq!(link.poll(), Ok(None));
        assert_eq!(
            link.poll().unwrap(),
            Some(Packet::new(3, &payload).unwrap())
        );
    }

    #[test]
    fn test_decode_errors_counted_and_skipped() {
        let mut link = link();
        // Body too short to hold id and checksum
        link.uart_mut().inject(&[0x7E, 0x01, 0x7D]).unwrap();
        link.send(4, &[0x10, 0x20]).unwrap();

        assert_eq!(link.poll().unwrap().map(|p| p.id), Some(4));
        let stats = link.stats();
        assert_eq!(stats.truncated_frame, 1);
        assert_eq!(stats.decode_errors(), 1);
    }

    #[test]
    fn test_checksum_mismatch_counted() {
        let encoder = Encoder::new(ProtocolConfig::<CrcAlgorithm>::default()).unwrap();
        let mut frame = encoder.encode_to_vec(5, &[0x10]).unwrap();
        frame[2] = 0x11;

        let mut link = link();
        link.uart_mut().inject(&frame).unwrap();
        assert_eq!(link.poll(), Ok(None));
        assert_eq!(link.stats().checksum_mismatch, 1);
    }

    #[test]
    fn test_uart_read_error() {
        let mut link = link();
        link.uart_mut().fail_next_read(UartBusError::Noise);
        assert_eq!(link.poll(), Err(LinkError::Uart(UartBusError::Noise)));
        assert_eq!(link.stats().uart_errors, 1);

        // The link keeps working afterwards
        link.send(6, &[]).unwrap();
        assert_eq!(link.poll().unwrap().map(|p| p.id), Some(6));
    }

    #[test]
    fn test_uart_write_error() {
        let mut link = Link::new(Loopback::<4>::new(), ProtocolConfig::<CrcAlgorithm>::default())
            .unwrap();
        assert_eq!(
            link.send(1, &[1, 2, 3]),
            Err(LinkError::Uart(UartBusError::Overrun))
        );
        assert_eq!(link.stats().uart_errors, 1);
        assert_eq!(link.stats().packets_sent, 0);
    }

    #[test]
    fn test_encode_error() {
        let mut link = link();
        assert_eq!(
            link.send(300, &[]),
            Err(LinkError::Encode(EncodeError::IdOutOfRange {
                id: 300,
                width: IdWidth::U8
            }))
        );
        assert_eq!(link.uart_mut().pending(), 0);
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let mut link = link();
        link.uart_mut().inject(&[0x7E, 0x01, 0x02]).unwrap();
        assert_eq!(link.poll(), Ok(None));

        link.reset();
        link.send(8, &[]).unwrap();
        assert_eq!(link.poll().unwrap().map(|p| p.id), Some(8));
        assert_eq!(link.stats().decode_errors(), 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = LinkStats::default();
        stats.record(&DecodeError::FrameTooLarge);
        stats.record(&DecodeError::MalformedEscape);
        stats.record(&DecodeError::ChecksumMismatch {
            received: 1,
            computed: 2,
        });
        assert_eq!(stats.frame_too_large, 1);
        assert_eq!(stats.malformed_escape, 1);
        assert_eq!(stats.checksum_mismatch, 1);
        assert_eq!(stats.decode_errors(), 3);
    }
}
