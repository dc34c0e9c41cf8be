//! In-memory UART
//!
//! Bytes written are queued and handed back by reads, which makes a single
//! [`Loopback`] behave like a UART with TX wired to RX. Line faults can be
//! scheduled to exercise error paths.

use heapless::Deque;

use crate::uart::{UartBusError, UartRx, UartTx};

/// UART double backed by a fixed-size queue
#[derive(Debug, Default)]
pub struct Loopback<const N: usize> {
    queue: Deque<u8, N>,
    fault: Option<UartBusError>,
    flushes: usize,
}

impl<const N: usize> Loopback<N> {
    /// Create an empty loopback
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
            fault: None,
            flushes: 0,
        }
    }

    /// Queue bytes as if they arrived on the wire
    pub fn inject(&mut self, bytes: &[u8]) -> Result<(), UartBusError> {
        for &byte in bytes {
            self.queue
                .push_back(byte)
                .map_err(|_| UartBusError::Overrun)?;
        }
        Ok(())
    }

    /// Fail the next read with `error`
    pub fn fail_next_read(&mut self, error: UartBusError) {
        self.fault = Some(error);
    }

    /// Bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of completed flushes
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl<const N: usize> UartTx for Loopback<N> {
    type Error = UartBusError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.queue.capacity() - self.queue.len() < data.len() {
            return Err(UartBusError::Overrun);
        }
        self.inject(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

impl<const N: usize> UartRx for Loopback<N> {
    type Error = UartBusError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if let Some(error) = self.fault.take() {
            return Err(error);
        }

        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.queue.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut uart = Loopback::<16>::new();
        uart.write_blocking(&[1, 2, 3]).unwrap();
        uart.flush().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(uart.read_blocking(&mut buf), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert_eq!(uart.flushes(), 1);
    }

    #[test]
    fn test_partial_reads_keep_order() {
        let mut uart = Loopback::<16>::new();
        uart.inject(&[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(uart.read_blocking(&mut buf), Ok(3));
        assert_eq!(uart.read_byte(), Ok(Some(4)));
        assert_eq!(uart.read_byte(), Ok(None));
    }

    #[test]
    fn test_write_overrun_is_atomic() {
        let mut uart = Loopback::<4>::new();
        uart.inject(&[1, 2]).unwrap();
        assert_eq!(uart.write_blocking(&[3, 4, 5]), Err(UartBusError::Overrun));
        assert_eq!(uart.pending(), 2);
    }

    #[test]
    fn test_scheduled_fault() {
        let mut uart = Loopback::<4>::new();
        uart.inject(&[1]).unwrap();
        uart.fail_next_read(UartBusError::Framing);

        let mut buf = [0u8; 4];
        assert_eq!(uart.read_blocking(&mut buf), Err(UartBusError::Framing));
        assert_eq!(uart.read_blocking(&mut buf), Ok(1));
    }
}
