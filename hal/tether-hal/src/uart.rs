//! UART serial communication abstractions
//!
//! Provides blocking byte transport traits that can be implemented by
//! chip-specific HALs or host serial ports.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read available data from the UART
    ///
    /// Returns the number of bytes placed in `buf`. Zero means nothing
    /// arrived before the implementation gave up waiting.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    ///
    /// Returns `None` if no byte arrived.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        let n = self.read_blocking(&mut buf)?;
        Ok((n > 0).then_some(buf[0]))
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART line settings
///
/// Both ends of a link must agree on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Bits on the line per byte: start, data, parity and stop bits
    pub fn frame_bits(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }

    /// Line throughput in bytes per second
    pub fn bytes_per_second(&self) -> u32 {
        self.baudrate / self.frame_bits()
    }

    /// Time on the wire for `len` bytes, rounded up to whole microseconds
    pub fn transmit_time_us(&self, len: usize) -> u64 {
        let bits = len as u64 * u64::from(self.frame_bits());
        (bits * 1_000_000).div_ceil(u64::from(self.baudrate.max(1)))
    }
}

/// Number of data bits per byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Line-level UART errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBusError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Overrun error
    Overrun,
    /// Parity error
    Parity,
    /// Buffer too small
    BufferTooSmall,
    /// Other error
    Other,
}

impl core::fmt::Display for UartBusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            UartBusError::Framing => "framing error",
            UartBusError::Noise => "noise error",
            UartBusError::Overrun => "overrun",
            UartBusError::Parity => "parity error",
            UartBusError::BufferTooSmall => "buffer too small",
            UartBusError::Other => "uart error",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_115200_8n1() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.frame_bits(), 10);
        assert_eq!(config.bytes_per_second(), 11_520);
    }

    #[test]
    fn test_frame_bits_with_parity_and_two_stop_bits() {
        let config = UartConfig {
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
            ..UartConfig::default()
        };
        assert_eq!(config.frame_bits(), 11);
    }

    #[test]
    fn test_transmit_time() {
        let config = UartConfig {
            baudrate: 10_000,
            ..UartConfig::default()
        };
        // 10 bits per byte at 10 kbaud is 1 ms per byte
        assert_eq!(config.transmit_time_us(3), 3_000);
        assert_eq!(UartConfig::default().transmit_time_us(1), 87);
        assert_eq!(config.transmit_time_us(0), 0);
    }
}
