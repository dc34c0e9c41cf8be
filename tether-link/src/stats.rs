//! Link traffic counters

use tether_protocol::DecodeError;

/// Counters kept by a [`Link`](crate::Link)
///
/// Counters wrap on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Packets written to the UART
    pub packets_sent: u32,
    /// Frame bytes written to the UART
    pub bytes_sent: u32,
    /// Packets decoded successfully
    pub packets_received: u32,
    /// Raw bytes read from the UART
    pub bytes_received: u32,
    /// Frames dropped for exceeding the body capacity
    pub frame_too_large: u32,
    /// Frames dropped for a bad escape sequence
    pub malformed_escape: u32,
    /// Frames cut short by a delimiter
    pub truncated_frame: u32,
    /// Frames dropped for a bad checksum
    pub checksum_mismatch: u32,
    /// Read or write errors reported by the UART
    pub uart_errors: u32,
}

impl LinkStats {
    /// Count one decode failure
    pub fn record(&mut self, error: &DecodeError) {
        let counter = match error {
            DecodeError::FrameTooLarge => &mut self.frame_too_large,
            DecodeError::MalformedEscape => &mut self.malformed_escape,
            DecodeError::TruncatedFrame => &mut self.truncated_frame,
            DecodeError::ChecksumMismatch { .. } => &mut self.checksum_mismatch,
        };
        *counter = counter.wrapping_add(1);
    }

    /// Total decode failures of any kind
    pub fn decode_errors(&self) -> u32 {
        self.frame_too_large
            .wrapping_add(self.malformed_escape)
            .wrapping_add(self.truncated_frame)
            .wrapping_add(self.checksum_mismatch)
    }
}
