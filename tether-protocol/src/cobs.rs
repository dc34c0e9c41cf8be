//! Consistent Overhead Byte Stuffing
//!
//! An alternative to delimiter escaping for links that reserve only the
//! zero byte. The encoded form contains no zeros except the trailing
//! `0x00` frame delimiter, and grows by at most one byte per 254 bytes of
//! input.

/// Frame delimiter emitted after every encoded block
pub const COBS_DELIMITER: u8 = 0x00;

/// COBS encoding and decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CobsError {
    /// Output buffer too small
    #[error("output buffer too small")]
    BufferTooSmall,
    /// Zero byte found inside the encoded data
    #[error("unexpected zero byte at offset {0}")]
    UnexpectedZero(usize),
    /// Code bytes do not describe the data that follows them
    #[error("malformed COBS block")]
    Malformed,
}

/// Upper bound on the encoded size of `len` input bytes, delimiter included
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 2
}

/// Encode `data` into `out`, appending the `0x00` delimiter
///
/// `out` must hold [`max_encoded_len`] bytes. Returns the number of bytes
/// written.
pub fn encode(data: &[u8], out: &mut [u8]) -> Result<usize, CobsError> {
    if out.len() < max_encoded_len(data.len()) {
        return Err(CobsError::BufferTooSmall);
    }

    // An empty block is a lone code byte, which the crate leaves out
    let len = match ::cobs::encode(data, out) {
        0 => {
            out[0] = 0x01;
            1
        }
        len => len,
    };
    out[len] = COBS_DELIMITER;
    Ok(len + 1)
}

/// Decode one COBS block into `out`
///
/// A single trailing delimiter is accepted and ignored. `out` must be at
/// least as long as the block without its delimiter. Returns the number
/// of decoded bytes.
pub fn decode(data: &[u8], out: &mut [u8]) -> Result<usize, CobsError> {
    let body = match data.split_last() {
        Some((&COBS_DELIMITER, rest)) => rest,
        _ => data,
    };

    if let Some(pos) = body.iter().position(|&byte| byte == COBS_DELIMITER) {
        return Err(CobsError::UnexpectedZero(pos));
    }
    if out.len() < body.len() {
        return Err(CobsError::BufferTooSmall);
    }
    if body == [0x01] {
        return Ok(0);
    }

    ::cobs::decode(body, out).map_err(|_| CobsError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(data: &[u8]) -> heapless::Vec<u8, 600> {
        let mut out = [0u8; 600];
        let len = encode(data, &mut out).unwrap();
        heapless::Vec::from_slice(&out[..len]).unwrap()
    }

    fn decoded(data: &[u8]) -> heapless::Vec<u8, 600> {
        let mut out = [0u8; 600];
        let len = decode(data, &mut out).unwrap();
        heapless::Vec::from_slice(&out[..len]).unwrap()
    }

    #[test]
    fn test_encode_no_zeros() {
        assert_eq!(
            encoded(&[0x01, 0x02, 0x03]).as_slice(),
            &[0x04, 0x01, 0x02, 0x03, 0x00]
        );
    }

    #[test]
    fn test_encode_non_leading_zeros() {
        assert_eq!(
            encoded(&[0x01, 0x02, 0x00, 0x03, 0x00]).as_slice(),
            &[0x03, 0x01, 0x02, 0x02, 0x03, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_leading_zero() {
        assert_eq!(
            encoded(&[0x00, 0x11, 0x11, 0x00, 0x22, 0x22, 0x00]).as_slice(),
            &[0x01, 0x03, 0x11, 0x11, 0x03, 0x22, 0x22, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_single_bytes() {
        assert_eq!(encoded(&[0x18]).as_slice(), &[0x02, 0x18, 0x00]);
        assert_eq!(encoded(&[0x00]).as_slice(), &[0x01, 0x01, 0x00]);
        assert_eq!(encoded(&[]).as_slice(), &[0x01, 0x00]);
    }

    #[test]
    fn test_empty_roundtrip() {
        assert!(decoded(&encoded(&[])).is_empty());
        assert!(decoded(&[0x01]).is_empty());
    }

    #[test]
    fn test_roundtrip_around_block_boundaries() {
        for len in [0usize, 1, 253, 254, 255, 508, 509] {
            let data: heapless::Vec<u8, 512> =
                (0..len).map(|i| (i % 255) as u8 + 1).collect();
            let wire = encoded(&data);
            assert!(wire.len() <= max_encoded_len(len));
            assert_eq!(decoded(&wire).as_slice(), data.as_slice(), "len {len}");
        }
    }

    #[test]
    fn test_encode_long_array() {
        let data: heapless::Vec<u8, 256> = (0..=255u8).collect();

        let mut expected = heapless::Vec::<u8, 300>::new();
        expected.extend_from_slice(&[0x01, 0xFF]).unwrap();
        expected.extend(1..=254u8);
        expected.extend_from_slice(&[0x02, 0xFF, 0x00]).unwrap();

        assert_eq!(encoded(&data).as_slice(), expected.as_slice());
        assert_eq!(decoded(&expected).as_slice(), data.as_slice());
    }

    #[test]
    fn test_encode_max_nonzero_block() {
        let mut data = heapless::Vec::<u8, 256>::new();
        data.extend(1..=255u8);
        data.push(0x00).unwrap();

        let mut expected = heapless::Vec::<u8, 300>::new();
        expected.push(0xFF).unwrap();
        expected.extend(1..=254u8);
        expected.extend_from_slice(&[0x02, 0xFF, 0x01, 0x00]).unwrap();

        assert_eq!(encoded(&data).as_slice(), expected.as_slice());
        assert_eq!(decoded(&expected).as_slice(), data.as_slice());
    }

    #[test]
    fn test_decode_vectors() {
        assert_eq!(
            decoded(&[0x04, 0x01, 0x02, 0x03, 0x00]).as_slice(),
            &[0x01, 0x02, 0x03]
        );
        assert_eq!(
            decoded(&[0x03, 0x01, 0x02, 0x02, 0x03, 0x01, 0x00]).as_slice(),
            &[0x01, 0x02, 0x00, 0x03, 0x00]
        );
        // Delimiter is optional
        assert_eq!(decoded(&[0x02, 0x18]).as_slice(), &[0x18]);
    }

    #[test]
    fn test_decode_unexpected_zero() {
        let mut out = [0u8; 8];
        assert_eq!(
            decode(&[0x03, 0x01, 0x00, 0x02, 0x00], &mut out),
            Err(CobsError::UnexpectedZero(2))
        );
    }

    #[test]
    fn test_decode_code_overruns_input() {
        let mut out = [0u8; 8];
        assert_eq!(
            decode(&[0x05, 0x01, 0x02, 0x00], &mut out),
            Err(CobsError::Malformed)
        );
    }

    #[test]
    fn test_buffer_too_small() {
        let mut out = [0u8; 3];
        assert_eq!(
            encode(&[0x01, 0x02, 0x03], &mut out),
            Err(CobsError::BufferTooSmall)
        );
        assert_eq!(
            decode(&[0x04, 0x01, 0x02, 0x03, 0x00], &mut out[..2]),
            Err(CobsError::BufferTooSmall)
        );
    }

    #[test]
    fn test_large_data_roundtrip() {
        let data: heapless::Vec<u8, 512> = (0..512usize).map(|i| (i % 256) as u8).collect();
        let wire = encoded(&data);
        assert!(wire.len() <= max_encoded_len(data.len()));
        assert_eq!(wire.iter().filter(|&&b| b == 0).count(), 1);
        assert_eq!(decoded(&wire).as_slice(), data.as_slice());
    }
}
