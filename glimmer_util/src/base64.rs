//! Legacy text framing: Base64 payloads terminated by `'\n'`.

use crate::decoder::DecodeError;

const INVALID: u8 = 64;

/// Standard-alphabet decode table; `INVALID` marks bytes outside the
/// alphabet, which are skipped (this is what swallows `'\r'`).
const DECODE_TABLE: [u8; 256] = [
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 62, 64, 64, 64, 63,
    52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 64, 64, 64, 64, 64, 64,
    64, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14,
    15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 64, 64, 64, 64, 64,
    64, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40,
    41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
    64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64, 64,
];

/// Whether `byte` may appear inside a legacy text packet.
pub(crate) fn is_text_byte(byte: u8) -> bool {
    DECODE_TABLE[byte as usize] != INVALID || byte == b'=' || byte == b'\r'
}

/// Decode a Base64 packet (without its `'\n'` terminator) into `dst`.
///
/// `'='` padding terminates decoding early; bytes outside the alphabet are
/// ignored. Returns the decoded length, or an error if `dst` would overflow.
pub(crate) fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
    let mut write = 0;
    let mut accum: u32 = 0;
    let mut bits = 0u32;

    for &c in src {
        if c == b'=' {
            break;
        }
        let value = DECODE_TABLE[c as usize];
        if value == INVALID {
            continue;
        }

        accum = (accum << 6) | u32::from(value);
        bits += 6;

        if bits >= 8 {
            bits -= 8;
            if write >= dst.len() {
                return Err(DecodeError::Overflow);
            }
            dst[write] = (accum >> bits) as u8;
            write += 1;
        }
    }

    Ok(write)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        let mut out = [0u8; 16];
        assert_eq!(decode(b"TWFu", &mut out), Ok(3));
        assert_eq!(&out[..3], b"Man");

        assert_eq!(decode(b"TWE=", &mut out), Ok(2));
        assert_eq!(&out[..2], b"Ma");

        assert_eq!(decode(b"TQ==", &mut out), Ok(1));
        assert_eq!(&out[..1], b"M");

        assert_eq!(decode(b"", &mut out), Ok(0));
    }

    #[test]
    fn carriage_returns_and_noise_are_skipped() {
        let mut out = [0u8; 16];
        assert_eq!(decode(b"TW\rFu\r", &mut out), Ok(3));
        assert_eq!(&out[..3], b"Man");
    }

    #[test]
    fn padding_terminates_early() {
        // Bytes after '=' are never decoded.
        let mut out = [0u8; 16];
        assert_eq!(decode(b"TWE=TWFu", &mut out), Ok(2));
        assert_eq!(&out[..2], b"Ma");
    }

    #[test]
    fn output_overflow_aborts() {
        let mut out = [0u8; 2];
        assert_eq!(decode(b"TWFu", &mut out), Err(DecodeError::Overflow));
    }

    #[test]
    fn binary_payload() {
        // b"\x00\xff\x10" -> "AP8Q"
        let mut out = [0u8; 3];
        assert_eq!(decode(b"AP8Q", &mut out), Ok(3));
        assert_eq!(out, [0x00, 0xFF, 0x10]);
    }
}
