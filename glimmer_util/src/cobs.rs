//! COBS-style escaped framing.
//!
//! The host encodes each frame so that no byte inside the packet equals the
//! `0x00` delimiter; a literal `0x00` on the wire therefore always marks
//! end-of-packet. Decoding walks run headers: a header byte `code` is
//! followed by `code - 1` literal bytes, and unless `code == 0xFF` (a
//! maximum-length run) an elided zero byte follows the run.

use crate::decoder::DecodeError;

/// Run header value meaning "254 literals, no trailing zero".
const MAX_RUN: u8 = 0xFF;

/// Decode an escaped packet (without its trailing delimiter) into `dst`.
///
/// Returns the decoded length. A run header of `0x00`, a run extending past
/// the end of `src`, or any write that would land past the end of `dst` is
/// an error; `dst` contents are unspecified after an error.
pub(crate) fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, DecodeError> {
    let mut read = 0;
    let mut write = 0;

    while read < src.len() {
        let code = src[read];
        if code == 0 {
            return Err(DecodeError::BadRunHeader);
        }
        read += 1;

        let run = code as usize - 1;
        if read + run > src.len() {
            return Err(DecodeError::TruncatedRun);
        }
        if write + run > dst.len() {
            return Err(DecodeError::Overflow);
        }
        dst[write..write + run].copy_from_slice(&src[read..read + run]);
        read += run;
        write += run;

        if code != MAX_RUN && read < src.len() {
            if write >= dst.len() {
                return Err(DecodeError::Overflow);
            }
            dst[write] = 0;
            write += 1;
        }
    }

    Ok(write)
}

#[cfg(test)]
pub(crate) fn encode(src: &[u8], dst: &mut std::vec::Vec<u8>) {
    // Reference encoder for tests, mirroring the host sender.
    dst.clear();
    let mut code_index = dst.len();
    dst.push(0);
    let mut code = 1u8;

    for &byte in src {
        if byte == 0 {
            dst[code_index] = code;
            code_index = dst.len();
            dst.push(0);
            code = 1;
        } else {
            dst.push(byte);
            code += 1;
            if code == MAX_RUN {
                dst[code_index] = code;
                code_index = dst.len();
                dst.push(0);
                code = 1;
            }
        }
    }
    dst[code_index] = code;
}
