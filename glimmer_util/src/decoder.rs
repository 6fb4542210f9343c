//! Frame reassembly from the serial byte stream.
//!
//! Three framings coexist on the link, chosen per packet by the sender:
//! escaped packets end at a literal `0x00`, legacy text packets are Base64
//! ending at `'\n'`, and a `0xFF 0x00` magic pair as the first two bytes of
//! a packet switches to a raw countdown of exactly [`FRAME_BYTES`] bytes.
//!
//! A packet's leading bytes decide its framing: the magic pair selects
//! binary, and a packet stays eligible for text framing only while every
//! accumulated byte is legal Base64 traffic and the line is long enough to
//! carry a frame. Once a byte outside that alphabet shows up, `'\n'` is
//! ordinary escaped payload, so escaped packets may carry newline bytes
//! freely.
//!
//! The decoder is fed one byte at a time and answers with at most one
//! acknowledgement per completed packet. All error paths reset the receive
//! state; none of them can write outside the internal frame buffer.

use heapless::Vec;

use crate::{FrameBytes, FRAME_BYTES, RECV_CAPACITY};
use crate::{base64, cobs};

/// First-byte-pair of a raw binary packet. Escaped packets cannot contain
/// `0x00` before their terminator and a lone `0xFF` header would be a
/// truncated run, so the pair is unambiguous from a reset state.
pub const BINARY_MAGIC: [u8; 2] = [0xFF, 0x00];

const DELIMITER: u8 = 0x00;
const NEWLINE: u8 = b'\n';

/// Shortest Base64 encoding of a near-frame-sized payload. A buffer shorter
/// than this cannot be a frame-bearing text packet, so a newline there is
/// escaped payload, not a terminator. An escaped packet body tops out near
/// `FRAME_BYTES + FRAME_BYTES / 254` bytes, well below this, so escaped
/// traffic can never be mistaken for text.
const TEXT_MIN: usize = FRAME_BYTES * 4 / 3;

/// Per-packet acknowledgement sent back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Frame decoded to exactly the expected size and was published.
    Accepted,
    /// Malformed encoding, wrong size, or buffer overflow.
    Rejected,
}

impl Ack {
    /// Wire representation: `'K'` for accepted, `'E'` for rejected.
    pub fn as_byte(self) -> u8 {
        match self {
            Ack::Accepted => b'K',
            Ack::Rejected => b'E',
        }
    }
}

/// Why a packet failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Escaped-framing run header equal to the delimiter value.
    BadRunHeader,
    /// Run header promised more literals than the packet contains.
    TruncatedRun,
    /// Decoded length differs from [`FRAME_BYTES`].
    SizeMismatch,
    /// A write would have landed past the end of the output buffer.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Collecting bytes until a framing terminator.
    Accumulate,
    /// Raw countdown: `written` bytes of the frame copied so far.
    Binary { written: usize },
}

/// Reassembles complete frames from the byte stream.
///
/// Decoding lands in a private frame buffer; callers copy [`frame`] out only
/// after an [`Ack::Accepted`], so a rejected packet never disturbs anything
/// already published.
///
/// [`frame`]: FrameDecoder::frame
pub struct FrameDecoder {
    buf: Vec<u8, RECV_CAPACITY>,
    mode: Mode,
    /// Every accumulated byte so far is legal legacy-text traffic.
    text_legal: bool,
    frame: FrameBytes,
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            mode: Mode::Accumulate,
            text_legal: true,
            frame: [0; FRAME_BYTES],
        }
    }

    /// The most recently decoded frame. Valid after `push` returned
    /// [`Ack::Accepted`]; unspecified otherwise.
    pub fn frame(&self) -> &FrameBytes {
        &self.frame
    }

    /// Feed one received byte.
    ///
    /// Returns `Some(ack)` when the byte completed (or aborted) a packet,
    /// `None` while a packet is still in flight.
    pub fn push(&mut self, byte: u8) -> Option<Ack> {
        match self.mode {
            Mode::Binary { written } => self.push_binary(byte, written),
            Mode::Accumulate => self.push_framed(byte),
        }
    }

    fn push_binary(&mut self, byte: u8, written: usize) -> Option<Ack> {
        // Countdown invariant: 0 <= written < FRAME_BYTES while in binary
        // mode. Anything else means corrupted state; abort the packet rather
        // than index out of range.
        if written >= FRAME_BYTES {
            self.reset();
            return Some(Ack::Rejected);
        }

        self.frame[written] = byte;
        let written = written + 1;

        if written == FRAME_BYTES {
            self.reset();
            Some(Ack::Accepted)
        } else {
            self.mode = Mode::Binary { written };
            None
        }
    }

    fn push_framed(&mut self, byte: u8) -> Option<Ack> {
        // Binary mode is only entered off the first byte-pair of a packet.
        if self.buf.len() == 1 && self.buf[0] == BINARY_MAGIC[0] && byte == BINARY_MAGIC[1] {
            self.buf.clear();
            self.mode = Mode::Binary { written: 0 };
            return None;
        }

        match byte {
            DELIMITER => {
                if self.buf.is_empty() {
                    return None;
                }
                let result = cobs::decode(&self.buf, &mut self.frame);
                self.reset();
                Some(Self::judge(result))
            }
            NEWLINE if self.text_legal && self.buf.len() >= TEXT_MIN => {
                let result = base64::decode(&self.buf, &mut self.frame);
                self.reset();
                Some(Self::judge(result))
            }
            _ => {
                if !base64::is_text_byte(byte) {
                    self.text_legal = false;
                }
                if self.buf.push(byte).is_err() {
                    // Hard capacity reached; drop the packet and scan on.
                    self.reset();
                    return Some(Ack::Rejected);
                }
                None
            }
        }
    }

    fn judge(result: Result<usize, DecodeError>) -> Ack {
        let exact = result.and_then(|n| {
            if n == FRAME_BYTES {
                Ok(())
            } else {
                Err(DecodeError::SizeMismatch)
            }
        });
        match exact {
            Ok(()) => Ack::Accepted,
            Err(_) => Ack::Rejected,
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.mode = Mode::Accumulate;
        self.text_legal = true;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
