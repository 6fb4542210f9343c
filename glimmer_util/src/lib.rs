//! Hardware-independent core of the glimmer LED panel driver.
//!
//! The host streams RGB565 frames over a byte link; this crate turns that
//! stream back into frames ([`FrameDecoder`]), converts frames into binary
//! code modulation bit-planes ([`convert_frame`]), and walks those planes
//! out to the drive lines ([`emit_row`] over a [`PanelIo`] implementation).
//! [`FrameExchange`] carries finished frames from the receive context to the
//! scan-out context without ever exposing a half-written buffer.
//!
//! Everything here is `no_std` and allocation-free so it can run on the
//! device unchanged while the unit tests run on the host.

#![no_std]

#[cfg(test)]
extern crate std;

/// Panel width in pixels.
pub const WIDTH: usize = 128;
/// Panel height in pixels.
pub const HEIGHT: usize = 32;
/// Row-address cycles per refresh; each cycle drives two panel rows.
pub const SCAN_ROWS: usize = HEIGHT / 2;
/// Brightness bits kept per channel (64 levels).
pub const COLOR_DEPTH: usize = 6;
/// Size of one RGB565 frame on the wire.
pub const FRAME_BYTES: usize = WIDTH * HEIGHT * 2;
/// Accumulation buffer capacity. Base64 is the largest legal encoding of a
/// frame at 4/3 expansion; COBS needs less.
pub const RECV_CAPACITY: usize = FRAME_BYTES.div_ceil(3) * 4 + 256;

/// One complete pixel frame: RGB565, little-endian, row-major.
pub type FrameBytes = [u8; FRAME_BYTES];
/// Packed drive-line values: `[scan row][bit-plane][column]`, with the six
/// channel bits `R0,G0,B0,R1,G1,B1` in bits 0..=5 of each byte.
pub type BitPlanes = [[[u8; WIDTH]; COLOR_DEPTH]; SCAN_ROWS];

mod base64;
mod bcm;
mod cobs;
mod decoder;
mod gamma;
mod handoff;
mod scanout;

pub use bcm::convert_frame;
pub use decoder::{Ack, DecodeError, FrameDecoder, BINARY_MAGIC};
pub use handoff::FrameExchange;
pub use scanout::{emit_row, PanelIo, ScanCursor};
