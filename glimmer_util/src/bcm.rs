//! RGB565 frame to binary-code-modulation bit-planes.

use crate::gamma;
use crate::{BitPlanes, FrameBytes, COLOR_DEPTH, SCAN_ROWS, WIDTH};

// Channel positions within one packed drive byte.
const R0: u8 = 0x01;
const G0: u8 = 0x02;
const B0: u8 = 0x04;
const R1: u8 = 0x08;
const G1: u8 = 0x10;
const B1: u8 = 0x20;

/// Regenerate the full bit-plane buffer from one pixel frame.
///
/// Each scan row serializes two panel rows at once: row `r` on the upper
/// channels and row `r + SCAN_ROWS` on the lower ones. Channels are widened
/// to 8 bits, gamma-mapped, cut down to [`COLOR_DEPTH`] bits, and their bits
/// scattered across the planes. Pure: same frame in, same planes out.
pub fn convert_frame(frame: &FrameBytes, planes: &mut BitPlanes) {
    for row in 0..SCAN_ROWS {
        for x in 0..WIDTH {
            let [r0, g0, b0] = channels(pixel(frame, row, x));
            let [r1, g1, b1] = channels(pixel(frame, row + SCAN_ROWS, x));

            for bit in 0..COLOR_DEPTH {
                let mask = 1u8 << bit;
                let mut packed = 0u8;
                if r0 & mask != 0 {
                    packed |= R0;
                }
                if g0 & mask != 0 {
                    packed |= G0;
                }
                if b0 & mask != 0 {
                    packed |= B0;
                }
                if r1 & mask != 0 {
                    packed |= R1;
                }
                if g1 & mask != 0 {
                    packed |= G1;
                }
                if b1 & mask != 0 {
                    packed |= B1;
                }
                planes[row][bit][x] = packed;
            }
        }
    }
}

fn pixel(frame: &FrameBytes, y: usize, x: usize) -> u16 {
    let i = (y * WIDTH + x) * 2;
    u16::from_le_bytes([frame[i], frame[i + 1]])
}

/// Split an RGB565 pixel into gamma-corrected, depth-reduced channels.
fn channels(p: u16) -> [u8; 3] {
    let r = gamma::correct((((p >> 11) & 0x1F) << 3) as u8);
    let g = gamma::correct((((p >> 5) & 0x3F) << 2) as u8);
    let b = gamma::correct(((p & 0x1F) << 3) as u8);
    [
        r >> (8 - COLOR_DEPTH),
        g >> (8 - COLOR_DEPTH),
        b >> (8 - COLOR_DEPTH),
    ]
}
