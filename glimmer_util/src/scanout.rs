//! Row emission and refresh sequencing for the panel drive lines.
//!
//! Brightness comes from dwell time: bit-plane `b` stays enabled for
//! `2^b` base units, so the six planes sum to 64 intensity steps. The
//! dwell itself is paced by the caller (a hardware timer on the device);
//! this module fixes the line-level sequence within one row.

use crate::{BitPlanes, COLOR_DEPTH, SCAN_ROWS, WIDTH};

/// The panel's drive lines, implemented over GPIO bit-banging or dedicated
/// shift hardware. Either way one `shift_column` call must clock the six
/// channel bits (`R0..B1` in bits 0..=5) of one column into the register.
pub trait PanelIo {
    /// Drive the output-enable line; `false` blanks the panel.
    fn set_output_enabled(&mut self, enabled: bool);
    /// Present one packed column and clock it into the shift register.
    fn shift_column(&mut self, packed: u8);
    /// Select the scan row on the address lines.
    fn set_row_address(&mut self, row: u8);
    /// Transfer the shift register to the output drivers.
    fn pulse_latch(&mut self);
}

/// Shift one row of one bit-plane out to the panel and enable output.
///
/// Output is blanked while the shift register and address lines change so
/// stale data never ghosts onto the wrong row. Columns go out in reverse
/// order because the panels are daisy-chained last-column-first. The caller
/// holds output enabled for this plane's dwell, then blanks again (the next
/// `emit_row` call's leading blank serves when scanning continuously).
pub fn emit_row<P: PanelIo>(planes: &BitPlanes, bit: usize, row: usize, panel: &mut P) {
    panel.set_output_enabled(false);

    let line = &planes[row][bit];
    for x in (0..WIDTH).rev() {
        panel.shift_column(line[x]);
    }

    panel.set_row_address(row as u8);
    panel.pulse_latch();
    panel.set_output_enabled(true);
}

/// Position within one refresh pass: all rows of bit-plane 0, then all rows
/// of bit-plane 1, and so on.
pub struct ScanCursor {
    bit: usize,
    row: usize,
}

impl ScanCursor {
    pub const fn new() -> Self {
        Self { bit: 0, row: 0 }
    }

    pub fn bit(&self) -> usize {
        self.bit
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// True at the boundary between refresh passes; the only place the
    /// scan-out side may pick up a new frame.
    pub fn at_pass_start(&self) -> bool {
        self.bit == 0 && self.row == 0
    }

    /// Dwell for the current step in base units: `2^bit`.
    pub fn dwell_units(&self) -> u32 {
        1 << self.bit
    }

    pub fn advance(&mut self) {
        self.row += 1;
        if self.row == SCAN_ROWS {
            self.row = 0;
            self.bit += 1;
            if self.bit == COLOR_DEPTH {
                self.bit = 0;
            }
        }
    }
}

impl Default for ScanCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;
    use std::vec::Vec;

    fn planes() -> Box<BitPlanes> {
        Box::new([[[0; WIDTH]; COLOR_DEPTH]; SCAN_ROWS])
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Enable(bool),
        Shift(u8),
        Address(u8),
        Latch,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl PanelIo for Recorder {
        fn set_output_enabled(&mut self, enabled: bool) {
            self.events.push(Event::Enable(enabled));
        }
        fn shift_column(&mut self, packed: u8) {
            self.events.push(Event::Shift(packed));
        }
        fn set_row_address(&mut self, row: u8) {
            self.events.push(Event::Address(row));
        }
        fn pulse_latch(&mut self) {
            self.events.push(Event::Latch);
        }
    }

    /// Bit-bang rendition of the shift path: records the level of each data
    /// line at every clock edge instead of consuming packed bytes.
    #[derive(Default)]
    struct LineToggler {
        data_lines: [bool; 6],
        clocked: Vec<[bool; 6]>,
    }

    impl LineToggler {
        fn shift(&mut self, packed: u8) {
            for (i, line) in self.data_lines.iter_mut().enumerate() {
                *line = packed & (1 << i) != 0;
            }
            self.clocked.push(self.data_lines);
        }
    }

    #[test]
    fn row_sequence_blanks_shifts_addresses_latches_enables() {
        let mut p = planes();
        for x in 0..WIDTH {
            p[4][2][x] = x as u8;
        }
        let mut rec = Recorder::default();
        emit_row(&p, 2, 4, &mut rec);

        assert_eq!(rec.events.len(), WIDTH + 4);
        assert_eq!(rec.events[0], Event::Enable(false));
        for (i, x) in (0..WIDTH).rev().enumerate() {
            assert_eq!(rec.events[1 + i], Event::Shift(x as u8), "column {x}");
        }
        assert_eq!(rec.events[WIDTH + 1], Event::Address(4));
        assert_eq!(rec.events[WIDTH + 2], Event::Latch);
        assert_eq!(rec.events[WIDTH + 3], Event::Enable(true));
    }

    #[test]
    fn byte_shifter_and_line_toggler_agree() {
        let mut p = planes();
        for x in 0..WIDTH {
            p[0][0][x] = (x as u8).wrapping_mul(37) & 0x3F;
        }

        let mut rec = Recorder::default();
        emit_row(&p, 0, 0, &mut rec);
        let shifted: Vec<u8> = rec
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Shift(b) => Some(*b),
                _ => None,
            })
            .collect();

        let mut toggler = LineToggler::default();
        for &b in &shifted {
            toggler.shift(b);
        }

        assert_eq!(toggler.clocked.len(), shifted.len());
        for (levels, packed) in toggler.clocked.iter().zip(&shifted) {
            for (i, &level) in levels.iter().enumerate() {
                assert_eq!(level, packed & (1 << i) != 0);
            }
        }
    }

    #[test]
    fn cursor_walks_rows_within_bits_and_wraps() {
        let mut cursor = ScanCursor::new();
        assert!(cursor.at_pass_start());

        let mut steps = 0;
        loop {
            assert_eq!(cursor.bit(), steps / SCAN_ROWS);
            assert_eq!(cursor.row(), steps % SCAN_ROWS);
            cursor.advance();
            steps += 1;
            if cursor.at_pass_start() {
                break;
            }
        }
        assert_eq!(steps, COLOR_DEPTH * SCAN_ROWS);
    }

    #[test]
    fn dwell_doubles_per_bit_plane() {
        let mut cursor = ScanCursor::new();
        for bit in 0..COLOR_DEPTH {
            for _ in 0..SCAN_ROWS {
                assert_eq!(cursor.dwell_units(), 1 << bit);
                cursor.advance();
            }
        }
    }

    /// Total enabled time for a stored channel value is the sum of the
    /// dwells of its set bits, i.e. the value itself in base units.
    #[test]
    fn brightness_is_monotonic_in_stored_value() {
        let mut previous = 0u32;
        for value in 0u8..64 {
            let mut p = planes();
            for bit in 0..COLOR_DEPTH {
                if value & (1 << bit) != 0 {
                    p[0][bit][0] = 0x01;
                }
            }

            let mut cursor = ScanCursor::new();
            let mut total = 0u32;
            for _ in 0..COLOR_DEPTH * SCAN_ROWS {
                if p[cursor.row()][cursor.bit()][0] & 0x01 != 0 {
                    total += cursor.dwell_units();
                }
                cursor.advance();
            }

            assert_eq!(total, u32::from(value));
            assert!(total >= previous);
            previous = total;
        }
        assert_eq!(previous, (1 << COLOR_DEPTH) - 1);
    }
}
