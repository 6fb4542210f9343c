//! ESP32-S3 side of the panel driver: GPIO drive lines, the dwell timer,
//! and the two execution contexts.
//!
//! The main loop (reception) and the timer interrupt (scan-out) share state
//! only through the critical-section statics below. Each interrupt emits one
//! `(bit-plane, row)` step and re-arms the timer with that plane's dwell, so
//! scan timing never waits on reception; new frames are adopted exclusively
//! on refresh-pass boundaries.
//!
//! Wiring:
//!   GPIO1-6:   R0, G0, B0, R1, G1, B1 (column data)
//!   GPIO7:     CLK
//!   GPIO8:     LAT
//!   GPIO9:     OE (active low)
//!   GPIO10-13: A, B, C, D (row address)

use core::cell::RefCell;
use critical_section::Mutex;
use esp_hal::{
    clock::ClockControl,
    gpio::{GpioPin, Io, Level, Output},
    interrupt::{self, Priority},
    peripherals::{Interrupt, Peripherals, TIMG0},
    prelude::*,
    system::SystemControl,
    timer::timg::{Timer, Timer0, TimerGroup},
    usb_serial_jtag::UsbSerialJtag,
    Blocking,
};
use glimmer_util::{
    convert_frame, emit_row, Ack, BitPlanes, FrameDecoder, FrameExchange, PanelIo, ScanCursor,
    COLOR_DEPTH, SCAN_ROWS, WIDTH,
};

/// Dwell of the least significant bit-plane. Bit-plane `b` holds output
/// enabled for `BASE_DWELL_US << b` microseconds.
const BASE_DWELL_US: u64 = 4;

static TIMER0: Mutex<RefCell<Option<Timer<Timer0<TIMG0>, esp_hal::Blocking>>>> =
    Mutex::new(RefCell::new(None));
static PANEL: Mutex<RefCell<Option<Panel>>> = Mutex::new(RefCell::new(None));

static EXCHANGE: Mutex<RefCell<FrameExchange>> = Mutex::new(RefCell::new(FrameExchange::new()));
static PLANES: Mutex<RefCell<BitPlanes>> =
    Mutex::new(RefCell::new([[[0; WIDTH]; COLOR_DEPTH]; SCAN_ROWS]));
static CURSOR: Mutex<RefCell<ScanCursor>> = Mutex::new(RefCell::new(ScanCursor::new()));

struct Panel {
    r0: Output<'static, GpioPin<1>>,
    g0: Output<'static, GpioPin<2>>,
    b0: Output<'static, GpioPin<3>>,
    r1: Output<'static, GpioPin<4>>,
    g1: Output<'static, GpioPin<5>>,
    b1: Output<'static, GpioPin<6>>,
    clk: Output<'static, GpioPin<7>>,
    lat: Output<'static, GpioPin<8>>,
    oe: Output<'static, GpioPin<9>>,
    addr_a: Output<'static, GpioPin<10>>,
    addr_b: Output<'static, GpioPin<11>>,
    addr_c: Output<'static, GpioPin<12>>,
    addr_d: Output<'static, GpioPin<13>>,
}

fn level(bit: bool) -> Level {
    if bit {
        Level::High
    } else {
        Level::Low
    }
}

impl PanelIo for Panel {
    fn set_output_enabled(&mut self, enabled: bool) {
        // OE is active low.
        if enabled {
            self.oe.set_low();
        } else {
            self.oe.set_high();
        }
    }

    fn shift_column(&mut self, packed: u8) {
        self.r0.set_level(level(packed & 0x01 != 0));
        self.g0.set_level(level(packed & 0x02 != 0));
        self.b0.set_level(level(packed & 0x04 != 0));
        self.r1.set_level(level(packed & 0x08 != 0));
        self.g1.set_level(level(packed & 0x10 != 0));
        self.b1.set_level(level(packed & 0x20 != 0));
        self.clk.set_high();
        self.clk.set_low();
    }

    fn set_row_address(&mut self, row: u8) {
        self.addr_a.set_level(level(row & 0x01 != 0));
        self.addr_b.set_level(level(row & 0x02 != 0));
        self.addr_c.set_level(level(row & 0x04 != 0));
        self.addr_d.set_level(level(row & 0x08 != 0));
    }

    fn pulse_latch(&mut self) {
        self.lat.set_high();
        self.lat.set_low();
    }
}

/// Bring up pins, the dwell timer, and the serial link. Scan-out starts
/// immediately on the zeroed (black) planes.
pub fn init() -> UsbSerialJtag<'static, Blocking> {
    let peripherals = Peripherals::take();
    let system = SystemControl::new(peripherals.SYSTEM);
    let clocks = ClockControl::max(system.clock_control).freeze();

    let io = Io::new(peripherals.GPIO, peripherals.IO_MUX);
    let panel = Panel {
        r0: Output::new(io.pins.gpio1, Level::Low),
        g0: Output::new(io.pins.gpio2, Level::Low),
        b0: Output::new(io.pins.gpio3, Level::Low),
        r1: Output::new(io.pins.gpio4, Level::Low),
        g1: Output::new(io.pins.gpio5, Level::Low),
        b1: Output::new(io.pins.gpio6, Level::Low),
        clk: Output::new(io.pins.gpio7, Level::Low),
        lat: Output::new(io.pins.gpio8, Level::Low),
        // Blanked until the first row goes out.
        oe: Output::new(io.pins.gpio9, Level::High),
        addr_a: Output::new(io.pins.gpio10, Level::Low),
        addr_b: Output::new(io.pins.gpio11, Level::Low),
        addr_c: Output::new(io.pins.gpio12, Level::Low),
        addr_d: Output::new(io.pins.gpio13, Level::Low),
    };

    let timg0 = TimerGroup::new(peripherals.TIMG0, &clocks);
    let timer0 = timg0.timer0;
    timer0.set_interrupt_handler(scan_interrupt);

    interrupt::enable(Interrupt::TG0_T0_LEVEL, Priority::Priority1).unwrap();
    timer0.load_value(BASE_DWELL_US.micros()).unwrap();
    timer0.start();
    timer0.listen();

    critical_section::with(|cs| {
        PANEL.borrow_ref_mut(cs).replace(panel);
        TIMER0.borrow_ref_mut(cs).replace(timer0);
    });

    UsbSerialJtag::new(peripherals.USB_DEVICE)
}

/// Feed one received byte through the frame decoder.
///
/// Returns the acknowledgement to send when the byte completed a packet.
/// Accepted frames are published to the scan-out side before this returns,
/// so the ack never races the display update. The decoder is owned by the
/// receive loop; only the publication of a finished frame masks the scan
/// interrupt, never the decode work itself.
pub fn feed(decoder: &mut FrameDecoder, byte: u8) -> Option<Ack> {
    let ack = decoder.push(byte)?;
    if ack == Ack::Accepted {
        critical_section::with(|cs| {
            EXCHANGE.borrow_ref_mut(cs).store(decoder.frame());
        });
    }
    Some(ack)
}

#[handler]
fn scan_interrupt() {
    critical_section::with(|cs| {
        let mut cursor = CURSOR.borrow_ref_mut(cs);
        let mut planes = PLANES.borrow_ref_mut(cs);

        // Frames are only adopted on the pass boundary so the scan never
        // walks half-regenerated planes.
        if cursor.at_pass_start() {
            let mut exchange = EXCHANGE.borrow_ref_mut(cs);
            if let Some(frame) = exchange.take_fresh() {
                convert_frame(frame, &mut planes);
            }
        }

        let mut panel = PANEL.borrow_ref_mut(cs);
        let panel = panel.as_mut().unwrap();
        emit_row(&planes, cursor.bit(), cursor.row(), panel);

        // Output stays enabled until the next interrupt blanks it; the
        // reload below is the BCM dwell for the row just latched.
        let dwell = BASE_DWELL_US << cursor.bit();
        let mut timer0 = TIMER0.borrow_ref_mut(cs);
        let timer0 = timer0.as_mut().unwrap();
        timer0.clear_interrupt();
        timer0.load_value(dwell.micros()).unwrap();
        timer0.start();

        cursor.advance();
    });
}
