#![no_std]
#![no_main]

use esp_backtrace as _;
use esp_hal::entry;
use glimmer_util::{Ack, FrameDecoder};

mod driver;

/// Upper bound on bytes drained per wakeup so acknowledgement writes stay
/// interleaved with reception during long bursts.
const RX_BUDGET: usize = 512;

#[entry]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    log::info!("panel link up, waiting for frames");

    let mut link = driver::init();
    // Reception state lives on this loop's stack; the scan interrupt never
    // touches it, so decoding runs with interrupts live.
    let mut decoder = FrameDecoder::new();

    loop {
        let mut budget = RX_BUDGET;
        while budget > 0 {
            let byte = match link.read_byte() {
                Ok(byte) => byte,
                Err(_) => break,
            };
            budget -= 1;

            if let Some(ack) = driver::feed(&mut decoder, byte) {
                if ack == Ack::Rejected {
                    log::warn!("frame rejected");
                }
                let _ = link.write_bytes(&[ack.as_byte()]);
            }
        }
    }
}
