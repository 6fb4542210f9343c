//! Double-buffered frame handoff between the receive and scan-out contexts.

use crate::{FrameBytes, FRAME_BYTES};

/// Two frame slots with single-writer-per-field ownership.
///
/// The receive side owns `write_slot` and the slot contents it targets; the
/// scan-out side owns `read_slot`. `store` only ever touches the slot the
/// reader is not pointed at, so the reader can never observe a torn frame,
/// and `take_fresh` is only called between full refresh passes, so planes
/// regenerated from the claimed slot never race the scan loop.
///
/// On the device the whole exchange lives behind a critical section; this
/// type just keeps the swap protocol in one place.
pub struct FrameExchange {
    slots: [FrameBytes; 2],
    read_slot: usize,
    write_slot: usize,
    fresh: bool,
}

impl FrameExchange {
    pub const fn new() -> Self {
        Self {
            slots: [[0; FRAME_BYTES]; 2],
            read_slot: 0,
            write_slot: 0,
            fresh: false,
        }
    }

    /// Receive side: publish a completed frame.
    ///
    /// Writes into the slot the reader is not using; an unclaimed earlier
    /// frame is simply superseded.
    pub fn store(&mut self, frame: &FrameBytes) {
        let target = self.read_slot ^ 1;
        self.slots[target].copy_from_slice(frame);
        self.write_slot = target;
        self.fresh = true;
    }

    /// Scan-out side: claim the latest published frame, if any.
    ///
    /// Clears the ready flag and moves the read pointer to the published
    /// slot. Must only be called between refresh passes.
    pub fn take_fresh(&mut self) -> Option<&FrameBytes> {
        if !self.fresh {
            return None;
        }
        self.fresh = false;
        self.read_slot = self.write_slot;
        Some(&self.slots[self.read_slot])
    }

    /// The frame the scan-out side last claimed.
    #[cfg(test)]
    fn current(&self) -> &FrameBytes {
        &self.slots[self.read_slot]
    }
}

impl Default for FrameExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;

    fn filled(value: u8) -> Box<FrameBytes> {
        Box::new([value; FRAME_BYTES])
    }

    #[test]
    fn nothing_fresh_until_store() {
        let mut ex = Box::new(FrameExchange::new());
        assert!(ex.take_fresh().is_none());
        ex.store(&filled(1));
        assert_eq!(ex.take_fresh().unwrap()[0], 1);
        // Claim is one-shot.
        assert!(ex.take_fresh().is_none());
        assert_eq!(ex.current()[0], 1);
    }

    #[test]
    fn store_never_touches_the_read_slot() {
        let mut ex = Box::new(FrameExchange::new());
        ex.store(&filled(1));
        assert_eq!(ex.take_fresh().unwrap()[0], 1);

        // While the reader sits on frame 1, publishing frame 2 must leave
        // the current frame intact until it is claimed.
        ex.store(&filled(2));
        assert_eq!(ex.current()[0], 1);
        assert_eq!(ex.take_fresh().unwrap()[0], 2);
    }

    #[test]
    fn unclaimed_frames_are_superseded() {
        let mut ex = Box::new(FrameExchange::new());
        ex.store(&filled(1));
        assert_eq!(ex.take_fresh().unwrap()[0], 1);
        ex.store(&filled(2));
        ex.store(&filled(3));
        // Only the newest publication is ever seen.
        assert_eq!(ex.take_fresh().unwrap()[0], 3);
    }
}
