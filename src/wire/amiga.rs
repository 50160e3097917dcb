//! Commodore Amiga keyboard frames.
//!
//! Eight bits, device to host, sampled on falling CLOCK edges, MSB first.
//! The keyboard transmits the code rotated left by one (the up/down flag
//! arrives last) and active-low, so the raw shift register needs
//! normalizing before it means anything:
//!
//! ```text
//! wire order:  c6 c5 c4 c3 c2 c1 c0 c7   (each inverted)
//! normalized:  (!raw).rotate_right(1)
//! ```
//!
//! After the eighth bit the host must pulse DATA low for at least
//! [`ACK_PULSE_US`] to acknowledge. A keyboard that sees no ACK within
//! ~143 ms assumes it lost sync, clocks out single 1-bits until one is
//! acknowledged, retransmits the lost code, and then sends the 0xF9 "sync
//! lost" marker, which the scancode layer treats as a resync control code.

use super::Lines;
use crate::ring::Producer;
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Minimum host ACK pulse width on DATA.
pub const ACK_PULSE_US: u32 = 85;

/// Keyboard-side handshake timeout; after this the keyboard starts its
/// lost-sync recovery. The host decoder only needs it for documentation
/// and tests.
pub const KEYBOARD_RESYNC_MS: u32 = 143;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Data { raw: u8, count: u8 },
}

/// Amiga frame assembler. Unlike AT/PS2 there is no start bit; every
/// falling edge carries a data bit, and framing is maintained purely by
/// the ACK handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receiver {
    state: RxState,
}

impl Receiver {
    pub const fn new() -> Self {
        Receiver { state: RxState::Data { raw: 0, count: 0 } }
    }

    pub fn reset(&mut self) {
        self.state = RxState::Data { raw: 0, count: 0 };
    }

    /// Feed the DATA level sampled at a falling CLOCK edge. A completed
    /// byte still needs the ACK pulse issued by the bus.
    pub fn clock_falling(&mut self, data: bool) -> Option<u8> {
        let RxState::Data { raw, count } = self.state;
        // Active low on the wire; collect MSB first.
        let raw = (raw << 1) | (!data as u8);
        if count == 7 {
            self.state = RxState::Data { raw: 0, count: 0 };
            // Un-invert is already done per bit; un-rotate so the up/down
            // flag lands back in bit 7.
            Some(raw.rotate_right(1))
        } else {
            self.state = RxState::Data { raw, count: count + 1 };
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckState {
    Idle,
    /// Holding DATA low until `release_at_us`.
    Pulsing { release_at_us: u32 },
}

/// An Amiga channel: receive plus the DATA-line ACK pulse.
pub struct Bus<'a, C, D, const N: usize> {
    lines: Lines<C, D>,
    rx: Receiver,
    ack: AckState,
    queue: Producer<'a, N>,
}

impl<'a, C, D, const N: usize> Bus<'a, C, D, N>
where
    C: InputPin + OutputPin,
    D: InputPin + OutputPin,
{
    pub fn new(mut lines: Lines<C, D>, queue: Producer<'a, N>) -> Self {
        lines.release_clock();
        lines.release_data();
        Bus { lines, rx: Receiver::new(), ack: AckState::Idle, queue }
    }

    pub fn on_clock_falling(&mut self, now_us: u32) {
        if let Some(byte) = self.rx.clock_falling(self.lines.data_high()) {
            let _ = self.queue.push(byte);
            // Start the handshake immediately; the keyboard waits for it
            // before clocking the next code.
            self.lines.drive_data_low();
            self.ack = AckState::Pulsing { release_at_us: now_us.wrapping_add(ACK_PULSE_US) };
        }
    }

    pub fn poll(&mut self, now_us: u32) {
        if let AckState::Pulsing { release_at_us } = self.ack {
            if now_us.wrapping_sub(release_at_us) < u32::MAX / 2 {
                self.lines.release_data();
                self.ack = AckState::Idle;
            }
        }
    }
}

/// Invert the normalization, for tests and for documentation: what the
/// keyboard actually shifts out for `code`.
#[cfg(test)]
fn wire_encode(code: u8) -> u8 {
    !(code.rotate_left(1))
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    fn feed_frame(rx: &mut Receiver, code: u8) -> Option<u8> {
        let raw = wire_encode(code);
        let mut out = None;
        for i in (0..8).rev() {
            out = out.or(rx.clock_falling((raw >> i) & 1 != 0));
        }
        out
    }

    #[test]
    fn normalizes_rotation_and_inversion() {
        let mut rx = Receiver::new();
        // 0x20 is the Amiga 'A' position; with the release flag it is
        // 0xA0. Both must survive the wire transform.
        assert_eq!(feed_frame(&mut rx, 0x20), Some(0x20));
        assert_eq!(feed_frame(&mut rx, 0xA0), Some(0xA0));
        assert_eq!(feed_frame(&mut rx, 0xF9), Some(0xF9));
    }

    #[test]
    fn wire_transform_is_involutive() {
        let mut rx = Receiver::new();
        for code in 0..=255u8 {
            assert_eq!(feed_frame(&mut rx, code), Some(code));
        }
    }
}
