//! IBM PC/XT frames.
//!
//! Nine bits, device to host only, sampled on falling CLOCK edges:
//!
//! ```text
//! bit   0      1..8
//!     start   data LSB..MSB
//!      (1)
//! ```
//!
//! No parity, no stop bit, no host-to-device path at all: the XT keyboard
//! cannot even have its LEDs set. The start bit is a high level, which is
//! how the decoder tells a frame boundary from line noise.

use super::{Lines, WireError, WireFlags};
use crate::ring::Producer;
use embedded_hal::digital::v2::{InputPin, OutputPin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    Data { byte: u8, count: u8 },
}

/// XT frame assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receiver {
    state: RxState,
}

impl Receiver {
    pub const fn new() -> Self {
        Receiver { state: RxState::Idle }
    }

    pub fn reset(&mut self) {
        self.state = RxState::Idle;
    }

    /// Feed the DATA level sampled at a falling CLOCK edge.
    pub fn clock_falling(&mut self, data: bool) -> Option<Result<u8, WireError>> {
        let (next, out) = match self.state {
            RxState::Idle => {
                if data {
                    (RxState::Data { byte: 0, count: 0 }, None)
                } else {
                    // A low level where the start bit belongs; stay put so
                    // the next high edge can start a frame.
                    (RxState::Idle, Some(Err(WireError::Framing)))
                }
            }
            RxState::Data { byte, count } => {
                let byte = byte | ((data as u8) << count);
                if count == 7 {
                    (RxState::Idle, Some(Ok(byte)))
                } else {
                    (RxState::Data { byte, count: count + 1 }, None)
                }
            }
        };
        self.state = next;
        out
    }
}

/// An XT channel. Receive-only; `poll` exists for interface parity with
/// the other buses and does nothing.
pub struct Bus<'a, C, D, const N: usize> {
    lines: Lines<C, D>,
    rx: Receiver,
    queue: Producer<'a, N>,
    flags: &'a WireFlags,
}

impl<'a, C, D, const N: usize> Bus<'a, C, D, N>
where
    C: InputPin + OutputPin,
    D: InputPin + OutputPin,
{
    pub fn new(mut lines: Lines<C, D>, queue: Producer<'a, N>, flags: &'a WireFlags) -> Self {
        lines.release_clock();
        lines.release_data();
        Bus { lines, rx: Receiver::new(), queue, flags }
    }

    pub fn on_clock_falling(&mut self, _now_us: u32) {
        match self.rx.clock_falling(self.lines.data_high()) {
            None => {}
            Some(Ok(byte)) => {
                let _ = self.queue.push(byte);
            }
            Some(Err(e)) => self.flags.latch(e),
        }
    }

    pub fn poll(&mut self, _now_us: u32) {}
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    fn feed_frame(rx: &mut Receiver, byte: u8) -> Option<Result<u8, WireError>> {
        let mut out = rx.clock_falling(true);
        for i in 0..8 {
            out = out.or(rx.clock_falling((byte >> i) & 1 != 0));
        }
        out
    }

    #[test]
    fn frames_bytes_back_to_back() {
        let mut rx = Receiver::new();
        assert_eq!(feed_frame(&mut rx, 0x1E), Some(Ok(0x1E)));
        assert_eq!(feed_frame(&mut rx, 0x9E), Some(Ok(0x9E)));
        assert_eq!(feed_frame(&mut rx, 0xE0), Some(Ok(0xE0)));
    }

    #[test]
    fn low_start_bit_is_framing_noise() {
        let mut rx = Receiver::new();
        assert_eq!(rx.clock_falling(false), Some(Err(WireError::Framing)));
        // Recovers on the next real frame.
        assert_eq!(feed_frame(&mut rx, 0x01), Some(Ok(0x01)));
    }
}
