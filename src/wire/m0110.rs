//! Apple M0110 / M0110A keyboard link.
//!
//! Unlike the other protocols this one is host-polled: the converter
//! clocks every bit itself with ~180 us CLOCK low pulses, sends a one-byte
//! command, and reads a one-byte response, MSB first.
//!
//! ```text
//! host:  cmd bit 7 .. cmd bit 0          (DATA driven by host)
//! dev:   resp bit 7 .. resp bit 0        (DATA driven by keyboard)
//! ```
//!
//! Between command and response the keyboard signals readiness by pulling
//! DATA low. An Inquiry that stays quiet for 250 ms produces the 0x7B
//! "null" response; the keyboard itself does the same on real hardware, so
//! synthesizing it on timeout keeps the byte stream identical either way.

use super::{Lines, WireError, WireFlags};
use crate::ring::Producer;
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Poll for a key transition; the keyboard answers within 250 ms or not
/// at all.
pub const CMD_INQUIRY: u8 = 0x10;
/// Like Inquiry but answers immediately (0x7B when no event is pending).
pub const CMD_INSTANT: u8 = 0x14;
/// Ask which keyboard model is attached.
pub const CMD_MODEL: u8 = 0x16;
/// Keyboard self test; answers ACK (0x7D) or NAK (0x77).
pub const CMD_TEST: u8 = 0x36;

/// "No key event" response byte.
pub const RESP_NULL: u8 = 0x7B;
/// Self-test passed.
pub const RESP_TEST_ACK: u8 = 0x7D;
/// Self-test failed.
pub const RESP_TEST_NAK: u8 = 0x77;

/// CLOCK low half-period.
pub const CLK_LOW_US: u32 = 180;
/// CLOCK high half-period.
pub const CLK_HIGH_US: u32 = 80;
/// How long to wait for the keyboard to start its response.
pub const RESPONSE_TIMEOUT_US: u32 = 250_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitPhase {
    Low { until_us: u32 },
    High { until_us: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Idle,
    Cmd { cmd: u8, bit: u8, phase: BitPhase },
    AwaitResponse { cmd: u8, deadline_us: u32 },
    Resp { raw: u8, bit: u8, phase: BitPhase },
}

fn elapsed(now_us: u32, at_us: u32) -> bool {
    now_us.wrapping_sub(at_us) < u32::MAX / 2
}

/// An M0110 channel. Fully host-driven: everything happens in [`Bus::poll`],
/// there is no edge interrupt.
pub struct Bus<'a, C, D, const N: usize> {
    lines: Lines<C, D>,
    state: LinkState,
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
        Bus { lines, state: LinkState::Idle, queue, flags }
    }

    pub fn is_idle(&self) -> bool {
        self.state == LinkState::Idle
    }

    /// Start a command transaction; refused while one is in flight.
    pub fn send_command(&mut self, cmd: u8, now_us: u32) -> nb::Result<(), core::convert::Infallible> {
        if self.state != LinkState::Idle {
            return Err(nb::Error::WouldBlock);
        }
        self.lines.release_data();
        self.state = LinkState::Cmd { cmd, bit: 0, phase: BitPhase::High { until_us: now_us } };
        Ok(())
    }

    /// Advance the transaction. Completed responses land in the ring
    /// buffer like any other protocol's frame bytes.
    pub fn poll(&mut self, now_us: u32) {
        self.state = match self.state {
            LinkState::Idle => LinkState::Idle,
            LinkState::Cmd { cmd, bit, phase } => match phase {
                BitPhase::High { until_us } if elapsed(now_us, until_us) => {
                    if bit == 8 {
                        // Command done; hand DATA to the keyboard.
                        self.lines.release_data();
                        LinkState::AwaitResponse {
                            cmd,
                            deadline_us: now_us.wrapping_add(RESPONSE_TIMEOUT_US),
                        }
                    } else {
                        // Present the next bit, MSB first, then pull the
                        // clock low so the keyboard latches it.
                        if (cmd >> (7 - bit)) & 1 != 0 {
                            self.lines.release_data();
                        } else {
                            self.lines.drive_data_low();
                        }
                        self.lines.drive_clock_low();
                        LinkState::Cmd {
                            cmd,
                            bit,
                            phase: BitPhase::Low { until_us: now_us.wrapping_add(CLK_LOW_US) },
                        }
                    }
                }
                BitPhase::Low { until_us } if elapsed(now_us, until_us) => {
                    self.lines.release_clock();
                    LinkState::Cmd {
                        cmd,
                        bit: bit + 1,
                        phase: BitPhase::High { until_us: now_us.wrapping_add(CLK_HIGH_US) },
                    }
                }
                _ => LinkState::Cmd { cmd, bit, phase },
            },
            LinkState::AwaitResponse { cmd, deadline_us } => {
                if !self.lines.data_high() {
                    LinkState::Resp { raw: 0, bit: 0, phase: BitPhase::High { until_us: now_us } }
                } else if elapsed(now_us, deadline_us) {
                    match cmd {
                        CMD_INQUIRY | CMD_INSTANT => {
                            // Keyboard had nothing to say; same byte it
                            // would have sent.
                            let _ = self.queue.push(RESP_NULL);
                        }
                        _ => self.flags.latch(WireError::HandshakeTimeout),
                    }
                    LinkState::Idle
                } else {
                    LinkState::AwaitResponse { cmd, deadline_us }
                }
            }
            LinkState::Resp { raw, bit, phase } => match phase {
                BitPhase::High { until_us } if elapsed(now_us, until_us) => {
                    if bit == 8 {
                        let _ = self.queue.push(raw);
                        LinkState::Idle
                    } else {
                        self.lines.drive_clock_low();
                        LinkState::Resp {
                            raw,
                            bit,
                            phase: BitPhase::Low { until_us: now_us.wrapping_add(CLK_LOW_US) },
                        }
                    }
                }
                BitPhase::Low { until_us } if elapsed(now_us, until_us) => {
                    // Sample at the end of the low pulse, MSB first.
                    let raw = (raw << 1) | self.lines.data_high() as u8;
                    self.lines.release_clock();
                    LinkState::Resp {
                        raw,
                        bit: bit + 1,
                        phase: BitPhase::High { until_us: now_us.wrapping_add(CLK_HIGH_US) },
                    }
                }
                _ => LinkState::Resp { raw, bit, phase },
            },
        };
    }
}
