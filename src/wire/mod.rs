//! Bit-level wire protocols.
//!
//! Each legacy keyboard family speaks an asynchronous clocked serial
//! protocol over two lines, CLOCK and DATA. The decoders in the submodules
//! are pure edge-fed state machines: the real-time context (a pin-change
//! interrupt or a hardware state machine) samples the lines on clock edges
//! and feeds the samples in; the decoder hands back complete frame bytes or
//! wire errors. Keeping the state machines free of pin and timer types is
//! what lets the whole protocol layer run under the host test harness.
//!
//! The `bus` types at the bottom of each submodule bind a state machine to
//! a pair of `embedded-hal` pins and a ring-buffer producer. Lines are
//! driven open-drain: `set_low` pulls the line, `set_high` releases it to
//! the pull-up.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::v2::{InputPin, OutputPin};

pub mod amiga;
pub mod at_ps2;
pub mod m0110;
pub mod xt;

/// The wire protocol a keyboard speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    /// IBM PC/XT: 9-bit unidirectional frames.
    Xt,
    /// IBM PC/AT and PS/2: 11-bit bidirectional frames with odd parity.
    AtPs2,
    /// Commodore Amiga: 8-bit frames with a DATA-line handshake.
    Amiga,
    /// Apple M0110/M0110A: host-polled command/response bytes.
    M0110,
}

/// Recoverable wire-level failures. Any of these resets the scancode
/// decoder at the next byte boundary; none of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Start or stop bit had the wrong level.
    Framing,
    /// Odd-parity check failed; the byte was dropped.
    Parity,
    /// A handshake (host ACK, device ACK, or poll response) did not
    /// complete in time.
    HandshakeTimeout,
}

/// Sticky error flags crossing from the real-time producer to the main
/// loop. The producer latches, the consumer takes-and-clears. Mirrors the
/// overrun flag on the ring buffer itself.
pub struct WireFlags {
    framing: AtomicBool,
    parity: AtomicBool,
    timeout: AtomicBool,
}

impl WireFlags {
    pub const fn new() -> Self {
        WireFlags {
            framing: AtomicBool::new(false),
            parity: AtomicBool::new(false),
            timeout: AtomicBool::new(false),
        }
    }

    pub fn latch(&self, err: WireError) {
        let flag = match err {
            WireError::Framing => &self.framing,
            WireError::Parity => &self.parity,
            WireError::HandshakeTimeout => &self.timeout,
        };
        flag.store(true, Ordering::Release);
    }

    /// Take the highest-priority latched error, clearing it.
    pub fn take(&self) -> Option<WireError> {
        if self.parity.swap(false, Ordering::AcqRel) {
            Some(WireError::Parity)
        } else if self.framing.swap(false, Ordering::AcqRel) {
            Some(WireError::Framing)
        } else if self.timeout.swap(false, Ordering::AcqRel) {
            Some(WireError::HandshakeTimeout)
        } else {
            None
        }
    }
}

/// A CLOCK/DATA pin pair with open-drain discipline.
///
/// The Amiga wiring constraint (DATA on pin `d`, CLOCK on `d + 1`) is a
/// board-level concern; by the time pins arrive here they are just two
/// GPIOs.
pub struct Lines<C, D> {
    pub clock: C,
    pub data: D,
}

impl<C, D> Lines<C, D>
where
    C: InputPin + OutputPin,
    D: InputPin + OutputPin,
{
    pub fn new(clock: C, data: D) -> Self {
        Lines { clock, data }
    }

    /// Sample DATA. A pin read error is indistinguishable from a glitch,
    /// so it reads as low and the frame check catches it.
    pub fn data_high(&self) -> bool {
        matches!(self.data.is_high(), Ok(true))
    }

    pub fn clock_high(&self) -> bool {
        matches!(self.clock.is_high(), Ok(true))
    }

    pub fn drive_data_low(&mut self) {
        let _ = self.data.set_low();
    }

    pub fn release_data(&mut self) {
        let _ = self.data.set_high();
    }

    pub fn drive_clock_low(&mut self) {
        let _ = self.clock.set_low();
    }

    pub fn release_clock(&mut self) {
        let _ = self.clock.set_high();
    }
}
