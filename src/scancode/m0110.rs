//! Apple M0110 / M0110A scancodes.
//!
//! A response byte is `r k k k k k k 1`: bit 7 set means released, bits
//! 6..1 are the key code, bit 0 is always one. `0x7B` is the "nothing
//! happened" answer to an Inquiry and carries no key.
//!
//! The M0110A pushes its keypad and arrow cluster through prefix
//! sequences: `0x79, byte` for the plain keypad/arrows, and
//! `0x71, 0x79, byte` for the keypad operator legends that the hardware
//! fakes as shifted arrows. Two lookup tables fold both planes into
//! `0x01..=0x3F`; plain codes live at `code | 0x40`, so the planes can
//! never collide and raw code 0 stays clear of the "no key" value.

use super::{KeyEvent, Step};
use crate::log::log_debug;
use crate::wire::m0110::RESP_NULL;

/// Plain-plane interface code.
fn base_code(code: u8) -> u8 {
    code | 0x40
}

/// `0x79`-prefixed plane: the M0110A keypad and arrows.
#[rustfmt::skip]
static KEYPAD_MAP: [u8; 64] = {
    let mut t = [0u8; 64];
    t[0x01] = 0x2A; // clear
    t[0x02] = 0x29; // keypad .
    t[0x0C] = 0x28; // keypad enter
    t[0x0D] = 0x10; // left
    t[0x0E] = 0x11; // right
    t[0x0F] = 0x13; // up
    t[0x10] = 0x12; // down
    t[0x19] = 0x20; // keypad 0
    t[0x1A] = 0x21; // keypad 1
    t[0x1B] = 0x22; // keypad 2
    t[0x1C] = 0x23; // keypad 3
    t[0x1D] = 0x24; // keypad 4
    t[0x1E] = 0x25; // keypad 5
    t[0x1F] = 0x26; // keypad 6
    t[0x20] = 0x27; // keypad 7
    t[0x21] = 0x2C; // keypad 8
    t[0x22] = 0x2D; // keypad 9
    t
};

/// `0x71 0x79`-prefixed plane: operator keys the keyboard encodes as
/// shift + arrow.
#[rustfmt::skip]
static SHIFTED_KEYPAD_MAP: [u8; 64] = {
    let mut t = [0u8; 64];
    t[0x0D] = 0x2E; // keypad = (shift left)
    t[0x0E] = 0x2F; // keypad * (shift right)
    t[0x0F] = 0x30; // keypad + (shift up)
    t[0x10] = 0x31; // keypad / (shift down)
    t
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    /// Saw `0x79`.
    Keypad,
    /// Saw `0x71`, waiting for the `0x79` that must follow.
    Shift,
    /// Saw `0x71 0x79`.
    ShiftedKeypad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fsm {
    state: State,
}

impl Fsm {
    pub const fn new() -> Self {
        Fsm { state: State::Init }
    }

    pub fn reset(&mut self) {
        self.state = State::Init;
    }

    pub(super) fn pending(&self) -> bool {
        self.state != State::Init
    }

    fn key(byte: u8, map: Option<&[u8; 64]>) -> Step {
        if byte & 0x01 == 0 {
            // Bit 0 is part of the framing; a clear bit means we are not
            // looking at a key byte at all.
            return Step::Unknown;
        }
        let code = (byte >> 1) & 0x3F;
        let interface = match map {
            None => base_code(code),
            Some(m) => m[code as usize],
        };
        if interface == 0 {
            log_debug!("m0110: unmapped prefixed code {=u8:x}", code);
            return Step::Ignored;
        }
        if byte & 0x80 == 0 {
            Step::Event(KeyEvent::make(interface))
        } else {
            Step::Event(KeyEvent::brk(interface))
        }
    }

    pub(super) fn feed(&mut self, byte: u8) -> Step {
        let (next, step) = match self.state {
            State::Init => match byte {
                RESP_NULL => (State::Init, Step::Ignored),
                0x79 => (State::Keypad, Step::Pending),
                0x71 => (State::Shift, Step::Pending),
                b => (State::Init, Self::key(b, None)),
            },
            State::Keypad => (State::Init, Self::key(byte, Some(&KEYPAD_MAP))),
            State::Shift => match byte {
                0x79 => (State::ShiftedKeypad, Step::Pending),
                _ => (State::Init, Step::Unknown),
            },
            State::ShiftedKeypad => (State::Init, Self::key(byte, Some(&SHIFTED_KEYPAD_MAP))),
        };
        self.state = next;
        step
    }
}
