//! Scancode Set 3 (terminal keyboards).
//!
//! The civilized one: every key is a single byte, `F0` is the break
//! prefix, and there are no `E0`/`E1` sequences at all. A couple of codes
//! get remapped so 122-key terminal boards keep their keymaps dense.

use super::{KeyEvent, Step};
use crate::log::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    F0,
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

    fn code(byte: u8) -> Option<u8> {
        match byte {
            0x7C => Some(0x68),
            0x83 => Some(0x02),
            0x84 => Some(0x7F),
            0x01..=0x7F => Some(byte),
            _ => None,
        }
    }

    pub(super) fn feed(&mut self, byte: u8) -> Step {
        let (next, step) = match self.state {
            State::Init => match byte {
                0xF0 => (State::F0, Step::Pending),
                0x00 | 0xAA | 0xEE | 0xFA | 0xFC | 0xFD | 0xFE | 0xFF => {
                    log_debug!("set3: protocol byte {=u8:x} in stream", byte);
                    (State::Init, Step::Ignored)
                }
                b => match Self::code(b) {
                    Some(code) => (State::Init, Step::Event(KeyEvent::make(code))),
                    None => (State::Init, Step::Unknown),
                },
            },
            State::F0 => match Self::code(byte) {
                Some(code) => (State::Init, Step::Event(KeyEvent::brk(code))),
                None => (State::Init, Step::Unknown),
            },
        };
        self.state = next;
        step
    }
}
