//! Amiga scancodes.
//!
//! A direct 1:1 code set: bit 7 of the (already un-rotated) frame byte is
//! the release flag, bits 6..0 are the key, `0x00..=0x67`. Codes are
//! shifted up by one so the backtick key at raw 0x00 does not collide
//! with the reserved "no key" interface code.
//!
//! The keyboard also talks about itself with a handful of out-of-band
//! codes above the key range. None of them are key events; the sync-loss
//! and overflow ones force a resync so the dispatcher can drop any keys
//! the lost bytes may have left hanging.
//!
//! Caps Lock is special on this hardware: the keyboard latches it
//! internally and only reports the transitions, and the host cannot drive
//! the Caps LED at all.

use super::{KeyEvent, Step};
use crate::log::{log_debug, log_error, log_info};

/// Last real key position.
const MAX_CODE: u8 = 0x67;

/// Keyboard signalled it lost sync and finished its recovery dance.
pub const CODE_SYNC_LOST: u8 = 0xF9;
/// Keyboard-side buffer overflowed; codes were lost.
pub const CODE_OVERFLOW: u8 = 0xFA;
/// Keyboard self test failed.
pub const CODE_SELFTEST_FAIL: u8 = 0xFC;
/// Power-up key stream follows (keys held during power-up).
pub const CODE_INIT_POWER_UP: u8 = 0xFD;
/// Power-up key stream finished.
pub const CODE_INIT_DONE: u8 = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fsm {
    // Stateless between bytes; the type exists to mirror the other
    // variants and leave room for the power-up stream flag.
    power_up: bool,
}

impl Fsm {
    pub const fn new() -> Self {
        Fsm { power_up: false }
    }

    pub fn reset(&mut self) {
        self.power_up = false;
    }

    /// Every byte stands alone on this wire; there is never a committed
    /// prefix for garbage to interrupt.
    pub(super) fn pending(&self) -> bool {
        false
    }

    pub(super) fn feed(&mut self, byte: u8) -> Step {
        match byte {
            CODE_SYNC_LOST => {
                log_info!("amiga: keyboard reports lost sync");
                Step::Resync
            }
            CODE_OVERFLOW => {
                log_info!("amiga: keyboard buffer overflow");
                Step::Resync
            }
            CODE_SELFTEST_FAIL => {
                log_error!("amiga: keyboard self test failed");
                Step::Ignored
            }
            CODE_INIT_POWER_UP => {
                self.power_up = true;
                Step::Ignored
            }
            CODE_INIT_DONE => {
                self.power_up = false;
                Step::Ignored
            }
            b => {
                let code = b & 0x7F;
                if code > MAX_CODE {
                    log_debug!("amiga: code {=u8:x} out of range", code);
                    return Step::Unknown;
                }
                // During the power-up stream the keyboard replays keys
                // that are held down; they are ordinary makes.
                let code = code + 1;
                if b & 0x80 == 0 {
                    Step::Event(KeyEvent::make(code))
                } else {
                    Step::Event(KeyEvent::brk(code))
                }
            }
        }
    }
}
