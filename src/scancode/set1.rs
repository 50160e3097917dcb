//! Scancode Set 1 (XT).
//!
//! Single-byte codes carry the break flag in bit 7. `E0` extends the code
//! space; `E1` exists only for the Pause key, which transmits
//! `E1 1D 45` on press and `E1 9D C5` on release and has no other legal
//! continuation. The fake shifts an XT-era keyboard wraps around Print
//! Screen (`E0 2A` / `E0 AA` / `E0 36` / `E0 B6`) are filtered here and
//! never become events.

use super::{KeyEvent, Step};
use crate::log::log_debug;

/// Interface code of the Pause position.
const PAUSE: u8 = 0x48;

/// Translation for `E0`-extended codes, indexed by `code & 0x7F`. Extended
/// keys land in the unused holes above the native XT code space; zero
/// means "no such key" and the byte is dropped.
#[rustfmt::skip]
static E0_MAP: [u8; 128] = {
    let mut t = [0u8; 128];
    t[0x1C] = 0x59; // keypad enter
    t[0x1D] = 0x5A; // right control
    t[0x20] = 0x6D; // mute
    t[0x35] = 0x5B; // keypad slash
    t[0x37] = 0x54; // print screen
    t[0x38] = 0x5C; // right alt
    t[0x46] = PAUSE; // control-break
    t[0x47] = 0x5D; // home
    t[0x48] = 0x5E; // up
    t[0x49] = 0x5F; // page up
    t[0x4B] = 0x60; // left
    t[0x4D] = 0x61; // right
    t[0x4F] = 0x62; // end
    t[0x50] = 0x63; // down
    t[0x51] = 0x64; // page down
    t[0x52] = 0x65; // insert
    t[0x53] = 0x66; // delete
    t[0x5B] = 0x67; // left gui
    t[0x5C] = 0x68; // right gui
    t[0x5D] = 0x69; // menu
    t[0x5E] = 0x6A; // power
    t[0x5F] = 0x6B; // sleep
    t[0x63] = 0x6C; // wake
    t
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    E0,
    E1,
    E1_1D,
    E1_9D,
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

    pub(super) fn feed(&mut self, byte: u8) -> Step {
        let (next, step) = match self.state {
            State::Init => match byte {
                0xE0 => (State::E0, Step::Pending),
                0xE1 => (State::E1, Step::Pending),
                b if b & 0x7F == 0 => (State::Init, Step::Ignored),
                b => {
                    let code = b & 0x7F;
                    let ev = if b & 0x80 == 0 { KeyEvent::make(code) } else { KeyEvent::brk(code) };
                    (State::Init, Step::Event(ev))
                }
            },
            State::E0 => match byte {
                // Fake shifts around Print Screen and the nav cluster.
                0x2A | 0xAA | 0x36 | 0xB6 => (State::Init, Step::Ignored),
                b => {
                    let code = E0_MAP[(b & 0x7F) as usize];
                    if code == 0 {
                        log_debug!("set1: unmapped e0 {=u8:x}", b);
                        (State::Init, Step::Ignored)
                    } else if b & 0x80 == 0 {
                        (State::Init, Step::Event(KeyEvent::make(code)))
                    } else {
                        (State::Init, Step::Event(KeyEvent::brk(code)))
                    }
                }
            },
            State::E1 => match byte {
                0x1D => (State::E1_1D, Step::Pending),
                0x9D => (State::E1_9D, Step::Pending),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_1D => match byte {
                0x45 => (State::Init, Step::Event(KeyEvent::make(PAUSE))),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_9D => match byte {
                0xC5 => (State::Init, Step::Event(KeyEvent::brk(PAUSE))),
                _ => (State::Init, Step::Unknown),
            },
        };
        self.state = next;
        step
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use crate::scancode::testutil::events;
    use crate::scancode::{KeyEvent, ScancodeSet};

    #[test]
    fn plain_make_break() {
        assert_eq!(
            events(ScancodeSet::Set1, &[0x1E, 0x9E]),
            &[KeyEvent::make(0x1E), KeyEvent::brk(0x1E)],
        );
    }

    #[test]
    fn extended_keys_land_in_holes() {
        assert_eq!(
            events(ScancodeSet::Set1, &[0xE0, 0x1D, 0xE0, 0x9D]),
            &[KeyEvent::make(0x5A), KeyEvent::brk(0x5A)],
        );
        assert_eq!(events(ScancodeSet::Set1, &[0xE0, 0x48]), &[KeyEvent::make(0x5E)]);
    }

    #[test]
    fn print_screen_with_fake_shifts() {
        // The documented full sequence: E0 2A E0 37 press, E0 B7 E0 AA
        // release. Only the 0x54 events survive.
        assert_eq!(
            events(ScancodeSet::Set1, &[0xE0, 0x2A, 0xE0, 0x37, 0xE0, 0xB7, 0xE0, 0xAA]),
            &[KeyEvent::make(0x54), KeyEvent::brk(0x54)],
        );
    }

    #[test]
    fn pause_sequences() {
        assert_eq!(
            events(ScancodeSet::Set1, &[0xE1, 0x1D, 0x45]),
            &[KeyEvent::make(0x48)],
        );
        assert_eq!(
            events(ScancodeSet::Set1, &[0xE1, 0x9D, 0xC5]),
            &[KeyEvent::brk(0x48)],
        );
    }

    #[test]
    fn control_break_is_pause() {
        assert_eq!(
            events(ScancodeSet::Set1, &[0xE0, 0x46, 0xE0, 0xC6]),
            &[KeyEvent::make(0x48), KeyEvent::brk(0x48)],
        );
    }

    #[test]
    fn broken_pause_sequence_is_discarded() {
        // E1 followed by garbage must not replay the garbage as a code.
        assert_eq!(events(ScancodeSet::Set1, &[0xE1, 0x45]), &[]);
        // But decoding continues cleanly afterwards.
        assert_eq!(events(ScancodeSet::Set1, &[0xE1, 0x45, 0x1E]), &[KeyEvent::make(0x1E)]);
    }

    #[test]
    fn unmapped_e0_is_dropped() {
        assert_eq!(events(ScancodeSet::Set1, &[0xE0, 0x01]), &[]);
    }
}
