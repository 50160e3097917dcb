//! Scancode Set 2 (AT / PS/2 power-on default).
//!
//! Break is the `F0` prefix, `E0` extends the code space, and `E1` opens
//! the eight-byte Pause sequence (`E1 14 77` press, `E1 F0 14 F0 77`
//! release) — the longest legal prefix any decoder here tracks.
//!
//! Fake shifts (`E0 12`, `E0 59`, and their break forms) are filtered.
//! `E0 77` (Unicomp's one-byte-extended Pause) and `E0 7E` (the
//! control-modified Pause) both translate to the Pause position, so their
//! make and break forms work like any other extended key.

use super::{KeyEvent, Step};
use crate::log::log_debug;

/// Interface code of the Pause position.
const PAUSE: u8 = 0x48;

/// Translation for `E0`-extended codes. Modifier and navigation keys land
/// in holes of the native Set 2 space (keeping their own value when that
/// value is itself a hole); ACPI and multimedia keys translate straight to
/// the shared consumer/system interface codes at 0xA5 and up.
#[rustfmt::skip]
static E0_MAP: [u8; 128] = {
    let mut t = [0u8; 128];
    t[0x11] = 0x0F; // right alt
    t[0x14] = 0x19; // right control
    t[0x15] = 0xAD; // previous track
    t[0x1F] = 0x1F; // left gui
    t[0x20] = 0xB7; // www refresh
    t[0x21] = 0xAA; // volume down
    t[0x23] = 0xA8; // mute
    t[0x27] = 0x27; // right gui
    t[0x28] = 0xB6; // www stop
    t[0x2B] = 0xAF; // calculator
    t[0x2F] = 0x2F; // menu
    t[0x30] = 0xB5; // www forward
    t[0x32] = 0xA9; // volume up
    t[0x34] = 0xAB; // play/pause
    t[0x37] = 0x37; // power
    t[0x38] = 0xB4; // www back
    t[0x3A] = 0xB3; // www home
    t[0x3B] = 0xAE; // media stop
    t[0x3F] = 0x3F; // sleep
    t[0x40] = 0xB0; // my computer
    t[0x48] = 0xB1; // email
    t[0x4A] = 0x60; // keypad slash
    t[0x4D] = 0xAC; // next track
    t[0x5A] = 0x62; // keypad enter
    t[0x5E] = 0x5E; // wake
    t[0x69] = 0x64; // end
    t[0x6B] = 0x47; // left
    t[0x6C] = 0x65; // home
    t[0x70] = 0x67; // insert
    t[0x71] = 0x68; // delete
    t[0x72] = 0x63; // down
    t[0x74] = 0x6A; // right
    t[0x75] = 0x6D; // up
    t[0x77] = PAUSE; // pause (Unicomp single-extended form)
    t[0x7A] = 0x6E; // page down
    t[0x7C] = 0x57; // print screen
    t[0x7D] = 0x6F; // page up
    t[0x7E] = PAUSE; // control-pause
    t
};

/// Bytes the keyboard uses for link management rather than keys. In the
/// steady-state stream they are chatter (a late BAT result, an ACK for a
/// LED command the init layer already gave up on) and are dropped.
fn is_protocol_byte(byte: u8) -> bool {
    matches!(byte, 0x00 | 0xAA | 0xEE | 0xFA | 0xFC | 0xFD | 0xFE | 0xFF)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
enum State {
    Init,
    F0,
    E0,
    E0_F0,
    E1,
    E1_14,
    E1_F0,
    E1_F0_14,
    E1_F0_14_F0,
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

    /// Single-byte code translation shared by the make and break paths.
    fn base_code(byte: u8) -> Option<u8> {
        match byte {
            0x83 => Some(0x02), // F7 sits alone above 0x7F
            0x84 => Some(0x7F), // SysRq / Alt'd Print Screen
            0x01..=0x7F => Some(byte),
            _ => None,
        }
    }

    pub(super) fn feed(&mut self, byte: u8) -> Step {
        let (next, step) = match self.state {
            State::Init => match byte {
                0xF0 => (State::F0, Step::Pending),
                0xE0 => (State::E0, Step::Pending),
                0xE1 => (State::E1, Step::Pending),
                b if is_protocol_byte(b) => {
                    log_debug!("set2: protocol byte {=u8:x} in stream", b);
                    (State::Init, Step::Ignored)
                }
                b => match Self::base_code(b) {
                    Some(code) => (State::Init, Step::Event(KeyEvent::make(code))),
                    None => (State::Init, Step::Unknown),
                },
            },
            State::F0 => match Self::base_code(byte) {
                Some(code) => (State::Init, Step::Event(KeyEvent::brk(code))),
                None => (State::Init, Step::Unknown),
            },
            State::E0 => match byte {
                0xF0 => (State::E0_F0, Step::Pending),
                0x12 | 0x59 => (State::Init, Step::Ignored), // fake shift
                b if b <= 0x7F => match E0_MAP[b as usize] {
                    0 => {
                        log_debug!("set2: unmapped e0 {=u8:x}", b);
                        (State::Init, Step::Ignored)
                    }
                    code => (State::Init, Step::Event(KeyEvent::make(code))),
                },
                _ => (State::Init, Step::Unknown),
            },
            State::E0_F0 => match byte {
                0x12 | 0x59 => (State::Init, Step::Ignored), // fake shift break
                b if b <= 0x7F => match E0_MAP[b as usize] {
                    0 => {
                        log_debug!("set2: unmapped e0 break {=u8:x}", b);
                        (State::Init, Step::Ignored)
                    }
                    code => (State::Init, Step::Event(KeyEvent::brk(code))),
                },
                _ => (State::Init, Step::Unknown),
            },
            State::E1 => match byte {
                0x14 => (State::E1_14, Step::Pending),
                0xF0 => (State::E1_F0, Step::Pending),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_14 => match byte {
                0x77 => (State::Init, Step::Event(KeyEvent::make(PAUSE))),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_F0 => match byte {
                0x14 => (State::E1_F0_14, Step::Pending),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_F0_14 => match byte {
                0xF0 => (State::E1_F0_14_F0, Step::Pending),
                _ => (State::Init, Step::Unknown),
            },
            State::E1_F0_14_F0 => match byte {
                0x77 => (State::Init, Step::Event(KeyEvent::brk(PAUSE))),
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
            events(ScancodeSet::Set2, &[0x1C, 0xF0, 0x1C]),
            &[KeyEvent::make(0x1C), KeyEvent::brk(0x1C)],
        );
    }

    #[test]
    fn full_pause_sequence() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE1, 0x14, 0x77, 0xE1, 0xF0, 0x14, 0xF0, 0x77]),
            &[KeyEvent::make(0x48), KeyEvent::brk(0x48)],
        );
    }

    #[test]
    fn extended_make_break() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE0, 0x75, 0xE0, 0xF0, 0x75]),
            &[KeyEvent::make(0x6D), KeyEvent::brk(0x6D)],
        );
    }

    #[test]
    fn print_screen_with_fake_shifts() {
        // Full PS/2 Print Screen: E0 12 E0 7C press, E0 F0 7C E0 F0 12
        // release. The fake shifts disappear.
        assert_eq!(
            events(
                ScancodeSet::Set2,
                &[0xE0, 0x12, 0xE0, 0x7C, 0xE0, 0xF0, 0x7C, 0xE0, 0xF0, 0x12],
            ),
            &[KeyEvent::make(0x57), KeyEvent::brk(0x57)],
        );
    }

    #[test]
    fn unicomp_pause_maps_to_pause_position() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE0, 0x77, 0xE0, 0xF0, 0x77]),
            &[KeyEvent::make(0x48), KeyEvent::brk(0x48)],
        );
    }

    #[test]
    fn control_pause_maps_to_pause_position() {
        // Distinct wire form, same interface code as E0 77.
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE0, 0x7E, 0xE0, 0xF0, 0x7E]),
            &[KeyEvent::make(0x48), KeyEvent::brk(0x48)],
        );
    }

    #[test]
    fn high_code_remaps() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0x83, 0xF0, 0x83, 0x84, 0xF0, 0x84]),
            &[
                KeyEvent::make(0x02),
                KeyEvent::brk(0x02),
                KeyEvent::make(0x7F),
                KeyEvent::brk(0x7F),
            ],
        );
    }

    #[test]
    fn media_keys_translate_to_consumer_codes() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE0, 0x23, 0xE0, 0xF0, 0x23]),
            &[KeyEvent::make(0xA8), KeyEvent::brk(0xA8)],
        );
    }

    #[test]
    fn protocol_chatter_is_dropped() {
        assert_eq!(
            events(ScancodeSet::Set2, &[0xFA, 0x1C, 0xAA, 0xF0, 0x1C]),
            &[KeyEvent::make(0x1C), KeyEvent::brk(0x1C)],
        );
    }

    #[test]
    fn interrupted_pause_discards_partial_bytes() {
        // E1 14 then something that is not 0x77: both pending bytes die,
        // the offending byte is not reinterpreted.
        assert_eq!(events(ScancodeSet::Set2, &[0xE1, 0x14, 0x1C]), &[]);
        assert_eq!(
            events(ScancodeSet::Set2, &[0xE1, 0x14, 0x1C, 0x1C]),
            &[KeyEvent::make(0x1C)],
        );
    }
}
