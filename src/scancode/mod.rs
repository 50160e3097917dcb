//! Scancode decoding: frame bytes in, key events out.
//!
//! Five byte-level encodings share one shape: a small state machine that
//! eats one byte at a time and occasionally produces an
//! `(interface code, edge)` pair. Interface codes are canonical per
//! keyboard family — extended multi-byte sequences are folded into unused
//! holes of that family's single-byte code space, so a keymap written for
//! a given keyboard sees one stable 8-bit identifier per physical key.
//!
//! Recovery rules, identical across variants:
//!
//! - an unexpected byte inside a sequence discards the partial bytes and
//!   returns the machine to its initial state; the bytes are never
//!   reinterpreted as the start of a new sequence.
//! - a translation that yields 0 emits nothing.
//! - three sequences in a row dying to unexpected bytes, a ring-buffer
//!   overrun, or a latched wire error escalate to a hard reset, which the
//!   event dispatcher answers with a release-all report. Garbage that
//!   arrives while the machine is idle is discarded without counting:
//!   only rejections from inside a committed prefix are evidence that
//!   the byte stream itself has desynchronized.

use crate::log::log_debug;

pub mod amiga;
pub mod m0110;
pub mod set1;
pub mod set2;
pub mod set3;

/// Press or release. Every decoded event carries one; the decoders never
/// synthesize auto-repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Make,
    Break,
}

/// A decoded key transition in interface-code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub code: u8,
    pub edge: Edge,
}

impl KeyEvent {
    pub const fn make(code: u8) -> Self {
        KeyEvent { code, edge: Edge::Make }
    }
    pub const fn brk(code: u8) -> Self {
        KeyEvent { code, edge: Edge::Break }
    }
}

/// The scancode encoding a keyboard speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScancodeSet {
    /// XT, or AT keyboards translated by an 8042.
    Set1,
    /// AT/PS2 power-on default.
    Set2,
    /// Terminal boards (122-key and friends).
    Set3,
    Amiga,
    M0110,
}

/// What one byte did to a variant state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Byte consumed, sequence still in flight.
    Pending,
    /// A complete key transition.
    Event(KeyEvent),
    /// Byte consumed and dropped on purpose (fake shift, protocol chatter,
    /// unmapped translation).
    Ignored,
    /// Byte made no sense where it arrived; the machine has reset itself.
    Unknown,
    /// The keyboard asked for a resync (Amiga 0xF9/0xFA class codes).
    Resync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Set1(set1::Fsm),
    Set2(set2::Fsm),
    Set3(set3::Fsm),
    Amiga(amiga::Fsm),
    M0110(m0110::Fsm),
}

/// Output of [`Decoder::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Output {
    None,
    Event(KeyEvent),
    /// The decoder gave up on the stream; held keys may be stuck, and the
    /// dispatcher must reconcile against its own press state.
    HardReset,
}

/// How many consecutive mid-sequence rejections escalate to a hard
/// reset.
const UNKNOWN_STREAK_LIMIT: u8 = 3;

/// A scancode decoder for one configured variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    variant: Variant,
    unknown_streak: u8,
}

impl Decoder {
    pub fn new(set: ScancodeSet) -> Self {
        let variant = match set {
            ScancodeSet::Set1 => Variant::Set1(set1::Fsm::new()),
            ScancodeSet::Set2 => Variant::Set2(set2::Fsm::new()),
            ScancodeSet::Set3 => Variant::Set3(set3::Fsm::new()),
            ScancodeSet::Amiga => Variant::Amiga(amiga::Fsm::new()),
            ScancodeSet::M0110 => Variant::M0110(m0110::Fsm::new()),
        };
        Decoder { variant, unknown_streak: 0 }
    }

    pub fn set(&self) -> ScancodeSet {
        match self.variant {
            Variant::Set1(_) => ScancodeSet::Set1,
            Variant::Set2(_) => ScancodeSet::Set2,
            Variant::Set3(_) => ScancodeSet::Set3,
            Variant::Amiga(_) => ScancodeSet::Amiga,
            Variant::M0110(_) => ScancodeSet::M0110,
        }
    }

    /// Drop any partial sequence and clear the rejection streak.
    pub fn reset(&mut self) {
        match &mut self.variant {
            Variant::Set1(f) => f.reset(),
            Variant::Set2(f) => f.reset(),
            Variant::Set3(f) => f.reset(),
            Variant::Amiga(f) => f.reset(),
            Variant::M0110(f) => f.reset(),
        }
        self.unknown_streak = 0;
    }

    /// Whether the variant has committed to a multi-byte sequence.
    fn pending(&self) -> bool {
        match &self.variant {
            Variant::Set1(f) => f.pending(),
            Variant::Set2(f) => f.pending(),
            Variant::Set3(f) => f.pending(),
            Variant::Amiga(f) => f.pending(),
            Variant::M0110(f) => f.pending(),
        }
    }

    /// Decode one byte from the ring buffer.
    pub fn feed(&mut self, byte: u8) -> Output {
        // Whether the rejection below, if any, happened from inside a
        // prefix; rejections while idle never escalate.
        let was_pending = self.pending();
        let step = match &mut self.variant {
            Variant::Set1(f) => f.feed(byte),
            Variant::Set2(f) => f.feed(byte),
            Variant::Set3(f) => f.feed(byte),
            Variant::Amiga(f) => f.feed(byte),
            Variant::M0110(f) => f.feed(byte),
        };
        match step {
            // Prefix bytes leave the streak alone: the sequence they
            // open may be the next one to die.
            Step::Pending => Output::None,
            Step::Ignored => {
                self.unknown_streak = 0;
                Output::None
            }
            Step::Event(ev) => {
                self.unknown_streak = 0;
                debug_assert_ne!(ev.code, 0);
                Output::Event(ev)
            }
            Step::Unknown => {
                log_debug!("scancode: unexpected byte {=u8:x}", byte);
                if !was_pending {
                    return Output::None;
                }
                self.unknown_streak += 1;
                if self.unknown_streak >= UNKNOWN_STREAK_LIMIT {
                    self.reset();
                    Output::HardReset
                } else {
                    Output::None
                }
            }
            Step::Resync => {
                self.reset();
                Output::HardReset
            }
        }
    }

    /// Feed a whole slice, collecting events. Convenience for init-time
    /// replay and for tests.
    pub fn feed_all<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = Output> + 'a {
        bytes.iter().map(move |&b| self.feed(b))
    }
}


#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    #[test]
    fn mid_sequence_rejection_streak_hard_resets() {
        let mut dec = Decoder::new(ScancodeSet::Set2);
        // Three sequences in a row die to a byte that fits nowhere.
        for _ in 0..2 {
            assert_eq!(dec.feed(0xE1), Output::None);
            assert_eq!(dec.feed(0x99), Output::None);
        }
        assert_eq!(dec.feed(0xE1), Output::None);
        assert_eq!(dec.feed(0x99), Output::HardReset);
        // And the machine is usable again afterwards.
        assert_eq!(dec.feed(0x1C), Output::Event(KeyEvent::make(0x1C)));
    }

    #[test]
    fn idle_noise_never_escalates() {
        let mut dec = Decoder::new(ScancodeSet::Set2);
        // Out-of-range bytes with no sequence in flight: dropped one by
        // one, no matter how many arrive.
        for _ in 0..16 {
            assert_eq!(dec.feed(0x99), Output::None);
        }
        assert_eq!(dec.feed(0x1C), Output::Event(KeyEvent::make(0x1C)));
    }

    #[test]
    fn events_clear_the_streak() {
        let mut dec = Decoder::new(ScancodeSet::Set2);
        // Two dead sequences...
        dec.feed(0xE1);
        assert_eq!(dec.feed(0x99), Output::None);
        dec.feed(0xE1);
        assert_eq!(dec.feed(0x99), Output::None);
        // ...then a good event restarts the count.
        assert_eq!(dec.feed(0x1C), Output::Event(KeyEvent::make(0x1C)));
        dec.feed(0xE1);
        assert_eq!(dec.feed(0x99), Output::None);
        dec.feed(0xE1);
        assert_eq!(dec.feed(0x99), Output::None);
        assert_eq!(dec.feed(0x1C), Output::Event(KeyEvent::make(0x1C)));
    }
}
