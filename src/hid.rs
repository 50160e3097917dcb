//! HID report construction and the downstream sink interface.
//!
//! The converter core stops at the edge of USB: it builds boot-compatible
//! keyboard reports (and an NKRO bitmap variant for hosts that take it)
//! and hands them to a [`HidSink`]. Enumeration, endpoints, and transport
//! live with whatever implements the sink.

use crate::keycode::*;

/// A standard boot-protocol keyboard report: modifier byte, reserved
/// byte, six usage slots. Overflow fills every slot with ErrorRollOver,
/// which is what hosts expect from a 6KRO device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KbHidReport {
    pub modifier: u8,
    pub keys: [u8; 6],
}

/// HID ErrorRollOver usage.
const ROLL_OVER: u8 = 0x01;

impl KbHidReport {
    /// Add a usage to the report, saturating to rollover.
    pub fn press(&mut self, usage: u8) {
        if usage == KC_NO || self.keys.contains(&usage) {
            return;
        }
        match self.keys.iter_mut().find(|k| **k == 0) {
            Some(slot) => *slot = usage,
            None => self.keys = [ROLL_OVER; 6],
        }
    }

    /// Remove a usage. Harmless if absent (or if the report is in
    /// rollover, which a release will shortly resolve).
    pub fn release(&mut self, usage: u8) {
        for k in self.keys.iter_mut() {
            if *k == usage {
                *k = 0;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = KbHidReport::default();
    }

    /// The 8 bytes that go over the wire.
    pub fn as_bytes(&self) -> [u8; 8] {
        [
            self.modifier,
            0,
            self.keys[0],
            self.keys[1],
            self.keys[2],
            self.keys[3],
            self.keys[4],
            self.keys[5],
        ]
    }
}

/// NKRO bitmap report: modifier byte plus one bit per usage `0..=0x7F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NkroReport {
    pub modifier: u8,
    pub bits: [u8; 16],
}

impl NkroReport {
    pub fn press(&mut self, usage: u8) {
        if usage != KC_NO && usage <= 0x7F {
            self.bits[(usage >> 3) as usize] |= 1 << (usage & 0x07);
        }
    }

    pub fn release(&mut self, usage: u8) {
        if usage <= 0x7F {
            self.bits[(usage >> 3) as usize] &= !(1 << (usage & 0x07));
        }
    }

    pub fn clear(&mut self) {
        *self = NkroReport::default();
    }
}

/// HID Generic Desktop usages for the system-control specials.
pub fn system_usage(code: u8) -> u16 {
    match code {
        KC_SYSTEM_POWER => 0x81,
        KC_SYSTEM_SLEEP => 0x82,
        KC_SYSTEM_WAKE => 0x83,
        _ => 0,
    }
}

/// HID Consumer Page usages for the consumer specials.
pub fn consumer_usage(code: u8) -> u16 {
    match code {
        KC_AUDIO_MUTE => 0x00E2,
        KC_AUDIO_VOL_UP => 0x00E9,
        KC_AUDIO_VOL_DOWN => 0x00EA,
        KC_MEDIA_PLAY_PAUSE => 0x00CD,
        KC_MEDIA_NEXT_TRACK => 0x00B5,
        KC_MEDIA_PREV_TRACK => 0x00B6,
        KC_MEDIA_STOP => 0x00B7,
        KC_CALCULATOR => 0x0192,
        KC_MY_COMPUTER => 0x0194,
        KC_MAIL => 0x018A,
        KC_WWW_SEARCH => 0x0221,
        KC_WWW_HOME => 0x0223,
        KC_WWW_BACK => 0x0224,
        KC_WWW_FORWARD => 0x0225,
        KC_WWW_STOP => 0x0226,
        KC_WWW_REFRESH => 0x0227,
        KC_WWW_FAVOURITES => 0x022A,
        _ => 0,
    }
}

/// Where finished reports go. One implementation wraps the USB device
/// stack; the test suite substitutes a recorder.
pub trait HidSink {
    fn emit_keyboard_report(&mut self, modifier: u8, keys: [u8; 6]);
    /// System-control press/release; `0` releases.
    fn emit_system_control(&mut self, usage: u16);
    /// Consumer-control press/release; `0` releases.
    fn emit_consumer_control(&mut self, usage: u16);
    /// Reboot into the platform bootloader. Does not return on hardware.
    fn request_bootloader_reset(&mut self);
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    #[test]
    fn six_keys_then_rollover() {
        let mut rep = KbHidReport::default();
        for k in [KC_A, KC_B, KC_C, KC_D, KC_E, KC_F] {
            rep.press(k);
        }
        assert_eq!(rep.keys, [KC_A, KC_B, KC_C, KC_D, KC_E, KC_F]);
        rep.press(KC_G);
        assert_eq!(rep.keys, [ROLL_OVER; 6]);
    }

    #[test]
    fn press_is_idempotent() {
        let mut rep = KbHidReport::default();
        rep.press(KC_A);
        rep.press(KC_A);
        rep.release(KC_A);
        assert_eq!(rep.keys, [0; 6]);
    }

    #[test]
    fn wire_format() {
        let mut rep = KbHidReport::default();
        rep.modifier = 0x22;
        rep.press(KC_Z);
        assert_eq!(rep.as_bytes(), [0x22, 0, KC_Z, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn nkro_bits() {
        let mut rep = NkroReport::default();
        rep.press(KC_A); // 0x04
        assert_eq!(rep.bits[0], 0x10);
        rep.press(KC_KP_DOT); // 0x63
        assert_eq!(rep.bits[12], 0x08);
        rep.release(KC_A);
        assert_eq!(rep.bits[0], 0);
    }
}
