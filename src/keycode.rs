//! The 8-bit key code spaces used throughout the converter.
//!
//! Two distinct spaces share this module:
//!
//! - *Interface codes* are what the scancode decoders emit: a canonical
//!   per-keyboard identifier for a physical key position. `0x00` means "no
//!   key" and is never emitted.
//! - *Keymap entries* are what a layer cell holds: a HID usage, a modifier,
//!   a consumer/system special, or a layer/flip/macro action. The constants
//!   below spell out the carve-up of the `0xA5..=0xFF` action range.
//!
//! Keymap entry ranges:
//!
//! ```text
//! 0x00        KC_NO
//! 0x01..=0xA4 HID keyboard usages, emitted unchanged
//! 0xA5..=0xB8 system / consumer specials
//! 0xC1..=0xC7 MO(n)  momentary layer n
//! 0xC9..=0xCF TG(n)  toggle layer n (persisted)
//! 0xD1        KC_TRNS
//! 0xD2        KC_NFLP
//! 0xD3        KC_FN
//! 0xD4..=0xDF macro keys
//! 0xE0..=0xE7 HID modifiers
//! 0xE9..=0xEF OSL(n) one-shot layer n
//! 0xF0        KC_BOOT
//! ```

#![allow(dead_code)]

// --- HID keyboard usage page (0x07) -----------------------------------

pub const KC_NO: u8 = 0x00;
pub const KC_A: u8 = 0x04;
pub const KC_B: u8 = 0x05;
pub const KC_C: u8 = 0x06;
pub const KC_D: u8 = 0x07;
pub const KC_E: u8 = 0x08;
pub const KC_F: u8 = 0x09;
pub const KC_G: u8 = 0x0A;
pub const KC_H: u8 = 0x0B;
pub const KC_I: u8 = 0x0C;
pub const KC_J: u8 = 0x0D;
pub const KC_K: u8 = 0x0E;
pub const KC_L: u8 = 0x0F;
pub const KC_M: u8 = 0x10;
pub const KC_N: u8 = 0x11;
pub const KC_O: u8 = 0x12;
pub const KC_P: u8 = 0x13;
pub const KC_Q: u8 = 0x14;
pub const KC_R: u8 = 0x15;
pub const KC_S: u8 = 0x16;
pub const KC_T: u8 = 0x17;
pub const KC_U: u8 = 0x18;
pub const KC_V: u8 = 0x19;
pub const KC_W: u8 = 0x1A;
pub const KC_X: u8 = 0x1B;
pub const KC_Y: u8 = 0x1C;
pub const KC_Z: u8 = 0x1D;
pub const KC_1: u8 = 0x1E;
pub const KC_2: u8 = 0x1F;
pub const KC_3: u8 = 0x20;
pub const KC_4: u8 = 0x21;
pub const KC_5: u8 = 0x22;
pub const KC_6: u8 = 0x23;
pub const KC_7: u8 = 0x24;
pub const KC_8: u8 = 0x25;
pub const KC_9: u8 = 0x26;
pub const KC_0: u8 = 0x27;
pub const KC_ENTER: u8 = 0x28;
pub const KC_ESC: u8 = 0x29;
pub const KC_BSPACE: u8 = 0x2A;
pub const KC_TAB: u8 = 0x2B;
pub const KC_SPACE: u8 = 0x2C;
pub const KC_MINUS: u8 = 0x2D;
pub const KC_EQUAL: u8 = 0x2E;
pub const KC_LBRACKET: u8 = 0x2F;
pub const KC_RBRACKET: u8 = 0x30;
pub const KC_BSLASH: u8 = 0x31;
pub const KC_NONUS_HASH: u8 = 0x32;
pub const KC_SCOLON: u8 = 0x33;
pub const KC_QUOTE: u8 = 0x34;
pub const KC_GRAVE: u8 = 0x35;
pub const KC_COMMA: u8 = 0x36;
pub const KC_DOT: u8 = 0x37;
pub const KC_SLASH: u8 = 0x38;
pub const KC_CAPSLOCK: u8 = 0x39;
pub const KC_F1: u8 = 0x3A;
pub const KC_F2: u8 = 0x3B;
pub const KC_F3: u8 = 0x3C;
pub const KC_F4: u8 = 0x3D;
pub const KC_F5: u8 = 0x3E;
pub const KC_F6: u8 = 0x3F;
pub const KC_F7: u8 = 0x40;
pub const KC_F8: u8 = 0x41;
pub const KC_F9: u8 = 0x42;
pub const KC_F10: u8 = 0x43;
pub const KC_F11: u8 = 0x44;
pub const KC_F12: u8 = 0x45;
pub const KC_PSCREEN: u8 = 0x46;
pub const KC_SCROLLLOCK: u8 = 0x47;
pub const KC_PAUSE: u8 = 0x48;
pub const KC_INSERT: u8 = 0x49;
pub const KC_HOME: u8 = 0x4A;
pub const KC_PGUP: u8 = 0x4B;
pub const KC_DELETE: u8 = 0x4C;
pub const KC_END: u8 = 0x4D;
pub const KC_PGDOWN: u8 = 0x4E;
pub const KC_RIGHT: u8 = 0x4F;
pub const KC_LEFT: u8 = 0x50;
pub const KC_DOWN: u8 = 0x51;
pub const KC_UP: u8 = 0x52;
pub const KC_NUMLOCK: u8 = 0x53;
pub const KC_KP_SLASH: u8 = 0x54;
pub const KC_KP_ASTERISK: u8 = 0x55;
pub const KC_KP_MINUS: u8 = 0x56;
pub const KC_KP_PLUS: u8 = 0x57;
pub const KC_KP_ENTER: u8 = 0x58;
pub const KC_KP_1: u8 = 0x59;
pub const KC_KP_2: u8 = 0x5A;
pub const KC_KP_3: u8 = 0x5B;
pub const KC_KP_4: u8 = 0x5C;
pub const KC_KP_5: u8 = 0x5D;
pub const KC_KP_6: u8 = 0x5E;
pub const KC_KP_7: u8 = 0x5F;
pub const KC_KP_8: u8 = 0x60;
pub const KC_KP_9: u8 = 0x61;
pub const KC_KP_0: u8 = 0x62;
pub const KC_KP_DOT: u8 = 0x63;
pub const KC_NONUS_BSLASH: u8 = 0x64;
pub const KC_APPLICATION: u8 = 0x65;
pub const KC_KB_POWER: u8 = 0x66;
pub const KC_KP_EQUAL: u8 = 0x67;
pub const KC_F13: u8 = 0x68;
pub const KC_F14: u8 = 0x69;
pub const KC_F15: u8 = 0x6A;
pub const KC_F16: u8 = 0x6B;
pub const KC_F17: u8 = 0x6C;
pub const KC_F18: u8 = 0x6D;
pub const KC_F19: u8 = 0x6E;
pub const KC_F20: u8 = 0x6F;
pub const KC_F21: u8 = 0x70;
pub const KC_F22: u8 = 0x71;
pub const KC_F23: u8 = 0x72;
pub const KC_F24: u8 = 0x73;

// --- modifiers (bit = code - 0xE0 in the HID modifier byte) -----------

pub const KC_LCTRL: u8 = 0xE0;
pub const KC_LSHIFT: u8 = 0xE1;
pub const KC_LALT: u8 = 0xE2;
pub const KC_LGUI: u8 = 0xE3;
pub const KC_RCTRL: u8 = 0xE4;
pub const KC_RSHIFT: u8 = 0xE5;
pub const KC_RALT: u8 = 0xE6;
pub const KC_RGUI: u8 = 0xE7;

// --- system / consumer specials ---------------------------------------

pub const KC_SYSTEM_POWER: u8 = 0xA5;
pub const KC_SYSTEM_SLEEP: u8 = 0xA6;
pub const KC_SYSTEM_WAKE: u8 = 0xA7;
pub const KC_AUDIO_MUTE: u8 = 0xA8;
pub const KC_AUDIO_VOL_UP: u8 = 0xA9;
pub const KC_AUDIO_VOL_DOWN: u8 = 0xAA;
pub const KC_MEDIA_PLAY_PAUSE: u8 = 0xAB;
pub const KC_MEDIA_NEXT_TRACK: u8 = 0xAC;
pub const KC_MEDIA_PREV_TRACK: u8 = 0xAD;
pub const KC_MEDIA_STOP: u8 = 0xAE;
pub const KC_CALCULATOR: u8 = 0xAF;
pub const KC_MY_COMPUTER: u8 = 0xB0;
pub const KC_MAIL: u8 = 0xB1;
pub const KC_WWW_SEARCH: u8 = 0xB2;
pub const KC_WWW_HOME: u8 = 0xB3;
pub const KC_WWW_BACK: u8 = 0xB4;
pub const KC_WWW_FORWARD: u8 = 0xB5;
pub const KC_WWW_STOP: u8 = 0xB6;
pub const KC_WWW_REFRESH: u8 = 0xB7;
pub const KC_WWW_FAVOURITES: u8 = 0xB8;

// --- layer / converter actions ----------------------------------------

pub const KC_TRNS: u8 = 0xD1;
pub const KC_NFLP: u8 = 0xD2;
pub const KC_FN: u8 = 0xD3;
/// First macro slot; expands to the bootloader request.
pub const KC_MACRO_BOOT: u8 = 0xD4;
pub const KC_BOOT: u8 = 0xF0;

/// Momentary layer `n`, active while held. `n` must be in `1..=7`.
pub const fn mo(n: u8) -> u8 {
    0xC0 | (n & 0x07)
}

/// Toggle layer `n`, flipped on Make and persisted. `n` must be in `1..=7`.
pub const fn tg(n: u8) -> u8 {
    0xC8 | (n & 0x07)
}

/// One-shot layer `n`, active for exactly one following key event.
pub const fn osl(n: u8) -> u8 {
    0xE8 | (n & 0x07)
}

// --- range predicates --------------------------------------------------

/// True for plain HID keyboard usages (modifiers excluded).
pub fn is_hid_usage(v: u8) -> bool {
    (0x01..=0xA4).contains(&v)
}

/// True for the HID modifier range `0xE0..=0xE7`.
pub fn is_modifier(v: u8) -> bool {
    (0xE0..=0xE7).contains(&v)
}

/// Bit of `v` in the HID report modifier byte. Only meaningful when
/// `is_modifier(v)`.
pub fn modifier_bit(v: u8) -> u8 {
    1 << (v & 0x07)
}

/// True for the system-control special range.
pub fn is_system(v: u8) -> bool {
    (KC_SYSTEM_POWER..=KC_SYSTEM_WAKE).contains(&v)
}

/// True for the consumer-control special range.
pub fn is_consumer(v: u8) -> bool {
    (KC_AUDIO_MUTE..=KC_WWW_FAVOURITES).contains(&v)
}

/// Momentary-layer number, if `v` is an `mo()` entry.
pub fn mo_layer(v: u8) -> Option<u8> {
    match v {
        0xC1..=0xC7 => Some(v & 0x07),
        _ => None,
    }
}

/// Toggle-layer number, if `v` is a `tg()` entry.
pub fn tg_layer(v: u8) -> Option<u8> {
    match v {
        0xC9..=0xCF => Some(v & 0x07),
        _ => None,
    }
}

/// One-shot-layer number, if `v` is an `osl()` entry.
pub fn osl_layer(v: u8) -> Option<u8> {
    match v {
        0xE9..=0xEF => Some(v & 0x07),
        _ => None,
    }
}

/// True for the macro-key range.
pub fn is_macro(v: u8) -> bool {
    (0xD4..=0xDF).contains(&v)
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    #[test]
    fn ranges_do_not_overlap() {
        for v in 0x01u8..=0xFF {
            let classes = [
                is_hid_usage(v),
                is_system(v) || is_consumer(v),
                is_modifier(v),
                mo_layer(v).is_some(),
                tg_layer(v).is_some(),
                osl_layer(v).is_some(),
                is_macro(v),
                v == KC_TRNS || v == KC_NFLP || v == KC_FN || v == KC_BOOT,
            ];
            let hits = classes.iter().filter(|&&c| c).count();
            assert!(hits <= 1, "entry {:#04x} classified {} ways", v, hits);
        }
    }

    #[test]
    fn layer_action_encoding() {
        assert_eq!(mo(1), 0xC1);
        assert_eq!(tg(7), 0xCF);
        assert_eq!(osl(3), 0xEB);
        assert_eq!(mo_layer(mo(5)), Some(5));
        assert_eq!(tg_layer(tg(2)), Some(2));
        assert_eq!(osl_layer(osl(6)), Some(6));
        assert_eq!(mo_layer(0xC0), None);
        assert_eq!(tg_layer(0xC8), None);
    }

    #[test]
    fn modifier_bits() {
        assert_eq!(modifier_bit(KC_LCTRL), 0x01);
        assert_eq!(modifier_bit(KC_LSHIFT), 0x02);
        assert_eq!(modifier_bit(KC_RSHIFT), 0x20);
        assert_eq!(modifier_bit(KC_RGUI), 0x80);
    }
}
