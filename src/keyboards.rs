//! Compile-time keyboard definitions.
//!
//! A build bakes in exactly one [`KeyboardConfig`]; the selection itself
//! (`KEYBOARD=<vendor>/<model>` in the build environment) happens outside
//! this crate. The definitions below double as the reference boards for
//! the test suite, one per supported protocol.
//!
//! Keymap tables are written against each board's interface-code space:
//! the native single-byte scancodes of its set, plus the translated
//! positions its decoder folds extended sequences into.

use crate::keymap::{KeyboardLayout, Layer, ShiftOverride};
use crate::keycode::*;
use crate::scancode::ScancodeSet;
use crate::wire::Protocol;

/// Everything the firmware needs to know about one keyboard model.
pub struct KeyboardConfig {
    pub make: &'static str,
    pub model: &'static str,
    pub description: &'static str,
    pub protocol: Protocol,
    pub codeset: ScancodeSet,
    pub layout: &'static KeyboardLayout,
}

/// FNV-1a, 32 bit. Small, decent dispersion, and trivially stable across
/// builds, which is all the config gating needs.
pub fn fnv1a(seed: u32, bytes: &[u8]) -> u32 {
    let mut hash = if seed == 0 { 0x811C_9DC5 } else { seed };
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

impl KeyboardConfig {
    /// Identity hash persisted in the config record: any change to what
    /// the firmware was built for invalidates a restored layer state.
    pub fn id_hash(&self) -> u32 {
        let mut h = fnv1a(0, self.make.as_bytes());
        h = fnv1a(h, b"/");
        h = fnv1a(h, self.model.as_bytes());
        h = fnv1a(h, &[protocol_tag(self.protocol), codeset_tag(self.codeset)]);
        h
    }

    /// Hash of the layer count and every keymap byte; the other half of
    /// the layer-state gate.
    pub fn layers_hash(&self) -> u32 {
        let mut h = fnv1a(0, &[self.layout.layers.len() as u8]);
        for layer in self.layout.layers {
            for row in layer {
                h = fnv1a(h, row);
            }
        }
        h
    }
}

fn protocol_tag(p: Protocol) -> u8 {
    match p {
        Protocol::Xt => 1,
        Protocol::AtPs2 => 2,
        Protocol::Amiga => 3,
        Protocol::M0110 => 4,
    }
}

fn codeset_tag(s: ScancodeSet) -> u8 {
    match s {
        ScancodeSet::Set1 => 1,
        ScancodeSet::Set2 => 2,
        ScancodeSet::Set3 => 3,
        ScancodeSet::Amiga => 4,
        ScancodeSet::M0110 => 5,
    }
}

// --- IBM Enhanced (AT/PS2, Set 2) --------------------------------------

#[rustfmt::skip]
const AT_SET2_BASE: Layer = {
    let mut t: Layer = [[KC_NO; 16]; 16];
    // Function row
    t[0x0][0x5] = KC_F1;   t[0x0][0x6] = KC_F2;   t[0x0][0x4] = KC_F3;
    t[0x0][0xC] = KC_F4;   t[0x0][0x3] = KC_F5;   t[0x0][0xB] = KC_F6;
    t[0x0][0x2] = KC_F7;   t[0x0][0xA] = KC_F8;   t[0x0][0x1] = KC_F9;
    t[0x0][0x9] = KC_F10;  t[0x7][0x8] = KC_F11;  t[0x0][0x7] = KC_F12;
    // Alphas
    t[0x1][0xC] = KC_A;    t[0x3][0x2] = KC_B;    t[0x2][0x1] = KC_C;
    t[0x2][0x3] = KC_D;    t[0x2][0x4] = KC_E;    t[0x2][0xB] = KC_F;
    t[0x3][0x4] = KC_G;    t[0x3][0x3] = KC_H;    t[0x4][0x3] = KC_I;
    t[0x3][0xB] = KC_J;    t[0x4][0x2] = KC_K;    t[0x4][0xB] = KC_L;
    t[0x3][0xA] = KC_M;    t[0x3][0x1] = KC_N;    t[0x4][0x4] = KC_O;
    t[0x4][0xD] = KC_P;    t[0x1][0x5] = KC_Q;    t[0x2][0xD] = KC_R;
    t[0x1][0xB] = KC_S;    t[0x2][0xC] = KC_T;    t[0x3][0xC] = KC_U;
    t[0x2][0xA] = KC_V;    t[0x1][0xD] = KC_W;    t[0x2][0x2] = KC_X;
    t[0x3][0x5] = KC_Y;    t[0x1][0xA] = KC_Z;
    // Number row
    t[0x1][0x6] = KC_1;    t[0x1][0xE] = KC_2;    t[0x2][0x6] = KC_3;
    t[0x2][0x5] = KC_4;    t[0x2][0xE] = KC_5;    t[0x3][0x6] = KC_6;
    t[0x3][0xD] = KC_7;    t[0x3][0xE] = KC_8;    t[0x4][0x6] = KC_9;
    t[0x4][0x5] = KC_0;
    // Punctuation and spacers
    t[0x0][0xE] = KC_GRAVE;    t[0x4][0xE] = KC_MINUS;   t[0x5][0x5] = KC_EQUAL;
    t[0x5][0x4] = KC_LBRACKET; t[0x5][0xB] = KC_RBRACKET;
    t[0x5][0xD] = KC_BSLASH;   t[0x4][0xC] = KC_SCOLON;  t[0x5][0x2] = KC_QUOTE;
    t[0x4][0x1] = KC_COMMA;    t[0x4][0x9] = KC_DOT;     t[0x4][0xA] = KC_SLASH;
    t[0x6][0x6] = KC_BSPACE;   t[0x0][0xD] = KC_TAB;     t[0x5][0xA] = KC_ENTER;
    t[0x2][0x9] = KC_SPACE;    t[0x7][0x6] = KC_ESC;
    t[0x6][0x1] = KC_NONUS_BSLASH;
    // Modifiers, native and translated positions
    t[0x1][0x4] = KC_LCTRL;  t[0x1][0x2] = KC_LSHIFT;  t[0x1][0x1] = KC_LALT;
    t[0x1][0x9] = KC_RCTRL;  t[0x5][0x9] = KC_RSHIFT;  t[0x0][0xF] = KC_RALT;
    t[0x1][0xF] = KC_LGUI;   t[0x2][0x7] = KC_RGUI;    t[0x2][0xF] = KC_APPLICATION;
    t[0x5][0x8] = KC_CAPSLOCK;
    // Locks, pause, print
    t[0x7][0x7] = KC_NUMLOCK;  t[0x7][0xE] = KC_SCROLLLOCK;
    t[0x4][0x8] = KC_PAUSE;    t[0x5][0x7] = KC_PSCREEN;  t[0x7][0xF] = KC_PSCREEN;
    // Navigation (translated E0 positions)
    t[0x6][0x7] = KC_INSERT;  t[0x6][0x8] = KC_DELETE;  t[0x6][0x5] = KC_HOME;
    t[0x6][0x4] = KC_END;     t[0x6][0xF] = KC_PGUP;    t[0x6][0xE] = KC_PGDOWN;
    t[0x6][0xD] = KC_UP;      t[0x6][0x3] = KC_DOWN;    t[0x4][0x7] = KC_LEFT;
    t[0x6][0xA] = KC_RIGHT;
    t[0x6][0x2] = KC_KP_ENTER; t[0x6][0x0] = KC_KP_SLASH;
    // Keypad
    t[0x6][0x9] = KC_KP_1;  t[0x7][0x2] = KC_KP_2;  t[0x7][0xA] = KC_KP_3;
    t[0x6][0xB] = KC_KP_4;
    t[0x6][0xC] = KC_KP_7;  t[0x7][0x3] = KC_KP_5;  t[0x7][0x4] = KC_KP_6;
    t[0x7][0x5] = KC_KP_8;  t[0x7][0xD] = KC_KP_9;  t[0x7][0x0] = KC_KP_0;
    t[0x7][0x1] = KC_KP_DOT; t[0x7][0x9] = KC_KP_PLUS; t[0x7][0xB] = KC_KP_MINUS;
    t[0x7][0xC] = KC_KP_ASTERISK;
    // ACPI and media, already translated to the shared specials
    t[0x3][0x7] = KC_SYSTEM_POWER; t[0x3][0xF] = KC_SYSTEM_SLEEP; t[0x5][0xE] = KC_SYSTEM_WAKE;
    t[0xA][0x8] = KC_AUDIO_MUTE;       t[0xA][0x9] = KC_AUDIO_VOL_UP;
    t[0xA][0xA] = KC_AUDIO_VOL_DOWN;   t[0xA][0xB] = KC_MEDIA_PLAY_PAUSE;
    t[0xA][0xC] = KC_MEDIA_NEXT_TRACK; t[0xA][0xD] = KC_MEDIA_PREV_TRACK;
    t[0xA][0xE] = KC_MEDIA_STOP;       t[0xA][0xF] = KC_CALCULATOR;
    t[0xB][0x0] = KC_MY_COMPUTER;      t[0xB][0x1] = KC_MAIL;
    t[0xB][0x3] = KC_WWW_HOME;         t[0xB][0x4] = KC_WWW_BACK;
    t[0xB][0x5] = KC_WWW_FORWARD;      t[0xB][0x6] = KC_WWW_STOP;
    t[0xB][0x7] = KC_WWW_REFRESH;
    t
};

static AT_SET2_LAYOUT: KeyboardLayout = KeyboardLayout {
    layers: &[AT_SET2_BASE],
    action_layer: None,
    shift_overrides: &[],
};

/// Stock 101/102-key enhanced keyboard on the AT or PS/2 connector.
pub static IBM_ENHANCED_AT: KeyboardConfig = KeyboardConfig {
    make: "ibm",
    model: "enhanced-at",
    description: "IBM Enhanced 101-key (AT/PS2)",
    protocol: Protocol::AtPs2,
    codeset: ScancodeSet::Set2,
    layout: &AT_SET2_LAYOUT,
};

// --- IBM 122-key terminal (Set 3) ---------------------------------------

#[rustfmt::skip]
const TERMINAL_122_BASE: Layer = {
    let mut t: Layer = [[KC_NO; 16]; 16];
    // Main block shares the Set 2 single-byte codes.
    t[0x1][0xC] = KC_A;    t[0x3][0x2] = KC_B;    t[0x2][0x1] = KC_C;
    t[0x2][0x3] = KC_D;    t[0x2][0x4] = KC_E;    t[0x2][0xB] = KC_F;
    t[0x3][0x4] = KC_G;    t[0x3][0x3] = KC_H;    t[0x4][0x3] = KC_I;
    t[0x3][0xB] = KC_J;    t[0x4][0x2] = KC_K;    t[0x4][0xB] = KC_L;
    t[0x3][0xA] = KC_M;    t[0x3][0x1] = KC_N;    t[0x4][0x4] = KC_O;
    t[0x4][0xD] = KC_P;    t[0x1][0x5] = KC_Q;    t[0x2][0xD] = KC_R;
    t[0x1][0xB] = KC_S;    t[0x2][0xC] = KC_T;    t[0x3][0xC] = KC_U;
    t[0x2][0xA] = KC_V;    t[0x1][0xD] = KC_W;    t[0x2][0x2] = KC_X;
    t[0x3][0x5] = KC_Y;    t[0x1][0xA] = KC_Z;
    t[0x1][0x6] = KC_1;    t[0x1][0xE] = KC_2;    t[0x2][0x6] = KC_3;
    t[0x2][0x5] = KC_4;    t[0x2][0xE] = KC_5;    t[0x3][0x6] = KC_6;
    t[0x3][0xD] = KC_7;    t[0x3][0xE] = KC_8;    t[0x4][0x6] = KC_9;
    t[0x4][0x5] = KC_0;
    t[0x0][0xE] = KC_GRAVE;    t[0x4][0xE] = KC_MINUS;   t[0x5][0x5] = KC_EQUAL;
    t[0x5][0x4] = KC_LBRACKET; t[0x5][0xB] = KC_RBRACKET;
    t[0x5][0xC] = KC_BSLASH;   t[0x4][0xC] = KC_SCOLON;  t[0x5][0x2] = KC_QUOTE;
    t[0x4][0x1] = KC_COMMA;    t[0x4][0x9] = KC_DOT;     t[0x4][0xA] = KC_SLASH;
    t[0x6][0x6] = KC_BSPACE;   t[0x0][0xD] = KC_TAB;     t[0x5][0xA] = KC_ENTER;
    t[0x2][0x9] = KC_SPACE;    t[0x0][0x8] = KC_ESC;
    // Terminal modifier block
    t[0x1][0x1] = KC_LCTRL;  t[0x1][0x2] = KC_LSHIFT;  t[0x1][0x9] = KC_LALT;
    t[0x5][0x8] = KC_RCTRL;  t[0x5][0x9] = KC_RSHIFT;  t[0x3][0x9] = KC_RALT;
    t[0x1][0x4] = KC_CAPSLOCK;
    // The twelve F keys on the top row...
    t[0x0][0x7] = KC_F1;   t[0x0][0xF] = KC_F2;   t[0x1][0x7] = KC_F3;
    t[0x1][0xF] = KC_F4;   t[0x2][0x7] = KC_F5;   t[0x2][0xF] = KC_F6;
    t[0x3][0x7] = KC_F7;   t[0x3][0xF] = KC_F8;   t[0x4][0x7] = KC_F9;
    t[0x4][0xF] = KC_F10;  t[0x5][0x6] = KC_F11;  t[0x5][0xE] = KC_F12;
    // ...and the second bank above them.
    t[0x0][0x9] = KC_F13;  t[0x0][0xA] = KC_F14;  t[0x0][0xB] = KC_F15;
    t[0x0][0xC] = KC_F16;  t[0x1][0x0] = KC_F17;  t[0x1][0x8] = KC_F18;
    t[0x2][0x0] = KC_F19;  t[0x2][0x8] = KC_F20;  t[0x3][0x0] = KC_F21;
    t[0x3][0x8] = KC_F22;  t[0x4][0x0] = KC_F23;  t[0x5][0x7] = KC_F24;
    // Nav island and the translated 0x7C position
    t[0x6][0x7] = KC_INSERT; t[0x6][0x4] = KC_DELETE; t[0x6][0xE] = KC_HOME;
    t[0x6][0x5] = KC_END;    t[0x6][0xF] = KC_PGUP;   t[0x6][0xD] = KC_PGDOWN;
    t[0x6][0x3] = KC_UP;     t[0x6][0x0] = KC_DOWN;   t[0x6][0x1] = KC_LEFT;
    t[0x6][0xA] = KC_RIGHT;  t[0x6][0x8] = KC_KP_ASTERISK;
    // Keypad
    t[0x6][0x9] = KC_KP_1;  t[0x7][0x2] = KC_KP_2;  t[0x7][0xA] = KC_KP_3;
    t[0x6][0xB] = KC_KP_4;  t[0x7][0x3] = KC_KP_5;  t[0x7][0x4] = KC_KP_6;
    t[0x6][0xC] = KC_KP_7;  t[0x7][0x5] = KC_KP_8;  t[0x7][0xD] = KC_KP_9;
    t[0x7][0x0] = KC_KP_0;  t[0x7][0x1] = KC_KP_DOT;
    t[0x7][0x9] = KC_KP_PLUS; t[0x7][0xB] = KC_KP_MINUS; t[0x7][0xC] = KC_KP_ENTER;
    // F7 and SysRq arrive remapped from 0x83/0x84.
    t[0x0][0x2] = KC_F7;    t[0x7][0xF] = KC_PSCREEN;
    t[0x7][0x7] = KC_NUMLOCK; t[0x7][0x6] = KC_SCROLLLOCK;
    // 0x78 is absent on the 122ST13; left unmapped on purpose.
    t
};

#[rustfmt::skip]
const TERMINAL_122_NAV: Layer = {
    // Toggle layer for PC-style use of the left function bank.
    let mut t: Layer = [[KC_TRNS; 16]; 16];
    t[0x0][0x9] = KC_PSCREEN;  t[0x0][0xA] = KC_SCROLLLOCK;
    t[0x0][0xB] = KC_PAUSE;    t[0x0][0xC] = KC_NFLP;
    t
};

static TERMINAL_122_LAYOUT: KeyboardLayout = KeyboardLayout {
    layers: &[TERMINAL_122_BASE, TERMINAL_122_NAV],
    action_layer: None,
    shift_overrides: &[],
};

/// MicroSwitch-made IBM 122-key terminal board, native Set 3.
pub static MICROSWITCH_122ST13: KeyboardConfig = KeyboardConfig {
    make: "microswitch",
    model: "122st13",
    description: "MicroSwitch 122ST13 terminal 122-key",
    protocol: Protocol::AtPs2,
    codeset: ScancodeSet::Set3,
    layout: &TERMINAL_122_LAYOUT,
};

// --- IBM PC/XT ----------------------------------------------------------

#[rustfmt::skip]
const XT_BASE: Layer = {
    let mut t: Layer = [[KC_NO; 16]; 16];
    t[0x0][0x1] = KC_ESC;
    t[0x0][0x2] = KC_1;  t[0x0][0x3] = KC_2;  t[0x0][0x4] = KC_3;
    t[0x0][0x5] = KC_4;  t[0x0][0x6] = KC_5;  t[0x0][0x7] = KC_6;
    t[0x0][0x8] = KC_7;  t[0x0][0x9] = KC_8;  t[0x0][0xA] = KC_9;
    t[0x0][0xB] = KC_0;  t[0x0][0xC] = KC_MINUS;  t[0x0][0xD] = KC_EQUAL;
    t[0x0][0xE] = KC_BSPACE;  t[0x0][0xF] = KC_TAB;
    t[0x1][0x0] = KC_Q;  t[0x1][0x1] = KC_W;  t[0x1][0x2] = KC_E;
    t[0x1][0x3] = KC_R;  t[0x1][0x4] = KC_T;  t[0x1][0x5] = KC_Y;
    t[0x1][0x6] = KC_U;  t[0x1][0x7] = KC_I;  t[0x1][0x8] = KC_O;
    t[0x1][0x9] = KC_P;  t[0x1][0xA] = KC_LBRACKET;  t[0x1][0xB] = KC_RBRACKET;
    t[0x1][0xC] = KC_ENTER;  t[0x1][0xD] = KC_LCTRL;
    t[0x1][0xE] = KC_A;  t[0x1][0xF] = KC_S;
    t[0x2][0x0] = KC_D;  t[0x2][0x1] = KC_F;  t[0x2][0x2] = KC_G;
    t[0x2][0x3] = KC_H;  t[0x2][0x4] = KC_J;  t[0x2][0x5] = KC_K;
    t[0x2][0x6] = KC_L;  t[0x2][0x7] = KC_SCOLON;  t[0x2][0x8] = KC_QUOTE;
    t[0x2][0x9] = KC_GRAVE;  t[0x2][0xA] = KC_LSHIFT;  t[0x2][0xB] = KC_BSLASH;
    t[0x2][0xC] = KC_Z;  t[0x2][0xD] = KC_X;  t[0x2][0xE] = KC_C;
    t[0x2][0xF] = KC_V;
    t[0x3][0x0] = KC_B;  t[0x3][0x1] = KC_N;  t[0x3][0x2] = KC_M;
    t[0x3][0x3] = KC_COMMA;  t[0x3][0x4] = KC_DOT;  t[0x3][0x5] = KC_SLASH;
    t[0x3][0x6] = KC_RSHIFT;  t[0x3][0x7] = KC_KP_ASTERISK;
    t[0x3][0x8] = KC_LALT;  t[0x3][0x9] = KC_SPACE;  t[0x3][0xA] = KC_CAPSLOCK;
    t[0x3][0xB] = KC_F1;  t[0x3][0xC] = KC_F2;  t[0x3][0xD] = KC_F3;
    t[0x3][0xE] = KC_F4;  t[0x3][0xF] = KC_F5;
    t[0x4][0x0] = KC_F6;  t[0x4][0x1] = KC_F7;  t[0x4][0x2] = KC_F8;
    t[0x4][0x3] = KC_F9;  t[0x4][0x4] = KC_F10;
    t[0x4][0x5] = KC_NUMLOCK;  t[0x4][0x6] = KC_SCROLLLOCK;
    t[0x4][0x7] = KC_KP_7;  t[0x4][0x8] = KC_KP_8;  t[0x4][0x9] = KC_KP_9;
    t[0x4][0xA] = KC_KP_MINUS;
    t[0x4][0xB] = KC_KP_4;  t[0x4][0xC] = KC_KP_5;  t[0x4][0xD] = KC_KP_6;
    t[0x4][0xE] = KC_KP_PLUS;
    t[0x4][0xF] = KC_KP_1;
    t[0x5][0x0] = KC_KP_2;  t[0x5][0x1] = KC_KP_3;  t[0x5][0x2] = KC_KP_0;
    t[0x5][0x3] = KC_KP_DOT;
    t[0x5][0x4] = KC_PSCREEN;  t[0x5][0x6] = KC_NONUS_BSLASH;
    t[0x5][0x7] = KC_F11;  t[0x5][0x8] = KC_F12;
    // Translated E0 positions (101-key boards in XT mode)
    t[0x5][0x9] = KC_KP_ENTER;  t[0x5][0xA] = KC_RCTRL;  t[0x5][0xB] = KC_KP_SLASH;
    t[0x5][0xC] = KC_RALT;      t[0x5][0xD] = KC_HOME;   t[0x5][0xE] = KC_UP;
    t[0x5][0xF] = KC_PGUP;
    t[0x6][0x0] = KC_LEFT;      t[0x6][0x1] = KC_RIGHT;  t[0x6][0x2] = KC_END;
    t[0x6][0x3] = KC_DOWN;      t[0x6][0x4] = KC_PGDOWN; t[0x6][0x5] = KC_INSERT;
    t[0x6][0x6] = KC_DELETE;    t[0x6][0x7] = KC_LGUI;   t[0x6][0x8] = KC_RGUI;
    t[0x6][0x9] = KC_APPLICATION;
    t[0x6][0xA] = KC_SYSTEM_POWER;  t[0x6][0xB] = KC_SYSTEM_SLEEP;
    t[0x6][0xC] = KC_SYSTEM_WAKE;   t[0x6][0xD] = KC_AUDIO_MUTE;
    t
};

static XT_LAYOUT: KeyboardLayout = KeyboardLayout {
    layers: &[XT_BASE],
    action_layer: None,
    shift_overrides: &[],
};

/// The original 83-key PC/XT board (and 101-key boards strapped to XT
/// mode).
pub static IBM_PC_XT: KeyboardConfig = KeyboardConfig {
    make: "ibm",
    model: "pc-xt",
    description: "IBM PC/XT 83-key",
    protocol: Protocol::Xt,
    codeset: ScancodeSet::Set1,
    layout: &XT_LAYOUT,
};

// --- Commodore Amiga A500 ----------------------------------------------

// Interface code = Amiga scancode + 1.
#[rustfmt::skip]
const AMIGA_BASE: Layer = {
    let mut t: Layer = [[KC_NO; 16]; 16];
    t[0x0][0x1] = KC_GRAVE;
    t[0x0][0x2] = KC_1;  t[0x0][0x3] = KC_2;  t[0x0][0x4] = KC_3;
    t[0x0][0x5] = KC_4;  t[0x0][0x6] = KC_5;  t[0x0][0x7] = KC_6;
    t[0x0][0x8] = KC_7;  t[0x0][0x9] = KC_8;  t[0x0][0xA] = KC_9;
    t[0x0][0xB] = KC_0;  t[0x0][0xC] = KC_MINUS;  t[0x0][0xD] = KC_EQUAL;
    t[0x0][0xE] = KC_BSLASH;
    t[0x1][0x0] = KC_KP_0;
    t[0x1][0x1] = KC_Q;  t[0x1][0x2] = KC_W;  t[0x1][0x3] = KC_E;
    t[0x1][0x4] = KC_R;  t[0x1][0x5] = KC_T;  t[0x1][0x6] = KC_Y;
    t[0x1][0x7] = KC_U;  t[0x1][0x8] = KC_I;  t[0x1][0x9] = KC_O;
    t[0x1][0xA] = KC_P;  t[0x1][0xB] = KC_LBRACKET;  t[0x1][0xC] = KC_RBRACKET;
    t[0x1][0xE] = KC_KP_1;  t[0x1][0xF] = KC_KP_2;
    t[0x2][0x0] = KC_KP_3;
    t[0x2][0x1] = KC_A;  t[0x2][0x2] = KC_S;  t[0x2][0x3] = KC_D;
    t[0x2][0x4] = KC_F;  t[0x2][0x5] = KC_G;  t[0x2][0x6] = KC_H;
    t[0x2][0x7] = KC_J;  t[0x2][0x8] = KC_K;  t[0x2][0x9] = KC_L;
    t[0x2][0xA] = KC_SCOLON;  t[0x2][0xB] = KC_QUOTE;
    t[0x2][0xE] = KC_KP_4;  t[0x2][0xF] = KC_KP_5;
    t[0x3][0x0] = KC_KP_6;
    t[0x3][0x1] = KC_NONUS_BSLASH;
    t[0x3][0x2] = KC_Z;  t[0x3][0x3] = KC_X;  t[0x3][0x4] = KC_C;
    t[0x3][0x5] = KC_V;  t[0x3][0x6] = KC_B;  t[0x3][0x7] = KC_N;
    t[0x3][0x8] = KC_M;  t[0x3][0x9] = KC_COMMA;  t[0x3][0xA] = KC_DOT;
    t[0x3][0xB] = KC_SLASH;
    t[0x3][0xE] = KC_KP_7;  t[0x3][0xF] = KC_KP_8;
    t[0x4][0x0] = KC_KP_9;
    t[0x4][0x1] = KC_SPACE;  t[0x4][0x2] = KC_BSPACE;  t[0x4][0x3] = KC_TAB;
    t[0x4][0x4] = KC_KP_ENTER;  t[0x4][0x5] = KC_ENTER;  t[0x4][0x6] = KC_ESC;
    t[0x4][0x7] = KC_DELETE;  t[0x4][0xB] = KC_KP_MINUS;
    t[0x4][0xD] = KC_UP;  t[0x4][0xE] = KC_DOWN;  t[0x4][0xF] = KC_RIGHT;
    t[0x5][0x0] = KC_LEFT;
    t[0x5][0x1] = KC_F1;  t[0x5][0x2] = KC_F2;  t[0x5][0x3] = KC_F3;
    t[0x5][0x4] = KC_F4;  t[0x5][0x5] = KC_F5;  t[0x5][0x6] = KC_F6;
    t[0x5][0x7] = KC_F7;  t[0x5][0x8] = KC_F8;  t[0x5][0x9] = KC_F9;
    t[0x5][0xA] = KC_F10;
    t[0x5][0xB] = KC_NFLP;        // keypad ( : no USB equivalent, repurposed
    t[0x5][0xC] = KC_SCROLLLOCK;  // keypad )
    t[0x5][0xD] = KC_KP_SLASH;  t[0x5][0xE] = KC_KP_ASTERISK;
    t[0x5][0xF] = KC_KP_PLUS;
    t[0x6][0x0] = KC_FN;          // Help
    t[0x6][0x1] = KC_LSHIFT;  t[0x6][0x2] = KC_RSHIFT;  t[0x6][0x3] = KC_CAPSLOCK;
    t[0x6][0x4] = KC_LCTRL;   t[0x6][0x5] = KC_LALT;    t[0x6][0x6] = KC_RALT;
    t[0x6][0x7] = KC_LGUI;    t[0x6][0x8] = KC_RGUI;
    t
};

#[rustfmt::skip]
const AMIGA_FN: Layer = {
    // Help-key layer: the keys an Amiga never had.
    let mut t: Layer = [[KC_TRNS; 16]; 16];
    t[0x5][0x1] = KC_F11;  t[0x5][0x2] = KC_F12;
    t[0x4][0xD] = KC_PGUP;  t[0x4][0xE] = KC_PGDOWN;
    t[0x4][0xF] = KC_END;   t[0x5][0x0] = KC_HOME;
    t[0x4][0x7] = KC_INSERT;
    t[0x5][0x3] = KC_AUDIO_MUTE;  t[0x5][0x4] = KC_AUDIO_VOL_DOWN;
    t[0x5][0x5] = KC_AUDIO_VOL_UP;
    t[0x5][0xA] = KC_PAUSE;
    t[0x4][0x6] = KC_MACRO_BOOT;  // Help+Esc jumps to the bootloader
    t
};

static AMIGA_OVERRIDE_TABLE: [u8; 128] = {
    // The Amiga legends put ( and ) on shifted 9 and 0 like USB, but its
    // shifted 2 is " rather than @; fix the pair up for USB hosts.
    let mut t = [0u8; 128];
    t[KC_2 as usize] = KC_QUOTE;
    t[KC_QUOTE as usize] = KC_2;
    t
};

static AMIGA_OVERRIDES: [ShiftOverride; 1] =
    [ShiftOverride { layer: 0, table: &AMIGA_OVERRIDE_TABLE }];

static AMIGA_LAYOUT: KeyboardLayout = KeyboardLayout {
    layers: &[AMIGA_BASE, AMIGA_FN],
    action_layer: Some(1),
    shift_overrides: &AMIGA_OVERRIDES,
};

/// Commodore Amiga A500 internal keyboard.
pub static COMMODORE_A500: KeyboardConfig = KeyboardConfig {
    make: "commodore",
    model: "a500",
    description: "Commodore Amiga A500",
    protocol: Protocol::Amiga,
    codeset: ScancodeSet::Amiga,
    layout: &AMIGA_LAYOUT,
};

// --- Apple M0110A -------------------------------------------------------

// Plain plane at code|0x40; keypad/arrow planes in 0x10..0x31 as laid
// down by the decoder tables.
#[rustfmt::skip]
const M0110A_BASE: Layer = {
    let mut t: Layer = [[KC_NO; 16]; 16];
    t[0x4][0x0] = KC_A;  t[0x4][0x1] = KC_S;  t[0x4][0x2] = KC_D;
    t[0x4][0x3] = KC_F;  t[0x4][0x4] = KC_H;  t[0x4][0x5] = KC_G;
    t[0x4][0x6] = KC_Z;  t[0x4][0x7] = KC_X;  t[0x4][0x8] = KC_C;
    t[0x4][0x9] = KC_V;  t[0x4][0xB] = KC_B;  t[0x4][0xC] = KC_Q;
    t[0x4][0xD] = KC_W;  t[0x4][0xE] = KC_E;  t[0x4][0xF] = KC_R;
    t[0x5][0x0] = KC_Y;  t[0x5][0x1] = KC_T;
    t[0x5][0x2] = KC_1;  t[0x5][0x3] = KC_2;  t[0x5][0x4] = KC_3;
    t[0x5][0x5] = KC_4;  t[0x5][0x6] = KC_6;  t[0x5][0x7] = KC_5;
    t[0x5][0x8] = KC_EQUAL;  t[0x5][0x9] = KC_9;  t[0x5][0xA] = KC_7;
    t[0x5][0xB] = KC_MINUS;  t[0x5][0xC] = KC_8;  t[0x5][0xD] = KC_0;
    t[0x5][0xE] = KC_RBRACKET;  t[0x5][0xF] = KC_O;
    t[0x6][0x0] = KC_U;  t[0x6][0x1] = KC_LBRACKET;  t[0x6][0x2] = KC_I;
    t[0x6][0x3] = KC_P;  t[0x6][0x4] = KC_ENTER;  t[0x6][0x5] = KC_L;
    t[0x6][0x6] = KC_J;  t[0x6][0x7] = KC_QUOTE;  t[0x6][0x8] = KC_K;
    t[0x6][0x9] = KC_SCOLON;  t[0x6][0xA] = KC_BSLASH;  t[0x6][0xB] = KC_COMMA;
    t[0x6][0xC] = KC_SLASH;  t[0x6][0xD] = KC_N;  t[0x6][0xE] = KC_M;
    t[0x6][0xF] = KC_DOT;
    t[0x7][0x0] = KC_TAB;  t[0x7][0x1] = KC_SPACE;  t[0x7][0x2] = KC_GRAVE;
    t[0x7][0x3] = KC_BSPACE;  t[0x7][0x4] = KC_KP_ENTER;  t[0x7][0x5] = KC_ESC;
    t[0x7][0x6] = KC_LGUI;   // Command
    t[0x7][0x8] = KC_LSHIFT;  t[0x7][0x9] = KC_CAPSLOCK;  t[0x7][0xA] = KC_LALT;
    // Keypad plane
    t[0x1][0x0] = KC_LEFT;  t[0x1][0x1] = KC_RIGHT;
    t[0x1][0x2] = KC_DOWN;  t[0x1][0x3] = KC_UP;
    t[0x2][0x0] = KC_KP_0;  t[0x2][0x1] = KC_KP_1;  t[0x2][0x2] = KC_KP_2;
    t[0x2][0x3] = KC_KP_3;  t[0x2][0x4] = KC_KP_4;  t[0x2][0x5] = KC_KP_5;
    t[0x2][0x6] = KC_KP_6;  t[0x2][0x7] = KC_KP_7;  t[0x2][0xC] = KC_KP_8;
    t[0x2][0xD] = KC_KP_9;
    t[0x2][0x8] = KC_KP_ENTER;  t[0x2][0x9] = KC_KP_DOT;  t[0x2][0xA] = KC_NUMLOCK; // Clear
    t[0x2][0xE] = KC_KP_EQUAL;  t[0x2][0xF] = KC_KP_ASTERISK;
    t[0x3][0x0] = KC_KP_PLUS;   t[0x3][0x1] = KC_KP_SLASH;
    t
};

static M0110A_LAYOUT: KeyboardLayout = KeyboardLayout {
    layers: &[M0110A_BASE],
    action_layer: None,
    shift_overrides: &[],
};

/// Apple Macintosh M0110A (the Plus keyboard with arrows and keypad).
pub static APPLE_M0110A: KeyboardConfig = KeyboardConfig {
    make: "apple",
    model: "m0110a",
    description: "Apple M0110A",
    protocol: Protocol::M0110,
    codeset: ScancodeSet::M0110,
    layout: &M0110A_LAYOUT,
};

/// Every board this firmware knows how to be built for.
pub static KEYBOARDS: &[&KeyboardConfig] = &[
    &IBM_ENHANCED_AT,
    &MICROSWITCH_122ST13,
    &IBM_PC_XT,
    &COMMODORE_A500,
    &APPLE_M0110A,
];
