//! Keymap evaluation: layers, actions, shift overrides, numpad flip.
//!
//! A keymap is a stack of 16x16 layers indexed by interface code (row =
//! high nibble, column = low nibble). Resolution walks the active layers
//! from the top down, takes the first non-transparent entry, and falls
//! back to `KC_NO` if even layer 0 is transparent — a lookup never
//! escapes as `TRNS`.
//!
//! The engine keeps a record of what every held key resolved to at its
//! Make, so layer changes between press and release cannot strand a key:
//! the Break undoes exactly what the Make did.

use heapless::Vec;

use crate::config::Config;
use crate::keycode::*;
use crate::log::log_debug;
use crate::scancode::{Edge, KeyEvent};

/// One layer: 16x16 keymap entries.
pub type Layer = [[u8; 16]; 16];

/// Set on a shift-override replacement to strip the shift modifiers from
/// the outgoing report while the overridden key is down.
pub const SUPPRESS_SHIFT: u8 = 0x80;

/// Both HID shift bits.
pub const SHIFT_BITS: u8 = 0x22;

/// Per-layer shift substitution, indexed by the pre-override HID usage.
/// Zero entries mean "no override"; the table as a whole is absent for
/// layers that never substitute.
pub struct ShiftOverride {
    pub layer: u8,
    pub table: &'static [u8; 128],
}

/// Everything compile-time about one keyboard's keymap.
pub struct KeyboardLayout {
    pub layers: &'static [Layer],
    /// Target of the `FN` entry, when the keyboard defines an action
    /// layer.
    pub action_layer: Option<u8>,
    pub shift_overrides: &'static [ShiftOverride],
}

/// Keypad <-> navigation involution over HID usages. Only the 11 pairs
/// move; everything else maps to itself. Keypad 5 has no navigation
/// counterpart and trades places with "no key".
static NUMPAD_FLIP: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = i as u8;
        i += 1;
    }
    let pairs: [(u8, u8); 11] = [
        (KC_KP_0, KC_INSERT),
        (KC_KP_1, KC_END),
        (KC_KP_2, KC_DOWN),
        (KC_KP_3, KC_PGDOWN),
        (KC_KP_4, KC_LEFT),
        (KC_KP_5, KC_NO),
        (KC_KP_6, KC_RIGHT),
        (KC_KP_7, KC_HOME),
        (KC_KP_8, KC_UP),
        (KC_KP_9, KC_PGUP),
        (KC_KP_DOT, KC_DELETE),
    ];
    let mut p = 0;
    while p < pairs.len() {
        let (a, b) = pairs[p];
        t[a as usize] = b;
        t[b as usize] = a;
        p += 1;
    }
    t
};

/// Apply the keypad/navigation flip to a HID usage.
pub fn numpad_flip(usage: u8) -> u8 {
    NUMPAD_FLIP[usage as usize]
}

/// Static macro expansions for the `0xD4+` keymap entries. Sequences may
/// mix usages, modifiers, and converter actions, held together for the
/// duration of the macro key's hold. One macro exists today: the
/// bootloader request, the same action Command Mode's `B` key reaches
/// through its super-macro lookup.
static MACROS: &[(u8, &[u8])] = &[(KC_MACRO_BOOT, &[KC_BOOT])];

fn macro_sequence(entry: u8) -> Option<&'static [u8]> {
    MACROS.iter().find(|(k, _)| *k == entry).map(|(_, seq)| *seq)
}

/// Layer activation state. The persisted toggle bitmap lives in the
/// config record; momentary and one-shot activations are transient and
/// die with a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct LayerState {
    momentary: u8,
    oneshot: u8,
}

/// What a resolved key event means to the report builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolved {
    None,
    Key { usage: u8, suppress_shift: bool },
    Modifier { bit: u8 },
    System { usage: u8 },
    Consumer { usage: u8 },
    Macro { seq: &'static [u8] },
    Boot,
}

/// A key currently held, with the decision taken at its Make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Held {
    code: u8,
    emit: Emit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Nothing,
    Key { usage: u8, suppress_shift: bool },
    Modifier { bit: u8 },
    System { usage: u8 },
    Consumer { usage: u8 },
    MomentaryLayer { layer: u8 },
    Macro { seq: &'static [u8] },
    Boot,
}

/// Upper bound on simultaneously held keys the engine tracks. Same order
/// of magnitude as the layout engine's state vector; beyond it, extra
/// presses resolve to nothing and their releases are ignored.
const MAX_HELD: usize = 32;

pub struct KeymapEngine {
    layout: &'static KeyboardLayout,
    layer_state: LayerState,
    flip_active: bool,
    held: Vec<Held, MAX_HELD>,
    /// Modifier bits currently held, tracked here because shift-override
    /// decisions depend on them at Make time.
    mods: u8,
}

impl KeymapEngine {
    pub fn new(layout: &'static KeyboardLayout) -> Self {
        KeymapEngine {
            layout,
            layer_state: LayerState::default(),
            flip_active: false,
            held: Vec::new(),
            mods: 0,
        }
    }

    /// Current modifier byte as tracked from modifier key events.
    pub fn mods(&self) -> u8 {
        self.mods
    }

    /// Active-layer bitmap: persisted toggles, momentary holds, pending
    /// one-shots, and always layer 0.
    fn active_mask(&self, cfg: &Config) -> u8 {
        cfg.layer_state | self.layer_state.momentary | self.layer_state.oneshot | 0x01
    }

    /// Highest active defined layer; the one whose shift-override table
    /// applies.
    fn top_layer(&self, cfg: &Config) -> u8 {
        let mask = self.active_mask(cfg);
        let mut layer = self.layout.layers.len().min(8);
        while layer > 0 {
            layer -= 1;
            if mask & (1 << layer) != 0 {
                return layer as u8;
            }
        }
        0
    }

    /// Walk the active layers top-down for the first concrete entry.
    fn resolve(&self, cfg: &Config, code: u8) -> u8 {
        let mask = self.active_mask(cfg);
        let row = (code >> 4) as usize;
        let col = (code & 0x0F) as usize;
        let mut layer = self.layout.layers.len();
        while layer > 0 {
            layer -= 1;
            if mask & (1 << layer) == 0 {
                continue;
            }
            let entry = self.layout.layers[layer][row][col];
            if entry != KC_TRNS {
                return entry;
            }
        }
        KC_NO
    }

    fn shift_override(&self, cfg: &Config, usage: u8) -> (u8, bool) {
        if !cfg.shift_override_enabled || usage > 0x7F || self.mods & SHIFT_BITS == 0 {
            return (usage, false);
        }
        let top = self.top_layer(cfg);
        let table = self.layout.shift_overrides.iter().find(|o| o.layer == top);
        match table {
            None => (usage, false),
            Some(o) => match o.table[usage as usize] {
                0 => (usage, false),
                v => (v & 0x7F, v & SUPPRESS_SHIFT != 0),
            },
        }
    }

    fn decode_make(&mut self, cfg: &mut Config, entry: u8) -> Emit {
        if is_modifier(entry) {
            let bit = modifier_bit(entry);
            self.mods |= bit;
            return Emit::Modifier { bit };
        }
        if is_hid_usage(entry) {
            let usage = if self.flip_active { numpad_flip(entry) } else { entry };
            if usage == KC_NO {
                return Emit::Nothing;
            }
            let (usage, suppress_shift) = self.shift_override(cfg, usage);
            return Emit::Key { usage, suppress_shift };
        }
        if is_system(entry) {
            return Emit::System { usage: entry };
        }
        if is_consumer(entry) {
            return Emit::Consumer { usage: entry };
        }
        if let Some(layer) = mo_layer(entry) {
            self.layer_state.momentary |= 1 << layer;
            return Emit::MomentaryLayer { layer };
        }
        if entry == KC_FN {
            return match self.layout.action_layer {
                Some(layer) => {
                    self.layer_state.momentary |= 1 << layer;
                    Emit::MomentaryLayer { layer }
                }
                None => Emit::Nothing,
            };
        }
        if let Some(layer) = tg_layer(entry) {
            cfg.layer_state ^= 1 << layer;
            cfg.layer_state |= 0x01;
            cfg.dirty = true;
            return Emit::Nothing;
        }
        if let Some(layer) = osl_layer(entry) {
            self.layer_state.oneshot |= 1 << layer;
            return Emit::Nothing;
        }
        if entry == KC_NFLP {
            self.flip_active = !self.flip_active;
            return Emit::Nothing;
        }
        if is_macro(entry) {
            return match macro_sequence(entry) {
                Some(seq) => Emit::Macro { seq },
                None => Emit::Nothing,
            };
        }
        if entry == KC_BOOT {
            return Emit::Boot;
        }
        if entry != KC_NO {
            log_debug!("keymap: reserved entry {=u8:x}", entry);
        }
        Emit::Nothing
    }

    /// Whether a Make consumed the pending one-shot activation: anything
    /// that emits, not the layer/flip bookkeeping keys themselves.
    fn consumes_oneshot(emit: &Emit) -> bool {
        !matches!(emit, Emit::Nothing | Emit::MomentaryLayer { .. })
    }

    /// Evaluate one decoder event against the keymap.
    pub fn on_event(&mut self, cfg: &mut Config, event: KeyEvent) -> Resolved {
        match event.edge {
            Edge::Make => {
                let entry = self.resolve(cfg, event.code);
                let emit = self.decode_make(cfg, entry);
                if Self::consumes_oneshot(&emit) {
                    self.layer_state.oneshot = 0;
                }
                if self.held.push(Held { code: event.code, emit }).is_err() {
                    // Over MAX_HELD keys down; drop the newcomer.
                    return Resolved::None;
                }
                Self::as_resolved(emit)
            }
            Edge::Break => {
                let idx = self.held.iter().position(|h| h.code == event.code);
                let held = match idx {
                    Some(i) => self.held.swap_remove(i),
                    None => return Resolved::None,
                };
                match held.emit {
                    Emit::Modifier { bit } => self.mods &= !bit,
                    Emit::MomentaryLayer { layer } => {
                        self.layer_state.momentary &= !(1 << layer)
                    }
                    _ => {}
                }
                Self::as_resolved(held.emit)
            }
        }
    }

    /// Forget everything held. Called on decoder hard resets; the
    /// dispatcher empties its report in the same breath.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.layer_state = LayerState::default();
        self.mods = 0;
    }

    fn as_resolved(emit: Emit) -> Resolved {
        match emit {
            Emit::Nothing | Emit::MomentaryLayer { .. } => Resolved::None,
            Emit::Key { usage, suppress_shift } => Resolved::Key { usage, suppress_shift },
            Emit::Modifier { bit } => Resolved::Modifier { bit },
            Emit::System { usage } => Resolved::System { usage },
            Emit::Consumer { usage } => Resolved::Consumer { usage },
            Emit::Macro { seq } => Resolved::Macro { seq },
            Emit::Boot => Resolved::Boot,
        }
    }
}
