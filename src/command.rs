//! Command mode: converter maintenance from the attached keyboard.
//!
//! Holding both command keys (stock build: the two shifts) for three
//! seconds drops the converter into a mode where single keys adjust the
//! converter itself instead of typing. Everything lands in the RAM config
//! and is flushed by one `config_save` when the mode exits, so a session
//! of fiddling costs a single flash write.
//!
//! ```text
//! B        reboot to bootloader
//! L        log level submenu: E/I/D pick a level, anything else backs out
//! R        factory reset, save, exit
//! + / -    status LED brightness (also on the keypad)
//! S        toggle shift-override handling
//! ```
//!
//! Releasing either command key cancels a pending hold; releasing both
//! while the mode is active exits it.

use static_assertions::const_assert;

use crate::config::Config;
use crate::keycode::*;
use crate::log::{self, log_info, LogLevel};
use crate::scancode::Edge;

/// The two hold-to-enter keys, as keymap entries. Must be HID modifiers:
/// anything else would fight the dispatcher over press bookkeeping.
pub const COMMAND_KEYS: (u8, u8) = (KC_LSHIFT, KC_RSHIFT);

const_assert!(COMMAND_KEYS.0 >= 0xE0 && COMMAND_KEYS.0 <= 0xE7);
const_assert!(COMMAND_KEYS.1 >= 0xE0 && COMMAND_KEYS.1 <= 0xE7);

/// Modifier-byte mask of both command keys.
pub const COMMAND_MASK: u8 =
    (1 << (COMMAND_KEYS.0 & 0x07)) | (1 << (COMMAND_KEYS.1 & 0x07));

/// Hold time before the mode engages.
pub const HOLD_MS: u32 = 3_000;

/// The super-macro plane: while the command shift pair is active, plain
/// usages translate through this static lookup before the menu dispatch.
/// Its one entry turns `B` into the bootloader request; everything else
/// passes through unchanged.
static SUPER_MACROS: &[(u8, u8)] = &[(KC_B, KC_BOOT)];

fn super_macro(usage: u8) -> u8 {
    SUPER_MACROS
        .iter()
        .find(|(from, _)| *from == usage)
        .map(|(_, to)| *to)
        .unwrap_or(usage)
}

/// Side effects the dispatcher must carry out for the mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    None,
    /// Hold satisfied: release every reported key, switch the status LED
    /// to the command pattern, stop emitting keys.
    EnterMode,
    /// Mode left; save the config and return the LED to ready.
    ExitMode,
    /// `R`: restore factory defaults (which also saves), then exit.
    ExitModeFactoryReset,
    /// `B`: jump to the bootloader.
    Bootloader,
    /// Entered the log-level submenu.
    SubmenuLog,
    /// Left the submenu, back to the primary command pattern.
    SubmenuClosed,
    /// Brightness changed; push it at the LED driver.
    Brightness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    /// Both command keys down since `since_ms`.
    Arming { since_ms: u32 },
    Active,
    LogSelect,
}

pub struct CommandMode {
    mode: Mode,
}

impl CommandMode {
    pub const fn new() -> Self {
        CommandMode { mode: Mode::Idle }
    }

    /// True while normal key emission is suspended.
    pub fn active(&self) -> bool {
        matches!(self.mode, Mode::Active | Mode::LogSelect)
    }

    /// Hold detection and exit detection, driven once per update cycle
    /// with the current physical modifier byte.
    pub fn tick(&mut self, now_ms: u32, mods: u8) -> Effect {
        let both_held = mods & COMMAND_MASK == COMMAND_MASK;
        match self.mode {
            Mode::Idle => {
                if both_held {
                    self.mode = Mode::Arming { since_ms: now_ms };
                }
                Effect::None
            }
            Mode::Arming { since_ms } => {
                if !both_held {
                    // Partial holds do not accumulate.
                    self.mode = Mode::Idle;
                    Effect::None
                } else if now_ms.wrapping_sub(since_ms) >= HOLD_MS {
                    log_info!("command mode: enter");
                    self.mode = Mode::Active;
                    Effect::EnterMode
                } else {
                    Effect::None
                }
            }
            Mode::Active | Mode::LogSelect => {
                if mods & COMMAND_MASK == 0 {
                    log_info!("command mode: exit");
                    self.mode = Mode::Idle;
                    Effect::ExitMode
                } else {
                    Effect::None
                }
            }
        }
    }

    /// A resolved key usage arriving while the mode is active.
    pub fn on_key(&mut self, usage: u8, edge: Edge, cfg: &mut Config) -> Effect {
        if edge == Edge::Break {
            return Effect::None;
        }
        match self.mode {
            Mode::Active => self.menu_key(usage, cfg),
            Mode::LogSelect => {
                let level = match usage {
                    KC_E => Some(LogLevel::Error),
                    KC_I => Some(LogLevel::Info),
                    KC_D => Some(LogLevel::Debug),
                    _ => None,
                };
                if let Some(level) = level {
                    log::set_level(level);
                    if cfg.log_level != level as u8 {
                        cfg.log_level = level as u8;
                        cfg.dirty = true;
                    }
                }
                // Any selection, or any other key, closes the submenu.
                self.mode = Mode::Active;
                Effect::SubmenuClosed
            }
            Mode::Idle | Mode::Arming { .. } => Effect::None,
        }
    }

    fn menu_key(&mut self, usage: u8, cfg: &mut Config) -> Effect {
        match super_macro(usage) {
            KC_BOOT => Effect::Bootloader,
            KC_L => {
                self.mode = Mode::LogSelect;
                Effect::SubmenuLog
            }
            KC_R => {
                self.mode = Mode::Idle;
                Effect::ExitModeFactoryReset
            }
            KC_S => {
                cfg.shift_override_enabled = !cfg.shift_override_enabled;
                cfg.dirty = true;
                Effect::None
            }
            KC_EQUAL | KC_KP_PLUS => {
                cfg.set_led_brightness(cfg.led_brightness.saturating_add(1));
                Effect::Brightness
            }
            KC_MINUS | KC_KP_MINUS => {
                cfg.set_led_brightness(cfg.led_brightness.saturating_sub(1));
                Effect::Brightness
            }
            _ => Effect::None,
        }
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use crate::config::{FACTORY, BRIGHTNESS_MAX};

    #[test]
    fn hold_enters_after_three_seconds() {
        let mut cm = CommandMode::new();
        assert_eq!(cm.tick(0, COMMAND_MASK), Effect::None);
        assert_eq!(cm.tick(2_999, COMMAND_MASK), Effect::None);
        assert_eq!(cm.tick(3_000, COMMAND_MASK), Effect::EnterMode);
        assert!(cm.active());
    }

    #[test]
    fn partial_hold_does_not_accumulate() {
        let mut cm = CommandMode::new();
        cm.tick(0, COMMAND_MASK);
        cm.tick(2_000, 0x02); // one shift released
        assert_eq!(cm.tick(2_100, COMMAND_MASK), Effect::None);
        // The clock restarted at 2100.
        assert_eq!(cm.tick(5_000, COMMAND_MASK), Effect::None);
        assert_eq!(cm.tick(5_100, COMMAND_MASK), Effect::EnterMode);
    }

    #[test]
    fn other_modifiers_do_not_enter() {
        let mut cm = CommandMode::new();
        cm.tick(0, 0x02 | 0x01); // lshift + lctrl
        assert_eq!(cm.tick(10_000, 0x02 | 0x01), Effect::None);
    }

    #[test]
    fn releasing_both_exits() {
        let mut cm = CommandMode::new();
        cm.tick(0, COMMAND_MASK);
        cm.tick(3_000, COMMAND_MASK);
        assert!(cm.active());
        // One key still down keeps the mode.
        assert_eq!(cm.tick(3_500, 0x20), Effect::None);
        assert_eq!(cm.tick(4_000, 0), Effect::ExitMode);
        assert!(!cm.active());
    }

    fn entered() -> CommandMode {
        let mut cm = CommandMode::new();
        cm.tick(0, COMMAND_MASK);
        cm.tick(3_000, COMMAND_MASK);
        cm
    }

    #[test]
    fn bootloader_key() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        assert_eq!(cm.on_key(KC_B, Edge::Make, &mut cfg), Effect::Bootloader);
    }

    #[test]
    fn super_macro_only_rewrites_b() {
        assert_eq!(super_macro(KC_B), KC_BOOT);
        assert_eq!(super_macro(KC_L), KC_L);
        assert_eq!(super_macro(KC_EQUAL), KC_EQUAL);
    }

    #[test]
    fn log_level_submenu() {
        let _guard = crate::log::testsync::lock();
        let mut cm = entered();
        let mut cfg = FACTORY;
        assert_eq!(cm.on_key(KC_L, Edge::Make, &mut cfg), Effect::SubmenuLog);
        assert_eq!(cm.on_key(KC_D, Edge::Make, &mut cfg), Effect::SubmenuClosed);
        assert_eq!(cfg.log_level, LogLevel::Debug as u8);
        assert!(cfg.dirty);
        // Submenu is closed: D now does nothing.
        assert_eq!(cm.on_key(KC_D, Edge::Make, &mut cfg), Effect::None);
        log::set_level(LogLevel::Info);
    }

    #[test]
    fn log_submenu_exits_on_unrelated_key() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        cm.on_key(KC_L, Edge::Make, &mut cfg);
        assert_eq!(cm.on_key(KC_Z, Edge::Make, &mut cfg), Effect::SubmenuClosed);
        assert_eq!(cfg.log_level, FACTORY.log_level);
    }

    #[test]
    fn brightness_clamps_both_ways() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        for _ in 0..20 {
            cm.on_key(KC_EQUAL, Edge::Make, &mut cfg);
        }
        assert_eq!(cfg.led_brightness, BRIGHTNESS_MAX);
        for _ in 0..20 {
            cm.on_key(KC_MINUS, Edge::Make, &mut cfg);
        }
        assert_eq!(cfg.led_brightness, 0);
        assert!(cfg.dirty);
    }

    #[test]
    fn shift_override_toggle() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        let before = cfg.shift_override_enabled;
        cm.on_key(KC_S, Edge::Make, &mut cfg);
        assert_eq!(cfg.shift_override_enabled, !before);
        assert!(cfg.dirty);
    }

    #[test]
    fn factory_reset_key_exits() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        assert_eq!(cm.on_key(KC_R, Edge::Make, &mut cfg), Effect::ExitModeFactoryReset);
        assert!(!cm.active());
    }

    #[test]
    fn breaks_are_ignored() {
        let mut cm = entered();
        let mut cfg = FACTORY;
        assert_eq!(cm.on_key(KC_B, Edge::Break, &mut cfg), Effect::None);
    }
}
