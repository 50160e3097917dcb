//! Event dispatch: decoder events in, HID reports and LED state out.
//!
//! The dispatcher owns the per-code press bitmap, which is what makes the
//! rest of the pipeline honest: duplicate Makes are swallowed (protocols
//! like the Set 2 Pause never send a break, and the M0110 repeats keys),
//! Breaks without a Make are dropped, and a decoder hard reset turns into
//! one release-all report instead of a pile of stuck keys.
//!
//! Command mode hooks in ahead of emission: while it is active, resolved
//! keys feed the menu instead of the report, and the report the host last
//! saw is an empty one.

use crate::command::{CommandMode, Effect};
use crate::config::{Config, ConfigStore, Flash};
use crate::device::LockLeds;
use crate::hid::{consumer_usage, system_usage, HidSink, KbHidReport, NkroReport};
use crate::keycode::{is_modifier, modifier_bit, KC_BOOT};
use crate::keymap::{KeyboardLayout, KeymapEngine, Resolved, SHIFT_BITS};
use crate::led::{LedDriver, StatusPattern};
use crate::log::log_info;
use crate::scancode::{Edge, KeyEvent, Output};

pub struct Dispatcher {
    engine: KeymapEngine,
    command: CommandMode,
    report: KbHidReport,
    nkro: NkroReport,
    /// One bit per interface code.
    pressed: [u32; 8],
    /// Held keys whose shift-override asked for shift suppression.
    suppress_holds: u8,
}

impl Dispatcher {
    pub fn new(layout: &'static KeyboardLayout) -> Self {
        Dispatcher {
            engine: KeymapEngine::new(layout),
            command: CommandMode::new(),
            report: KbHidReport::default(),
            nkro: NkroReport::default(),
            pressed: [0; 8],
            suppress_holds: 0,
        }
    }

    fn is_pressed(&self, code: u8) -> bool {
        self.pressed[(code >> 5) as usize] & (1 << (code & 0x1F)) != 0
    }

    fn set_pressed(&mut self, code: u8, state: bool) {
        let word = (code >> 5) as usize;
        let bit = 1u32 << (code & 0x1F);
        if state {
            self.pressed[word] |= bit;
        } else {
            self.pressed[word] &= !bit;
        }
    }

    /// Modifier byte as the host should see it right now.
    fn out_modifier(&self) -> u8 {
        let mods = self.report.modifier;
        if self.suppress_holds > 0 {
            mods & !SHIFT_BITS
        } else {
            mods
        }
    }

    fn send_report(&mut self, hid: &mut impl HidSink) {
        hid.emit_keyboard_report(self.out_modifier(), self.report.keys);
    }

    /// The NKRO view of the same state, for stacks that can carry it.
    pub fn nkro_report(&self) -> NkroReport {
        NkroReport { modifier: self.out_modifier(), ..self.nkro }
    }

    fn press_macro_element(&mut self, element: u8, press: bool) {
        if is_modifier(element) {
            let bit = modifier_bit(element);
            if press {
                self.report.modifier |= bit;
            } else {
                self.report.modifier &= !bit;
            }
        } else if press {
            self.report.press(element);
            self.nkro.press(element);
        } else {
            self.report.release(element);
            self.nkro.release(element);
        }
    }

    /// Clear everything the host might think is held.
    fn release_all(&mut self, hid: &mut impl HidSink) {
        self.report.clear();
        self.nkro.clear();
        self.pressed = [0; 8];
        self.suppress_holds = 0;
        self.engine.release_all();
        self.send_report(hid);
    }

    /// Feed one decoder output through keymap and report.
    pub fn handle<F: Flash>(
        &mut self,
        now_ms: u32,
        output: Output,
        cfg: &mut Config,
        store: &mut ConfigStore<F>,
        hid: &mut impl HidSink,
        led: &mut impl LedDriver,
    ) {
        let event = match output {
            Output::None => return,
            Output::HardReset => {
                log_info!("dispatch: decoder reset, releasing all keys");
                self.release_all(hid);
                return;
            }
            Output::Event(ev) => ev,
        };
        // Press-state reconciliation: one Make per key until its Break.
        match event.edge {
            Edge::Make if self.is_pressed(event.code) => return,
            Edge::Break if !self.is_pressed(event.code) => return,
            Edge::Make => self.set_pressed(event.code, true),
            Edge::Break => self.set_pressed(event.code, false),
        }
        let resolved = self.engine.on_event(cfg, event);
        if self.command.active() {
            // Menu consumes keys; modifiers keep flowing into the engine
            // above so exit detection still sees the shifts.
            if let Resolved::Key { usage, .. } = resolved {
                let effect = self.command.on_key(usage, event.edge, cfg);
                self.apply_effect(now_ms, effect, cfg, store, hid, led);
            }
            return;
        }
        match (resolved, event.edge) {
            (Resolved::None, _) => {}
            (Resolved::Key { usage, suppress_shift }, Edge::Make) => {
                self.report.press(usage);
                self.nkro.press(usage);
                if suppress_shift {
                    self.suppress_holds += 1;
                }
                self.send_report(hid);
            }
            (Resolved::Key { usage, suppress_shift }, Edge::Break) => {
                self.report.release(usage);
                self.nkro.release(usage);
                // The break report still goes out with the shifts
                // stripped; the restore follows as its own report.
                self.send_report(hid);
                if suppress_shift && self.suppress_holds > 0 {
                    self.suppress_holds -= 1;
                    if self.suppress_holds == 0 && self.report.modifier & SHIFT_BITS != 0 {
                        self.send_report(hid);
                    }
                }
            }
            (Resolved::Modifier { bit }, Edge::Make) => {
                self.report.modifier |= bit;
                self.send_report(hid);
            }
            (Resolved::Modifier { bit }, Edge::Break) => {
                self.report.modifier &= !bit;
                self.send_report(hid);
            }
            (Resolved::System { usage }, Edge::Make) => {
                hid.emit_system_control(system_usage(usage));
            }
            (Resolved::System { .. }, Edge::Break) => {
                hid.emit_system_control(0);
            }
            (Resolved::Consumer { usage }, Edge::Make) => {
                hid.emit_consumer_control(consumer_usage(usage));
            }
            (Resolved::Consumer { .. }, Edge::Break) => {
                hid.emit_consumer_control(0);
            }
            (Resolved::Macro { seq }, edge) => {
                let mut report_changed = false;
                for &element in seq {
                    if element == KC_BOOT {
                        // The bootloader macro: an action element, not a
                        // usage; fires on the Make only.
                        if edge == Edge::Make {
                            led.set_status(StatusPattern::Bootloader);
                            hid.request_bootloader_reset();
                        }
                    } else {
                        self.press_macro_element(element, edge == Edge::Make);
                        report_changed = true;
                    }
                }
                if report_changed {
                    self.send_report(hid);
                }
            }
            (Resolved::Boot, Edge::Make) => {
                led.set_status(StatusPattern::Bootloader);
                hid.request_bootloader_reset();
            }
            (Resolved::Boot, Edge::Break) => {}
        }
    }

    /// Once-per-update-cycle work: command-mode hold/exit detection.
    pub fn update<F: Flash>(
        &mut self,
        now_ms: u32,
        cfg: &mut Config,
        store: &mut ConfigStore<F>,
        hid: &mut impl HidSink,
        led: &mut impl LedDriver,
    ) {
        let effect = self.command.tick(now_ms, self.engine.mods());
        self.apply_effect(now_ms, effect, cfg, store, hid, led);
    }

    fn apply_effect<F: Flash>(
        &mut self,
        now_ms: u32,
        effect: Effect,
        cfg: &mut Config,
        store: &mut ConfigStore<F>,
        hid: &mut impl HidSink,
        led: &mut impl LedDriver,
    ) {
        let _ = now_ms;
        match effect {
            Effect::None => {}
            Effect::EnterMode => {
                // The engine keeps tracking the physically held keys; the
                // host stops seeing them.
                self.report.clear();
                self.nkro.clear();
                self.suppress_holds = 0;
                self.send_report(hid);
                led.set_status(StatusPattern::CommandModePrimary);
            }
            Effect::ExitMode => {
                if store.save(cfg).is_err() {
                    // Dirty stays set; the next exit retries.
                }
                led.set_status(StatusPattern::Ready);
            }
            Effect::ExitModeFactoryReset => {
                let _ = store.factory_reset(cfg);
                led.set_brightness(cfg.led_brightness);
                led.set_status(StatusPattern::Ready);
            }
            Effect::Bootloader => {
                led.set_status(StatusPattern::Bootloader);
                hid.request_bootloader_reset();
            }
            Effect::SubmenuLog => led.set_status(StatusPattern::LogLevelSelect),
            Effect::SubmenuClosed => led.set_status(StatusPattern::CommandModePrimary),
            Effect::Brightness => {
                led.set_brightness(cfg.led_brightness);
                led.set_status(StatusPattern::BrightnessAdjust);
            }
        }
    }

    /// Lock-LED state pushed down by the host. Mirrors onto the local
    /// driver and queues the wire command toward the keyboard.
    pub fn host_lock_leds(
        &mut self,
        caps: bool,
        num: bool,
        scroll: bool,
        locks: &mut LockLeds,
        led: &mut impl LedDriver,
    ) {
        led.set_lock_leds(caps, num, scroll);
        locks.set(caps, num, scroll);
    }

    /// Decoder-independent trouble (ring overrun, wire error burst):
    /// same recovery as a decoder hard reset.
    pub fn wire_trouble(&mut self, hid: &mut impl HidSink) {
        log_info!("dispatch: wire trouble, releasing all keys");
        self.release_all(hid);
    }

    /// Raw key event entry point for callers that bypass a decoder.
    pub fn handle_event<F: Flash>(
        &mut self,
        now_ms: u32,
        event: KeyEvent,
        cfg: &mut Config,
        store: &mut ConfigStore<F>,
        hid: &mut impl HidSink,
        led: &mut impl LedDriver,
    ) {
        self.handle(now_ms, Output::Event(event), cfg, store, hid, led)
    }
}
