//! The converter main loop, as a polled object.
//!
//! Owns the boot sequence and the steady-state byte pump:
//!
//! ```text
//! ring buffer -> device init          (until the keyboard is classified)
//!             -> lock-led exchange    (acks/resends while one is in flight)
//!             -> scancode decoder -> dispatcher -> HID/LED sinks
//! ```
//!
//! The real-time half (the wire bus feeding the ring) and the USB stack
//! both live outside; `poll` is called from the cooperative loop with the
//! current time, and host-bound bytes leave through the `tx` callback so
//! the caller can hand them to whichever bus owns the wire.

use crate::config::{Config, ConfigStore, Flash};
use crate::device::{DeviceInit, ErrorSupervisor, InitEvent, LockLeds};
use crate::dispatch::Dispatcher;
use crate::hid::HidSink;
use crate::keyboards::KeyboardConfig;
use crate::led::{LedDriver, StatusPattern};
use crate::log::{self, log_info};
use crate::ring::Consumer;
use crate::scancode::Decoder;
use crate::wire::WireFlags;

pub struct Converter<'a, F: Flash, const N: usize> {
    keyboard: &'static KeyboardConfig,
    queue: Consumer<'a, N>,
    flags: &'a WireFlags,
    init: DeviceInit,
    decoder: Option<Decoder>,
    dispatcher: Dispatcher,
    locks: LockLeds,
    errors: ErrorSupervisor,
    store: ConfigStore<F>,
    cfg: Config,
}

impl<'a, F: Flash, const N: usize> Converter<'a, F, N> {
    /// Boot-time construction: load config, arm the init sequencer.
    pub fn new(
        keyboard: &'static KeyboardConfig,
        flash: F,
        queue: Consumer<'a, N>,
        flags: &'a WireFlags,
        now_ms: u32,
        led: &mut impl LedDriver,
    ) -> Self {
        let mut store = ConfigStore::new(flash);
        let (mut cfg, _valid) = store.load();
        log::set_level(log::LogLevel::from_u8(cfg.log_level));

        // Honor the persisted layer bitmap only for the exact firmware it
        // was written by, then stamp the record for this build.
        let id_hash = keyboard.id_hash();
        let layers_hash = keyboard.layers_hash();
        cfg.layer_state = cfg.gated_layer_state(id_hash, layers_hash);
        if cfg.keyboard_id != id_hash || cfg.layers_hash != layers_hash {
            cfg.keyboard_id = id_hash;
            cfg.layers_hash = layers_hash;
            cfg.dirty = true;
        }

        led.set_brightness(cfg.led_brightness);
        led.set_status(StatusPattern::WaitingForKeyboard);

        Converter {
            keyboard,
            queue,
            flags,
            init: DeviceInit::new(keyboard.protocol, now_ms),
            decoder: None,
            dispatcher: Dispatcher::new(keyboard.layout),
            locks: LockLeds::new(),
            errors: ErrorSupervisor::new(),
            store,
            cfg,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// True once bring-up has settled (keyboard found or declared
    /// absent).
    pub fn running(&self) -> bool {
        self.decoder.is_some()
    }

    fn reinitialize(&mut self, now_ms: u32, hid: &mut impl HidSink, led: &mut impl LedDriver) {
        log_info!("converter: re-running keyboard bring-up");
        self.decoder = None;
        self.dispatcher.wire_trouble(hid);
        self.init.restart(now_ms);
        led.set_status(StatusPattern::WaitingForKeyboard);
    }

    /// One cooperative-loop iteration.
    pub fn poll(
        &mut self,
        now_ms: u32,
        hid: &mut impl HidSink,
        led: &mut impl LedDriver,
        tx: &mut impl FnMut(u8),
    ) {
        // Wire-level trouble first: it decides whether the bytes behind
        // it are even worth parsing.
        if let Some(_err) = self.flags.take() {
            if let Some(decoder) = &mut self.decoder {
                decoder.reset();
                if self.errors.record(now_ms) {
                    self.reinitialize(now_ms, hid, led);
                }
            }
        }
        if self.queue.take_overrun() {
            if let Some(decoder) = &mut self.decoder {
                decoder.reset();
                self.dispatcher.wire_trouble(hid);
            }
        }

        // Drain the byte queue through whoever owns the wire right now.
        while let Some(byte) = self.queue.pop() {
            if self.decoder.is_none() {
                self.step_init(now_ms, Some(byte), hid, led, tx);
                continue;
            }
            if self.locks.offer(now_ms, byte, tx) {
                continue;
            }
            if let Some(decoder) = &mut self.decoder {
                let output = decoder.feed(byte);
                self.dispatcher.handle(
                    now_ms,
                    output,
                    &mut self.cfg,
                    &mut self.store,
                    hid,
                    led,
                );
            }
        }

        if self.decoder.is_none() {
            self.step_init(now_ms, None, hid, led, tx);
        }

        self.dispatcher.update(now_ms, &mut self.cfg, &mut self.store, hid, led);
        self.locks.poll(now_ms, tx);
    }

    fn step_init(
        &mut self,
        now_ms: u32,
        byte: Option<u8>,
        _hid: &mut impl HidSink,
        led: &mut impl LedDriver,
        tx: &mut impl FnMut(u8),
    ) {
        match self.init.poll(now_ms, byte, tx) {
            InitEvent::Pending => {}
            InitEvent::Ready(result) => {
                log_info!("converter: keyboard up");
                self.decoder = Some(Decoder::new(result.set));
                led.set_status(StatusPattern::Ready);
            }
            InitEvent::Absent => {
                // Keep a decoder for the configured codeset so a keyboard
                // hotplugged later still types, but say so on the LED.
                self.decoder = Some(Decoder::new(self.keyboard.codeset));
                led.set_status(StatusPattern::WaitingForKeyboard);
            }
        }
    }

    /// Host LED state from the USB side.
    pub fn host_lock_leds(
        &mut self,
        caps: bool,
        num: bool,
        scroll: bool,
        led: &mut impl LedDriver,
    ) {
        self.dispatcher
            .host_lock_leds(caps, num, scroll, &mut self.locks, led);
    }

    /// Flush a dirty config outside command mode (e.g. before a planned
    /// reboot). No-op when clean.
    pub fn save_config(&mut self) -> Result<(), crate::config::ConfigError> {
        self.store.save(&mut self.cfg)
    }
}
