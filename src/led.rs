//! Status LED interface.
//!
//! The core never touches LED hardware; it narrates its state through
//! abstract patterns and lets the driver pick colors and timing. Lock
//! LEDs are a separate path because on most protocols they live on the
//! keyboard itself and go back out over the wire.

/// What the status LED should be saying right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusPattern {
    Ready,
    WaitingForKeyboard,
    Bootloader,
    CommandModePrimary,
    LogLevelSelect,
    BrightnessAdjust,
}

pub trait LedDriver {
    fn set_status(&mut self, pattern: StatusPattern);
    fn set_lock_leds(&mut self, caps: bool, num: bool, scroll: bool);
    /// Brightness step `0..=10`.
    fn set_brightness(&mut self, level: u8);
}
