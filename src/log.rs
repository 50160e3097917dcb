//! Runtime-levelled logging.
//!
//! The converter carries a single runtime log level that Command Mode can
//! change on the fly and that the config store persists across power cycles.
//! The macros forward to `defmt` when the `defmt` feature is enabled; on host
//! builds they evaluate their arguments' references and discard them, so the
//! call sites stay warning-free either way.

use core::sync::atomic::{AtomicU8, Ordering};

/// Verbosity of the log stream, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Info = 1,
    Debug = 2,
}

impl LogLevel {
    /// Decode a persisted level byte. Out-of-range values saturate to
    /// `Debug` rather than being treated as corruption; the config CRC
    /// already guards against bit rot.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Set the runtime log level.
pub fn set_level(level: LogLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current runtime log level.
pub fn level() -> LogLevel {
    LogLevel::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Whether a message at `at` passes the runtime level.
pub fn enabled(at: LogLevel) -> bool {
    at as u8 <= LEVEL.load(Ordering::Relaxed)
}

macro_rules! log_error {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if $crate::log::enabled($crate::log::LogLevel::Error) {
            #[cfg(feature = "defmt")]
            ::defmt::error!($fmt $(, $arg)*);
            #[cfg(not(feature = "defmt"))]
            { $( let _ = &$arg; )* }
        }
    }};
}

macro_rules! log_info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if $crate::log::enabled($crate::log::LogLevel::Info) {
            #[cfg(feature = "defmt")]
            ::defmt::info!($fmt $(, $arg)*);
            #[cfg(not(feature = "defmt"))]
            { $( let _ = &$arg; )* }
        }
    }};
}

macro_rules! log_debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        if $crate::log::enabled($crate::log::LogLevel::Debug) {
            #[cfg(feature = "defmt")]
            ::defmt::debug!($fmt $(, $arg)*);
            #[cfg(not(feature = "defmt"))]
            { $( let _ = &$arg; )* }
        }
    }};
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
