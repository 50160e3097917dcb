//! Core of a legacy-keyboard-to-USB converter.
//!
//! Takes the clocked serial protocols of IBM PC/XT, AT and PS/2, IBM
//! terminal, Commodore Amiga, and Apple M0110 keyboards and turns them
//! into a normalized stream of HID key events, with layered keymaps, a
//! hold-to-enter command mode, and a dual-copy wear-leveled config record
//! in flash.
//!
//! The crate is hardware-agnostic on purpose: pins come in through
//! `embedded-hal` traits, flash through [`config::Flash`], reports leave
//! through [`hid::HidSink`], and the status LED through
//! [`led::LedDriver`]. Everything in between — frame assembly, scancode
//! state machines, keymap resolution, report bookkeeping — is plain
//! state-machine code that runs identically on the target and under the
//! host test harness.
//!
//! Data flow:
//!
//! ```text
//! CLOCK/DATA edges
//!   -> wire::*        bit decoders (real-time context)
//!   -> ring           SPSC byte queue across the interrupt boundary
//!   -> scancode::*    per-set state machines -> (interface code, edge)
//!   -> dispatch       press bookkeeping, keymap, command mode
//!   -> hid / led      boot report, consumer/system usages, patterns
//! ```
//!
//! Control flow: [`device`] owns the wire at boot (self test, identify,
//! classification), [`command`] watches for the two-key hold, [`config`]
//! is read at boot and written on explicit saves only. [`converter`]
//! ties the pieces into a polled main-loop object.

#![no_std]

pub mod log;

pub mod command;
pub mod config;
pub mod converter;
pub mod device;
pub mod dispatch;
pub mod hid;
pub mod keyboards;
pub mod keycode;
pub mod keymap;
pub mod led;
pub mod ring;
pub mod scancode;
pub mod wire;

pub use converter::Converter;
pub use dispatch::Dispatcher;
pub use keyboards::KeyboardConfig;
pub use ring::RingBuffer;
pub use scancode::{Decoder, Edge, KeyEvent, ScancodeSet};
pub use wire::{Protocol, WireError};
