//! Persistent configuration.
//!
//! Two 2 KiB copies live in the last 4 KiB of flash. Writes alternate
//! between them for wear leveling, a monotonic sequence number picks the
//! newest valid copy at load, and a CRC-16/CCITT over everything after the
//! checksum field rejects torn or rotted copies. Record sizes are derived
//! from the version number, which is how both migration directions work:
//! a newer firmware overlays an older (shorter) record onto factory
//! defaults; an older firmware sees a version whose size it cannot derive
//! and falls back to defaults.
//!
//! On-flash layout, all little-endian:
//!
//! ```text
//! offset  0  magic     u32   "RP20"
//!         4  version   u16
//!         6  crc16     u16   over [8, size_for_version(version))
//!         8  sequence  u32
//!        12  payload   per-version, see Config
//! ```
//!
//! All mutation happens on the RAM copy; flash is only touched by
//! [`ConfigStore::save`], which the main loop calls at the few moments a
//! ~25 ms stall is tolerable (command-mode exit, factory reset).

pub mod crc;

use crate::log::{log_debug, log_error, log_info};
use crc::crc16_ccitt;
use packed_struct::prelude::*;

/// "RP20" little-endian.
pub const MAGIC: u32 = 0x5250_3230;

/// Current record version.
pub const VERSION: u16 = 3;

/// Each copy owns half of the final flash sector.
pub const COPY_SIZE: usize = 2048;

/// The sector both copies live in.
pub const SECTOR_SIZE: usize = 4096;

/// Opaque TLV reserve at the record tail, carried but not interpreted.
pub const STORAGE_SIZE: usize = 64;

/// Byte length of a serialized record, by version. Unknown versions have
/// no derivable size, which is exactly what invalidates records written
/// by a future firmware.
pub const fn size_for_version(version: u16) -> Option<usize> {
    match version {
        1 => Some(13),
        2 => Some(18),
        3 => Some(26 + STORAGE_SIZE),
        _ => None,
    }
}

const RECORD_SIZE: usize = match size_for_version(VERSION) {
    Some(n) => n,
    None => 0,
};

/// Flag byte of the persisted record.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct ConfigFlags {
    #[packed_field(bits = "0")]
    pub dirty: bool,
    #[packed_field(bits = "1")]
    pub shift_override_enabled: bool,
}

/// The RAM copy of the persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sequence: u32,
    pub log_level: u8,
    /// Status LED brightness, clamped to `0..=10`.
    pub led_brightness: u8,
    /// Hash of the keyboard's make/model/protocol/codeset; gates
    /// `layer_state` restoration.
    pub keyboard_id: u32,
    /// Persisted toggle-layer bitmap. Bit 0 is always set.
    pub layer_state: u8,
    /// Hash of the layer count and keymap bytes; gates `layer_state`
    /// restoration.
    pub layers_hash: u32,
    pub dirty: bool,
    pub shift_override_enabled: bool,
    pub storage: [u8; STORAGE_SIZE],
}

/// Highest brightness step.
pub const BRIGHTNESS_MAX: u8 = 10;

/// Compile-time factory defaults. New fields introduced by a version bump
/// get these values when an older record is migrated.
pub const FACTORY: Config = Config {
    sequence: 0,
    log_level: 1, // info
    led_brightness: 6,
    keyboard_id: 0,
    layer_state: 0x01,
    layers_hash: 0,
    dirty: false,
    shift_override_enabled: true,
    storage: [0; STORAGE_SIZE],
};

impl Config {
    /// Restore the toggle-layer bitmap, but only when the record was
    /// written by this firmware for this keyboard; anything else gets the
    /// base layer alone.
    pub fn gated_layer_state(&self, keyboard_id: u32, layers_hash: u32) -> u8 {
        if self.keyboard_id == keyboard_id && self.layers_hash == layers_hash {
            self.layer_state | 0x01
        } else {
            0x01
        }
    }

    pub fn set_led_brightness(&mut self, level: u8) {
        let level = if level > BRIGHTNESS_MAX { BRIGHTNESS_MAX } else { level };
        if self.led_brightness != level {
            self.led_brightness = level;
            self.dirty = true;
        }
    }
}

/// Serialize the RAM copy, current version, checksum filled in.
pub fn encode(cfg: &Config) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    buf[4..6].copy_from_slice(&VERSION.to_le_bytes());
    // crc at 6..8 is filled last
    buf[8..12].copy_from_slice(&cfg.sequence.to_le_bytes());
    buf[12] = cfg.log_level;
    buf[13] = cfg.led_brightness;
    buf[14..18].copy_from_slice(&cfg.keyboard_id.to_le_bytes());
    buf[18] = cfg.layer_state;
    buf[19..23].copy_from_slice(&cfg.layers_hash.to_le_bytes());
    let flags = ConfigFlags { dirty: cfg.dirty, shift_override_enabled: cfg.shift_override_enabled };
    // A one-byte bitfield cannot fail to pack.
    buf[23] = flags.pack().map(|b| b[0]).unwrap_or(0);
    // 24..26 reserved
    buf[26..26 + STORAGE_SIZE].copy_from_slice(&cfg.storage);
    let crc = crc16_ccitt(&buf[8..RECORD_SIZE]);
    buf[6..8].copy_from_slice(&crc.to_le_bytes());
    buf
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Validate one copy: magic, version, declared size, checksum. Returns
/// the version on success.
fn validate(buf: &[u8]) -> Option<u16> {
    if buf.len() < 12 || read_u32(buf, 0) != MAGIC {
        return None;
    }
    let version = read_u16(buf, 4);
    if version == 0 || version > VERSION + 1 {
        return None;
    }
    let size = size_for_version(version)?;
    if size > buf.len() {
        return None;
    }
    let stored = read_u16(buf, 6);
    if crc16_ccitt(&buf[8..size]) != stored {
        return None;
    }
    Some(version)
}

/// Decode a validated copy of any known version into a current-version
/// RAM record. Older versions are overlaid onto factory defaults and
/// marked dirty so the next save rewrites them at the current version.
fn decode(buf: &[u8], version: u16) -> Config {
    // Byte-level overlay: versions only ever append fields, so the old
    // payload is a prefix of the new image.
    let size = match size_for_version(version) {
        Some(s) => s,
        None => return FACTORY,
    };
    let mut image = encode(&FACTORY);
    image[8..size].copy_from_slice(&buf[8..size]);

    let flags = ConfigFlags::unpack(&[image[23]]).unwrap_or(ConfigFlags {
        dirty: false,
        shift_override_enabled: FACTORY.shift_override_enabled,
    });
    let mut storage = [0u8; STORAGE_SIZE];
    storage.copy_from_slice(&image[26..26 + STORAGE_SIZE]);
    let mut cfg = Config {
        sequence: read_u32(&image, 8),
        log_level: image[12],
        led_brightness: image[13],
        keyboard_id: read_u32(&image, 14),
        layer_state: image[18] | 0x01,
        layers_hash: read_u32(&image, 19),
        dirty: flags.dirty,
        shift_override_enabled: flags.shift_override_enabled,
        storage,
    };
    if version < VERSION {
        log_info!("config: migrating record v{=u16} -> v{=u16}", version, VERSION);
        cfg.dirty = true;
    }
    cfg
}

/// Errors out of the flash backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Offset/length outside the device.
    Bounds,
    /// The device reported an erase or program failure.
    Device,
}

/// The few flash operations the store needs. Erase granularity is one
/// copy (2 KiB); a backend whose physical sector is larger implements
/// `erase` as read-modify-write of the sibling region, trading the
/// power-loss window documented on [`ConfigStore::save`].
pub trait Flash {
    /// Total device size in bytes. The config sector is the last
    /// [`SECTOR_SIZE`] bytes.
    fn capacity(&self) -> u32;
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError>;
    fn erase(&mut self, offset: u32, len: usize) -> Result<(), FlashError>;
    fn program(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError>;
}

/// Save failures, surfaced so the caller can retry later; the RAM copy
/// stays dirty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    WriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    A,
    B,
}

impl Slot {
    fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// Dual-copy store over a [`Flash`] backend.
pub struct ConfigStore<F: Flash> {
    flash: F,
    last_source: Slot,
}

impl<F: Flash> ConfigStore<F> {
    pub fn new(flash: F) -> Self {
        // With no load yet, "not the last source" makes the first write
        // land in B, leaving A for the next one.
        ConfigStore { flash, last_source: Slot::A }
    }

    fn offset(&self, slot: Slot) -> u32 {
        let base = self.flash.capacity() - SECTOR_SIZE as u32;
        match slot {
            Slot::A => base,
            Slot::B => base + COPY_SIZE as u32,
        }
    }

    fn read_copy(&mut self, slot: Slot) -> Option<(u32, Config)> {
        let mut buf = [0u8; COPY_SIZE];
        let off = self.offset(slot);
        if self.flash.read(off, &mut buf).is_err() {
            return None;
        }
        let version = validate(&buf)?;
        let cfg = decode(&buf, version);
        Some((cfg.sequence, cfg))
    }

    /// Load the newest valid copy, or install factory defaults if both
    /// copies are gone. Returns the record and whether a valid copy was
    /// found.
    pub fn load(&mut self) -> (Config, bool) {
        let a = self.read_copy(Slot::A);
        let b = self.read_copy(Slot::B);
        let (slot, cfg) = match (a, b) {
            (Some((sa, ca)), Some((sb, cb))) => {
                if sa >= sb {
                    (Slot::A, ca)
                } else {
                    (Slot::B, cb)
                }
            }
            (Some((_, ca)), None) => (Slot::A, ca),
            (None, Some((_, cb))) => (Slot::B, cb),
            (None, None) => {
                log_error!("config: no valid copy, installing factory defaults");
                let mut cfg = FACTORY;
                cfg.dirty = true;
                if self.save(&mut cfg).is_err() {
                    log_error!("config: initial save failed");
                }
                return (cfg, false);
            }
        };
        log_debug!("config: loaded seq {=u32}", cfg.sequence);
        self.last_source = slot;
        (cfg, true)
    }

    /// Write the RAM copy back if anything changed.
    ///
    /// The target alternates away from the copy we last loaded (or last
    /// wrote), the sequence number is bumped before the checksum is
    /// computed, and the other copy is never touched — a power loss
    /// mid-write leaves it loadable. Interrupts are held off across the
    /// erase/program window; on a typical part that is ~25 ms, which is
    /// why this must never run from interrupt context.
    pub fn save(&mut self, cfg: &mut Config) -> Result<(), ConfigError> {
        if !cfg.dirty {
            return Ok(());
        }
        cfg.sequence = cfg.sequence.wrapping_add(1);
        // A record on flash is by definition not dirty; the flag is
        // cleared before serialization and re-raised on failure.
        cfg.dirty = false;
        let bytes = encode(cfg);
        let target = self.last_source.other();
        let off = self.offset(target);
        let result = critical_section::with(|_| {
            self.flash.erase(off, COPY_SIZE)?;
            self.flash.program(off, &bytes)
        });
        match result {
            Ok(()) => {
                self.last_source = target;
                log_info!("config: saved seq {=u32}", cfg.sequence);
                Ok(())
            }
            Err(_) => {
                // Dirty stays set; the other copy is still intact and the
                // caller may retry.
                cfg.dirty = true;
                log_error!("config: flash write failed");
                Err(ConfigError::WriteFailed)
            }
        }
    }

    /// Back to compile-time defaults, written out immediately.
    pub fn factory_reset(&mut self, cfg: &mut Config) -> Result<(), ConfigError> {
        let sequence = cfg.sequence;
        *cfg = FACTORY;
        cfg.sequence = sequence;
        cfg.dirty = true;
        self.save(cfg)
    }
}
