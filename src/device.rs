//! Keyboard bring-up and host-to-device command traffic.
//!
//! At power-up this module owns the wire: it waits out the keyboard's
//! self test, asks who it is talking to (`0xF2`), and picks the scancode
//! variant from the answer. It never switches scancode sets — terminal
//! boards that already speak Set 3 merely get `0xF8` so every key reports
//! both edges; everything else is taken as it comes, and a keyboard that
//! answers nothing at all is assumed to be an XT board that predates the
//! whole command protocol.
//!
//! The state machines here are fed time and bytes and answer with bytes
//! to transmit, so the whole bring-up sequence runs under the host test
//! harness with a scripted keyboard on the far end.

use crate::log::{log_debug, log_info};
use crate::scancode::ScancodeSet;
use crate::wire::Protocol;

/// Keyboard self-test passed (BAT).
pub const BAT_OK: u8 = 0xAA;
/// Keyboard self-test failed.
pub const BAT_FAIL: u8 = 0xFC;
/// Command acknowledge.
pub const ACK: u8 = 0xFA;
/// Ask-again from the keyboard.
pub const RESEND: u8 = 0xFE;
/// Reset the keyboard, triggering a fresh self test.
pub const CMD_RESET: u8 = 0xFF;
/// Identify.
pub const CMD_IDENTIFY: u8 = 0xF2;
/// Scancode-set command; operand 0 reads the current set without
/// changing it. Never sent with a non-zero operand.
pub const CMD_SCANCODE_SET: u8 = 0xF0;
/// Make/break reporting for all keys (Set 3 boards default some keys to
/// make-only or typematic-only).
pub const CMD_ALL_MAKE_BREAK: u8 = 0xF8;
/// Set lock LEDs; followed by the bitmap operand.
pub const CMD_SET_LEDS: u8 = 0xED;
/// Typematic rate/delay; followed by the encoded operand.
pub const CMD_TYPEMATIC: u8 = 0xF3;

/// Self-test wait, per attempt.
pub const SELF_TEST_TIMEOUT_MS: u32 = 1_000;
/// Attempts before the keyboard is declared absent.
pub const SELF_TEST_RETRIES: u8 = 3;
/// Identify response window.
pub const IDENTIFY_TIMEOUT_MS: u32 = 500;
/// Plain command acknowledge window.
pub const ACK_TIMEOUT_MS: u32 = 100;

/// One row of the identity table.
#[derive(Debug, Clone, Copy)]
pub struct IdEntry {
    pub mask: u16,
    pub value: u16,
    pub set: ScancodeSet,
    pub needs_f8: bool,
    /// The ID alone does not pin the set down; ask the board which set it
    /// is currently reporting.
    pub query_set: bool,
}

/// Known keyboard identities, first match wins. IDs are the two response
/// bytes big-endian; linear scan, the table never grows past a couple of
/// dozen rows.
#[rustfmt::skip]
pub static ID_TABLE: &[IdEntry] = &[
    // Stock AT and PS/2 boards.
    IdEntry { mask: 0xFFFF, value: 0xAB41, set: ScancodeSet::Set2, needs_f8: false, query_set: false },
    IdEntry { mask: 0xFFFF, value: 0xAB83, set: ScancodeSet::Set2, needs_f8: false, query_set: false },
    IdEntry { mask: 0xFFFF, value: 0xAB84, set: ScancodeSet::Set2, needs_f8: false, query_set: false },
    // Short/space-saver boards that ship in whichever set the firmware
    // left them in; believe what they report.
    IdEntry { mask: 0xFFFF, value: 0xAB86, set: ScancodeSet::Set2, needs_f8: false, query_set: true },
    IdEntry { mask: 0xFFFF, value: 0xAB90, set: ScancodeSet::Set2, needs_f8: false, query_set: true },
    IdEntry { mask: 0xFFFF, value: 0xAB91, set: ScancodeSet::Set2, needs_f8: false, query_set: true },
    IdEntry { mask: 0xFFFF, value: 0xAB92, set: ScancodeSet::Set2, needs_f8: false, query_set: true },
    // Terminal boards: native Set 3, and they want F8.
    IdEntry { mask: 0xFFFF, value: 0xBFBF, set: ScancodeSet::Set3, needs_f8: true, query_set: false },
    IdEntry { mask: 0xFFFF, value: 0xBFB0, set: ScancodeSet::Set3, needs_f8: true, query_set: false },
    IdEntry { mask: 0xFFFF, value: 0xBFB1, set: ScancodeSet::Set3, needs_f8: true, query_set: false },
    IdEntry { mask: 0xFFFF, value: 0x7F7F, set: ScancodeSet::Set3, needs_f8: true, query_set: false },
];

fn classify(id: u16) -> Option<&'static IdEntry> {
    ID_TABLE.iter().find(|e| id & e.mask == e.value)
}

/// The bring-up verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitResult {
    pub set: ScancodeSet,
    /// True when `0xF8` was delivered and every key reports both edges.
    pub all_make_break: bool,
    /// Identify bytes as received; `None` for keyboards that have no ID.
    pub id: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitSelfTest { deadline_ms: u32, retries: u8 },
    AwaitId { deadline_ms: u32, id: u16, got: u8 },
    AwaitSetReport { deadline_ms: u32, id: u16, acked: bool },
    AwaitF8Ack { deadline_ms: u32, result: InitResult },
    Done,
}

/// What [`DeviceInit::poll`] concluded this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitEvent {
    Pending,
    Ready(InitResult),
    /// Retries exhausted; run with an empty event stream and the
    /// waiting-for-keyboard pattern on the status LED.
    Absent,
}

/// Power-up sequencer for one keyboard.
pub struct DeviceInit {
    protocol: Protocol,
    state: State,
}

impl DeviceInit {
    pub fn new(protocol: Protocol, now_ms: u32) -> Self {
        DeviceInit {
            protocol,
            state: State::AwaitSelfTest {
                deadline_ms: now_ms.wrapping_add(SELF_TEST_TIMEOUT_MS),
                retries: 0,
            },
        }
    }

    /// Restart bring-up, e.g. after an error burst.
    pub fn restart(&mut self, now_ms: u32) {
        *self = DeviceInit::new(self.protocol, now_ms);
    }

    fn ready(&mut self, result: InitResult) -> InitEvent {
        log_info!("init: keyboard ready");
        self.state = State::Done;
        InitEvent::Ready(result)
    }

    /// Drive the sequence. `rx` is the next wire byte, if any; `tx`
    /// queues a byte for the keyboard.
    pub fn poll(
        &mut self,
        now_ms: u32,
        rx: Option<u8>,
        tx: &mut impl FnMut(u8),
    ) -> InitEvent {
        let timed_out = |deadline: u32| now_ms.wrapping_sub(deadline) < u32::MAX / 2;
        match self.state {
            State::Done => InitEvent::Pending,
            State::AwaitSelfTest { deadline_ms, retries } => {
                match (self.protocol, rx) {
                    // Amiga and M0110 boards have no BAT byte on this
                    // path; any traffic at all proves they are alive.
                    (Protocol::Amiga, Some(_)) | (Protocol::M0110, Some(_)) => {
                        return self.ready(InitResult {
                            set: fixed_set(self.protocol),
                            all_make_break: true,
                            id: None,
                        });
                    }
                    (Protocol::Xt, Some(BAT_OK)) => {
                        return self.ready(InitResult {
                            set: ScancodeSet::Set1,
                            all_make_break: false,
                            id: None,
                        });
                    }
                    (Protocol::AtPs2, Some(BAT_OK)) => {
                        tx(CMD_IDENTIFY);
                        self.state = State::AwaitId {
                            deadline_ms: now_ms.wrapping_add(IDENTIFY_TIMEOUT_MS),
                            id: 0,
                            got: 0,
                        };
                        return InitEvent::Pending;
                    }
                    (Protocol::AtPs2, Some(BAT_FAIL)) => {
                        // Treated like silence: retry below on timeout,
                        // but reset right away.
                        log_info!("init: keyboard failed self test");
                    }
                    _ => {}
                }
                if timed_out(deadline_ms) {
                    if retries >= SELF_TEST_RETRIES {
                        log_info!("init: no keyboard");
                        self.state = State::Done;
                        return InitEvent::Absent;
                    }
                    if self.protocol == Protocol::AtPs2 {
                        tx(CMD_RESET);
                    }
                    self.state = State::AwaitSelfTest {
                        deadline_ms: now_ms.wrapping_add(SELF_TEST_TIMEOUT_MS),
                        retries: retries + 1,
                    };
                }
                InitEvent::Pending
            }
            State::AwaitId { deadline_ms, id, got } => {
                match rx {
                    Some(ACK) => return InitEvent::Pending,
                    Some(byte) => {
                        let id = if got == 0 { (byte as u16) << 8 } else { id | byte as u16 };
                        let got = got + 1;
                        if got < 2 {
                            self.state = State::AwaitId { deadline_ms, id, got };
                            return InitEvent::Pending;
                        }
                        return self.classify_and_continue(now_ms, id, tx);
                    }
                    None => {}
                }
                if timed_out(deadline_ms) {
                    if got == 0 {
                        // Nothing answered the identify: an XT board on
                        // the AT connector, or a dead line. Either way,
                        // unidirectional Set 1.
                        log_info!("init: no identify response, assuming XT");
                        return self.ready(InitResult {
                            set: ScancodeSet::Set1,
                            all_make_break: false,
                            id: None,
                        });
                    }
                    // A one-byte ID; classify what we have.
                    return self.classify_and_continue(now_ms, id, tx);
                }
                InitEvent::Pending
            }
            State::AwaitSetReport { deadline_ms, id, acked } => {
                match rx {
                    Some(ACK) => {
                        self.state = State::AwaitSetReport { deadline_ms, id, acked: true };
                        return InitEvent::Pending;
                    }
                    Some(0x03) if acked => {
                        // Reporting Set 3: ask for make/break on
                        // everything.
                        tx(CMD_ALL_MAKE_BREAK);
                        self.state = State::AwaitF8Ack {
                            deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
                            result: InitResult {
                                set: ScancodeSet::Set3,
                                all_make_break: true,
                                id: Some(id),
                            },
                        };
                        return InitEvent::Pending;
                    }
                    Some(_) if acked => {
                        // Anything else (almost always 2) is taken as
                        // reported, untouched.
                        return self.ready(InitResult {
                            set: ScancodeSet::Set2,
                            all_make_break: false,
                            id: Some(id),
                        });
                    }
                    _ => {}
                }
                if timed_out(deadline_ms) {
                    // Board would not say; Set 2 is the least-wrong bet.
                    return self.ready(InitResult {
                        set: ScancodeSet::Set2,
                        all_make_break: false,
                        id: Some(id),
                    });
                }
                InitEvent::Pending
            }
            State::AwaitF8Ack { deadline_ms, result } => {
                match rx {
                    Some(ACK) => return self.ready(result),
                    Some(RESEND) => {
                        tx(CMD_ALL_MAKE_BREAK);
                        return InitEvent::Pending;
                    }
                    _ => {}
                }
                if timed_out(deadline_ms) {
                    // No ack; report make/break as not armed so the
                    // decoder can still limp along.
                    let mut r = result;
                    r.all_make_break = false;
                    return self.ready(r);
                }
                InitEvent::Pending
            }
        }
    }

    fn classify_and_continue(
        &mut self,
        now_ms: u32,
        id: u16,
        tx: &mut impl FnMut(u8),
    ) -> InitEvent {
        log_info!("init: keyboard id {=u16:x}", id);
        match classify(id) {
            Some(entry) if entry.query_set => {
                tx(CMD_SCANCODE_SET);
                tx(0x00);
                self.state = State::AwaitSetReport {
                    deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
                    id,
                    acked: false,
                };
                InitEvent::Pending
            }
            Some(entry) if entry.needs_f8 => {
                tx(CMD_ALL_MAKE_BREAK);
                self.state = State::AwaitF8Ack {
                    deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
                    result: InitResult { set: entry.set, all_make_break: true, id: Some(id) },
                };
                InitEvent::Pending
            }
            Some(entry) => self.ready(InitResult {
                set: entry.set,
                all_make_break: false,
                id: Some(id),
            }),
            None => {
                log_info!("init: unknown id, treating as set 2");
                self.ready(InitResult {
                    set: ScancodeSet::Set2,
                    all_make_break: false,
                    id: Some(id),
                })
            }
        }
    }
}

fn fixed_set(protocol: Protocol) -> ScancodeSet {
    match protocol {
        Protocol::Xt => ScancodeSet::Set1,
        Protocol::AtPs2 => ScancodeSet::Set2,
        Protocol::Amiga => ScancodeSet::Amiga,
        Protocol::M0110 => ScancodeSet::M0110,
    }
}

/// Lock-LED delivery: `0xED` plus a bitmap, each acked by the keyboard.
/// A new state queued while one is in flight supersedes it — only the
/// latest bitmap ever reaches the wire.
pub struct LockLeds {
    pending: Option<u8>,
    inflight: Option<LedStage>,
    resent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedStage {
    AwaitCmdAck { bitmap: u8, deadline_ms: u32 },
    AwaitDataAck { bitmap: u8, deadline_ms: u32 },
}

/// Lock-LED bitmap bits, per the AT command encoding.
pub const LED_SCROLL: u8 = 0x01;
pub const LED_NUM: u8 = 0x02;
pub const LED_CAPS: u8 = 0x04;

impl LockLeds {
    pub const fn new() -> Self {
        LockLeds { pending: None, inflight: None, resent: false }
    }

    /// Queue a bitmap; the latest call wins.
    pub fn set(&mut self, caps: bool, num: bool, scroll: bool) {
        let bitmap = (caps as u8 * LED_CAPS) | (num as u8 * LED_NUM) | (scroll as u8 * LED_SCROLL);
        self.pending = Some(bitmap);
    }

    /// Offer an incoming byte; returns true when it belonged to the LED
    /// exchange and must not reach the scancode decoder.
    pub fn offer(&mut self, now_ms: u32, byte: u8, tx: &mut impl FnMut(u8)) -> bool {
        match (self.inflight, byte) {
            (Some(LedStage::AwaitCmdAck { bitmap, .. }), ACK) => {
                tx(bitmap);
                self.inflight = Some(LedStage::AwaitDataAck {
                    bitmap,
                    deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
                });
                true
            }
            (Some(LedStage::AwaitDataAck { .. }), ACK) => {
                self.inflight = None;
                self.resent = false;
                true
            }
            (Some(stage), RESEND) => {
                if self.resent {
                    // Second resend in one exchange: give up, the lock
                    // lights are cosmetic.
                    log_debug!("leds: keyboard keeps asking for resends");
                    self.inflight = None;
                    self.resent = false;
                } else {
                    self.resent = true;
                    let bitmap = match stage {
                        LedStage::AwaitCmdAck { bitmap, .. }
                        | LedStage::AwaitDataAck { bitmap, .. } => bitmap,
                    };
                    tx(CMD_SET_LEDS);
                    self.inflight = Some(LedStage::AwaitCmdAck {
                        bitmap,
                        deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
                    });
                }
                true
            }
            _ => false,
        }
    }

    /// Start or abandon exchanges as time and the queue allow.
    pub fn poll(&mut self, now_ms: u32, tx: &mut impl FnMut(u8)) {
        if let Some(stage) = self.inflight {
            let deadline = match stage {
                LedStage::AwaitCmdAck { deadline_ms, .. }
                | LedStage::AwaitDataAck { deadline_ms, .. } => deadline_ms,
            };
            if now_ms.wrapping_sub(deadline) < u32::MAX / 2 {
                log_debug!("leds: ack timeout");
                self.inflight = None;
                self.resent = false;
            } else {
                return;
            }
        }
        if let Some(bitmap) = self.pending.take() {
            tx(CMD_SET_LEDS);
            self.inflight = Some(LedStage::AwaitCmdAck {
                bitmap,
                deadline_ms: now_ms.wrapping_add(ACK_TIMEOUT_MS),
            });
        }
    }
}

/// Encode the `0xF3` typematic command pair. `delay` is `0..=3` (250 ms
/// steps), `rate` is `0..=31` (30 cps down to 2 cps); both saturate.
/// The converter never relies on typematic repeat — the host does its
/// own — but boards that power up chattering are calmed with the slowest
/// setting.
pub fn typematic_command(delay: u8, rate: u8) -> [u8; 2] {
    let delay = if delay > 3 { 3 } else { delay };
    let rate = if rate > 31 { 31 } else { rate };
    [CMD_TYPEMATIC, (delay << 5) | rate]
}

/// Wire-error burst detector: three errors inside 100 ms mean the link is
/// sick enough to re-run bring-up.
pub struct ErrorSupervisor {
    stamps: [u32; 3],
    count: u8,
}

/// Burst window.
pub const ERROR_BURST_MS: u32 = 100;

impl ErrorSupervisor {
    pub const fn new() -> Self {
        ErrorSupervisor { stamps: [0; 3], count: 0 }
    }

    /// Record an error; true means re-initialize the device.
    pub fn record(&mut self, now_ms: u32) -> bool {
        // Shift the window.
        self.stamps.rotate_left(1);
        self.stamps[2] = now_ms;
        if self.count < 3 {
            self.count += 1;
        }
        if self.count == 3 && now_ms.wrapping_sub(self.stamps[0]) <= ERROR_BURST_MS {
            self.count = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use std::vec::Vec;

    /// Drive the init machine with a script of (time, incoming byte).
    fn run(
        protocol: Protocol,
        script: &[(u32, Option<u8>)],
    ) -> (InitEvent, Vec<u8>) {
        let mut init = DeviceInit::new(protocol, 0);
        let mut sent = Vec::new();
        let mut last = InitEvent::Pending;
        for &(now, byte) in script {
            let mut tx = |b| sent.push(b);
            last = init.poll(now, byte, &mut tx);
            if last != InitEvent::Pending {
                break;
            }
        }
        (last, sent)
    }

    #[test]
    fn stock_ps2_board_comes_up_in_set2() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[
                (10, Some(BAT_OK)),
                (20, Some(ACK)),
                (30, Some(0xAB)),
                (40, Some(0x83)),
            ],
        );
        assert_eq!(sent, &[CMD_IDENTIFY]);
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Set2,
                all_make_break: false,
                id: Some(0xAB83),
            }),
        );
    }

    #[test]
    fn terminal_board_gets_f8() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[
                (10, Some(BAT_OK)),
                (20, Some(0xBF)),
                (30, Some(0xBF)),
                (40, Some(ACK)),
            ],
        );
        assert_eq!(sent, &[CMD_IDENTIFY, CMD_ALL_MAKE_BREAK]);
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Set3,
                all_make_break: true,
                id: Some(0xBFBF),
            }),
        );
    }

    #[test]
    fn multi_set_board_is_asked_which_set_it_reports() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[
                (10, Some(BAT_OK)),
                (20, Some(0xAB)),
                (30, Some(0x92)),
                (40, Some(ACK)),   // ack for F0
                (50, Some(0x03)),  // currently set 3
                (60, Some(ACK)),   // ack for F8
            ],
        );
        assert_eq!(sent, &[CMD_IDENTIFY, CMD_SCANCODE_SET, 0x00, CMD_ALL_MAKE_BREAK]);
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Set3,
                all_make_break: true,
                id: Some(0xAB92),
            }),
        );
    }

    #[test]
    fn multi_set_board_reporting_set2_is_left_alone() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[
                (10, Some(BAT_OK)),
                (20, Some(0xAB)),
                (30, Some(0x86)),
                (40, Some(ACK)),
                (50, Some(0x02)),
            ],
        );
        assert_eq!(sent, &[CMD_IDENTIFY, CMD_SCANCODE_SET, 0x00]);
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Set2,
                all_make_break: false,
                id: Some(0xAB86),
            }),
        );
    }

    #[test]
    fn silent_identify_means_xt() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[(10, Some(BAT_OK)), (100, None), (511, None)],
        );
        assert_eq!(sent, &[CMD_IDENTIFY]);
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Set1,
                all_make_break: false,
                id: None,
            }),
        );
    }

    #[test]
    fn dead_line_is_absent_after_three_tries() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[(1001, None), (2002, None), (3003, None), (4004, None)],
        );
        // Three retry resets go out; the timeout after the last one gives
        // up.
        assert_eq!(sent, &[CMD_RESET, CMD_RESET, CMD_RESET]);
        assert_eq!(event, InitEvent::Absent);
    }

    #[test]
    fn amiga_is_ready_on_first_traffic() {
        let (event, sent) = run(Protocol::Amiga, &[(10, Some(0xFD))]);
        assert!(sent.is_empty());
        assert_eq!(
            event,
            InitEvent::Ready(InitResult {
                set: ScancodeSet::Amiga,
                all_make_break: true,
                id: None,
            }),
        );
    }

    #[test]
    fn lock_led_exchange() {
        let mut leds = LockLeds::new();
        let mut sent = Vec::new();
        leds.set(true, false, true);
        {
            let mut tx = |b| sent.push(b);
            leds.poll(0, &mut tx);
            assert!(leds.offer(1, ACK, &mut tx));
            assert!(leds.offer(2, ACK, &mut tx));
        }
        assert_eq!(sent, &[CMD_SET_LEDS, LED_CAPS | LED_SCROLL]);
    }

    #[test]
    fn lock_led_latest_state_wins() {
        let mut leds = LockLeds::new();
        let mut sent = Vec::new();
        leds.set(true, false, false);
        leds.set(false, true, false);
        let mut tx = |b| sent.push(b);
        leds.poll(0, &mut tx);
        leds.offer(1, ACK, &mut tx);
        leds.offer(2, ACK, &mut tx);
        assert_eq!(sent, &[CMD_SET_LEDS, LED_NUM]);
    }

    #[test]
    fn lock_led_resend_once() {
        let mut leds = LockLeds::new();
        let mut sent = Vec::new();
        leds.set(false, false, true);
        let mut tx = |b| sent.push(b);
        leds.poll(0, &mut tx);
        leds.offer(1, RESEND, &mut tx);
        leds.offer(2, ACK, &mut tx);
        leds.offer(3, ACK, &mut tx);
        assert_eq!(sent, &[CMD_SET_LEDS, CMD_SET_LEDS, LED_SCROLL]);
    }

    #[test]
    fn error_burst_triggers_reinit() {
        let mut sup = ErrorSupervisor::new();
        assert!(!sup.record(10));
        assert!(!sup.record(20));
        assert!(sup.record(30));
        // Needs a fresh burst afterwards.
        assert!(!sup.record(40));
        // Spread-out errors never trip it.
        let mut sup = ErrorSupervisor::new();
        assert!(!sup.record(0));
        assert!(!sup.record(90));
        assert!(!sup.record(200));
        assert!(!sup.record(290));
    }

    #[test]
    fn typematic_encoding_saturates() {
        assert_eq!(typematic_command(1, 10), [CMD_TYPEMATIC, 0x2A]);
        assert_eq!(typematic_command(9, 99), [CMD_TYPEMATIC, 0x7F]);
    }

    #[test]
    fn bat_failure_retries_with_reset() {
        let (event, sent) = run(
            Protocol::AtPs2,
            &[
                (10, Some(BAT_FAIL)),
                (1011, None), // timeout -> reset
                (1020, Some(BAT_OK)),
                (1030, Some(0xAB)),
                (1040, Some(0x41)),
            ],
        );
        assert_eq!(sent, &[CMD_RESET, CMD_IDENTIFY]);
        assert!(matches!(event, InitEvent::Ready(r) if r.set == ScancodeSet::Set2));
    }
}
