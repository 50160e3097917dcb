//! AT / PS/2 frames.
//!
//! Device-to-host, sampled on falling CLOCK edges (the device always owns
//! CLOCK):
//!
//! ```text
//! bit   0     1..8          9       10
//!     start  data LSB..MSB  parity  stop
//!      (0)                  (odd)   (1)
//! ```
//!
//! Host-to-device inverts the roles on the same 11-bit shape: the host
//! inhibits (CLOCK low >= 100 us), pulls DATA low as the start bit,
//! releases CLOCK, and then feeds one bit per falling edge while the
//! device clocks; after the stop bit the device pulls DATA low for one
//! clock as its ACK.
//!
//! Inter-byte gaps are not policed; the line can idle indefinitely
//! between frames.

use super::{Lines, WireError, WireFlags};
use crate::ring::Producer;
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Minimum time the host must hold CLOCK low to inhibit the device before
/// a host-to-device transfer.
pub const INHIBIT_US: u32 = 100;

/// If the device has not clocked out a full host-to-device frame in this
/// window, the transfer is abandoned with a handshake timeout.
pub const SEND_TIMEOUT_US: u32 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    /// Waiting for a start bit. Falling edges with DATA high are glitches
    /// and are ignored here rather than flagged.
    Idle,
    Data { byte: u8, count: u8, ones: u8 },
    Parity { byte: u8, ones: u8 },
    Stop { byte: u8, parity_ok: bool },
}

/// Device-to-host frame assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receiver {
    state: RxState,
}

impl Receiver {
    pub const fn new() -> Self {
        Receiver { state: RxState::Idle }
    }

    pub fn reset(&mut self) {
        self.state = RxState::Idle;
    }

    /// Feed the DATA level sampled at a falling CLOCK edge.
    pub fn clock_falling(&mut self, data: bool) -> Option<Result<u8, WireError>> {
        let (next, out) = match self.state {
            RxState::Idle => {
                if data {
                    (RxState::Idle, None)
                } else {
                    (RxState::Data { byte: 0, count: 0, ones: 0 }, None)
                }
            }
            RxState::Data { byte, count, ones } => {
                let byte = byte | ((data as u8) << count);
                let ones = ones + data as u8;
                if count == 7 {
                    (RxState::Parity { byte, ones }, None)
                } else {
                    (RxState::Data { byte, count: count + 1, ones }, None)
                }
            }
            RxState::Parity { byte, ones } => {
                // Odd parity: data bits plus the parity bit contain an odd
                // number of ones.
                let parity_ok = (ones + data as u8) % 2 == 1;
                (RxState::Stop { byte, parity_ok }, None)
            }
            RxState::Stop { byte, parity_ok } => {
                let out = if !data {
                    Err(WireError::Framing)
                } else if !parity_ok {
                    Err(WireError::Parity)
                } else {
                    Ok(byte)
                };
                (RxState::Idle, Some(out))
            }
        };
        self.state = next;
        out
    }
}

/// What the bus must do with the DATA line for one transmit clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxStep {
    Set(bool),
    Release,
    Done(Result<(), WireError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Data { count: u8, ones: u8 },
    Parity { ones: u8 },
    Stop,
    Ack,
}

/// Host-to-device frame serializer, fed the same falling edges as the
/// receiver. Construction happens after the inhibit/start-bit dance; see
/// [`Bus::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sender {
    byte: u8,
    state: TxState,
    started_us: u32,
}

impl Sender {
    fn new(byte: u8, now_us: u32) -> Self {
        Sender { byte, state: TxState::Data { count: 0, ones: 0 }, started_us: now_us }
    }

    fn clock_falling(&mut self, data: bool) -> TxStep {
        match self.state {
            TxState::Data { count, ones } => {
                let bit = (self.byte >> count) & 1 != 0;
                let ones = ones + bit as u8;
                self.state = if count == 7 {
                    TxState::Parity { ones }
                } else {
                    TxState::Data { count: count + 1, ones }
                };
                TxStep::Set(bit)
            }
            TxState::Parity { ones } => {
                self.state = TxState::Stop;
                TxStep::Set(ones % 2 == 0)
            }
            TxState::Stop => {
                self.state = TxState::Ack;
                TxStep::Release
            }
            TxState::Ack => {
                // The device pulls DATA low to acknowledge the frame.
                TxStep::Done(if data { Err(WireError::HandshakeTimeout) } else { Ok(()) })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    Receive,
    /// Holding CLOCK low until `release_at_us`.
    Inhibit { byte: u8, release_at_us: u32 },
    Transmit,
}

/// An AT/PS2 channel: pins, both frame state machines, and the byte queue
/// toward the scancode decoder.
pub struct Bus<'a, C, D, const N: usize> {
    lines: Lines<C, D>,
    rx: Receiver,
    tx: Option<Sender>,
    state: BusState,
    queue: Producer<'a, N>,
    flags: &'a WireFlags,
}

impl<'a, C, D, const N: usize> Bus<'a, C, D, N>
where
    C: InputPin + OutputPin,
    D: InputPin + OutputPin,
{
    pub fn new(mut lines: Lines<C, D>, queue: Producer<'a, N>, flags: &'a WireFlags) -> Self {
        lines.release_clock();
        lines.release_data();
        Bus { lines, rx: Receiver::new(), tx: None, state: BusState::Receive, queue, flags }
    }

    /// Called from the falling-CLOCK interrupt.
    pub fn on_clock_falling(&mut self, now_us: u32) {
        let data = self.lines.data_high();
        if let Some(tx) = self.tx.as_mut() {
            match tx.clock_falling(data) {
                TxStep::Set(true) | TxStep::Release => self.lines.release_data(),
                TxStep::Set(false) => self.lines.drive_data_low(),
                TxStep::Done(result) => {
                    self.tx = None;
                    self.state = BusState::Receive;
                    if let Err(e) = result {
                        self.flags.latch(e);
                    }
                }
            }
            if let Some(tx) = &self.tx {
                if now_us.wrapping_sub(tx.started_us) > SEND_TIMEOUT_US {
                    self.abort_send();
                }
            }
            return;
        }
        match self.rx.clock_falling(data) {
            None => {}
            Some(Ok(byte)) => {
                let _ = self.queue.push(byte);
            }
            Some(Err(e)) => self.flags.latch(e),
        }
    }

    /// Begin a host-to-device byte. The frame goes out over the next
    /// dozen device clocks; completion or failure is reported through the
    /// shared flags. While a transfer is still in flight the byte is not
    /// accepted.
    pub fn send(&mut self, byte: u8, now_us: u32) -> nb::Result<(), core::convert::Infallible> {
        if self.state != BusState::Receive {
            return Err(nb::Error::WouldBlock);
        }
        self.lines.drive_clock_low();
        self.rx.reset();
        self.tx = None;
        self.state = BusState::Inhibit { byte, release_at_us: now_us.wrapping_add(INHIBIT_US) };
        Ok(())
    }

    /// Advance host-side timing. Call from the main loop; cheap when idle.
    pub fn poll(&mut self, now_us: u32) {
        match self.state {
            BusState::Receive => {}
            BusState::Inhibit { byte, release_at_us } => {
                if now_us.wrapping_sub(release_at_us) < u32::MAX / 2 {
                    // Inhibit window has elapsed: start bit, then hand the
                    // clock back to the device.
                    self.lines.drive_data_low();
                    self.tx = Some(Sender::new(byte, now_us));
                    self.state = BusState::Transmit;
                    self.lines.release_clock();
                }
            }
            BusState::Transmit => {
                if let Some(tx) = &self.tx {
                    if now_us.wrapping_sub(tx.started_us) > SEND_TIMEOUT_US {
                        self.abort_send();
                    }
                }
            }
        }
    }

    fn abort_send(&mut self) {
        self.tx = None;
        self.state = BusState::Receive;
        self.lines.release_data();
        self.lines.release_clock();
        self.flags.latch(WireError::HandshakeTimeout);
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    /// Clock an 11-bit device-to-host frame into a receiver.
    fn feed_frame(rx: &mut Receiver, byte: u8, parity_flip: bool, stop: bool) -> Option<Result<u8, WireError>> {
        let mut out = None;
        let ones = byte.count_ones() as u8;
        let parity = (ones % 2 == 0) ^ parity_flip;
        out = out.or(rx.clock_falling(false)); // start
        for i in 0..8 {
            out = out.or(rx.clock_falling((byte >> i) & 1 != 0));
        }
        out = out.or(rx.clock_falling(parity));
        out.or(rx.clock_falling(stop))
    }

    #[test]
    fn frames_a_byte() {
        let mut rx = Receiver::new();
        assert_eq!(feed_frame(&mut rx, 0x1C, false, true), Some(Ok(0x1C)));
        assert_eq!(feed_frame(&mut rx, 0xF0, false, true), Some(Ok(0xF0)));
        assert_eq!(feed_frame(&mut rx, 0x00, false, true), Some(Ok(0x00)));
        assert_eq!(feed_frame(&mut rx, 0xFF, false, true), Some(Ok(0xFF)));
    }

    #[test]
    fn bad_parity_drops_byte() {
        let mut rx = Receiver::new();
        assert_eq!(feed_frame(&mut rx, 0x21, true, true), Some(Err(WireError::Parity)));
        // The next good frame still decodes.
        assert_eq!(feed_frame(&mut rx, 0x21, false, true), Some(Ok(0x21)));
    }

    #[test]
    fn low_stop_bit_is_framing() {
        let mut rx = Receiver::new();
        assert_eq!(feed_frame(&mut rx, 0x5A, false, false), Some(Err(WireError::Framing)));
    }

    #[test]
    fn glitch_edges_in_idle_are_ignored() {
        let mut rx = Receiver::new();
        assert_eq!(rx.clock_falling(true), None);
        assert_eq!(rx.clock_falling(true), None);
        assert_eq!(feed_frame(&mut rx, 0xAA, false, true), Some(Ok(0xAA)));
    }

    #[test]
    fn sender_emits_lsb_first_with_odd_parity() {
        let mut tx = Sender::new(0xED, 0);
        let mut bits = std::vec::Vec::new();
        for _ in 0..8 {
            match tx.clock_falling(true) {
                TxStep::Set(b) => bits.push(b as u8),
                other => panic!("unexpected step {:?}", other),
            }
        }
        let got: u8 = bits.iter().enumerate().map(|(i, b)| *b << i).sum();
        assert_eq!(got, 0xED);
        // 0xED has 6 ones, so odd parity is 1.
        assert_eq!(tx.clock_falling(true), TxStep::Set(true));
        assert_eq!(tx.clock_falling(true), TxStep::Release);
        // Device holds DATA low on the ack clock.
        assert_eq!(tx.clock_falling(false), TxStep::Done(Ok(())));
    }

    #[test]
    fn sender_missing_ack_times_out() {
        let mut tx = Sender::new(0x00, 0);
        for _ in 0..10 {
            tx.clock_falling(true);
        }
        assert_eq!(tx.clock_falling(true), TxStep::Done(Err(WireError::HandshakeTimeout)));
    }

    #[test]
    fn bus_sends_a_command_byte_end_to_end() {
        use crate::ring::RingBuffer;
        use crate::wire::testpins::FakePin;

        let clock = FakePin::new();
        let data = FakePin::new();
        let rb: RingBuffer<16> = RingBuffer::new();
        let (qtx, _qrx) = rb.split();
        let flags = WireFlags::new();
        let mut bus: Bus<FakePin, FakePin, 16> =
            Bus::new(Lines::new(clock.clone(), data.clone()), qtx, &flags);

        bus.send(0xED, 0).unwrap();
        // Until the inhibit window elapses, the bus holds CLOCK low and a
        // second send is refused.
        assert!(!clock.level());
        assert!(matches!(bus.send(0xF4, 50), Err(nb::Error::WouldBlock)));
        bus.poll(150);
        // Start bit presented, clock handed back to the device.
        assert!(clock.level());
        assert!(!data.level());

        // Play the keyboard: clock the frame out and read each bit.
        let mut bits = std::vec::Vec::new();
        for n in 0..11 {
            if n == 10 {
                // Ack clock: the device pulls DATA low.
                data.device_drives_low.set(true);
            }
            bus.on_clock_falling(200 + n);
            if n < 9 {
                bits.push(data.level() as u8);
            }
        }
        data.device_drives_low.set(false);

        let byte: u8 = bits[..8]
            .iter()
            .enumerate()
            .map(|(i, b)| *b << i)
            .sum();
        assert_eq!(byte, 0xED);
        // 0xED has six ones: odd parity bit set.
        assert_eq!(bits[8], 1);
        assert_eq!(flags.take(), None);
        // The bus is back to receiving.
        assert!(bus.send(0xF4, 400).is_ok());
    }
}
