//! Lock-free single-producer single-consumer byte queue.
//!
//! One of these sits between each wire decoder (the real-time producer,
//! running from an edge interrupt) and the scancode decoder (the main-loop
//! consumer). The producer only ever stores `tail`, the consumer only ever
//! stores `head`, and both sides publish with release stores and observe
//! with acquire loads, so no critical section is needed on either side.
//!
//! A full queue drops the incoming byte and latches a sticky `overrun`
//! flag. The consumer reads the flag with [`Consumer::take_overrun`] and is
//! expected to hard-reset its scancode state machine when it fires, since
//! an unknown number of bytes of a possibly multi-byte sequence are gone.
//!
//! One slot is sacrificed to distinguish full from empty, so a
//! `RingBuffer<N>` holds up to `N - 1` bytes. `N = 128` comfortably covers
//! the longest config-save blackout at AT line rate (spec'd minimum is one
//! full Set 2 Pause sequence, 8 bytes).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Default queue depth used for every protocol channel.
pub const DEPTH: usize = 128;

/// The queue storage. Create one in a `static`, then [`RingBuffer::split`]
/// it once into the two endpoints.
pub struct RingBuffer<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
    overrun: AtomicBool,
}

// The unsafe cell is only touched from the producer (writes at tail) and
// the consumer (reads at head), which never alias a live slot.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

/// Write endpoint. Owned by the wire decoder context.
pub struct Producer<'a, const N: usize> {
    rb: &'a RingBuffer<N>,
}

/// Read endpoint. Owned by the main loop.
pub struct Consumer<'a, const N: usize> {
    rb: &'a RingBuffer<N>,
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        RingBuffer {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overrun: AtomicBool::new(false),
        }
    }

    /// Split into the producer and consumer endpoints.
    ///
    /// Nothing enforces single use; the caller keeps each endpoint on its
    /// own side of the interrupt boundary, the same way the scan buffers
    /// are handed out once at init and never again.
    pub fn split(&self) -> (Producer<'_, N>, Consumer<'_, N>) {
        (Producer { rb: self }, Consumer { rb: self })
    }

    fn next(i: usize) -> usize {
        (i + 1) % N
    }
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Push one byte. On a full queue the byte is dropped and the sticky
    /// overrun flag is latched; the producer never blocks.
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        let tail = self.rb.tail.load(Ordering::Relaxed);
        let next = RingBuffer::<N>::next(tail);
        if next == self.rb.head.load(Ordering::Acquire) {
            self.rb.overrun.store(true, Ordering::Release);
            return Err(byte);
        }
        // Only this side writes `tail`, so the slot at `tail` is not
        // visible to the consumer until the store below.
        unsafe {
            (*self.rb.buf.get())[tail] = byte;
        }
        self.rb.tail.store(next, Ordering::Release);
        Ok(())
    }
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Pop the oldest byte, if any.
    pub fn pop(&mut self) -> Option<u8> {
        let head = self.rb.head.load(Ordering::Relaxed);
        if head == self.rb.tail.load(Ordering::Acquire) {
            return None;
        }
        let byte = unsafe { (*self.rb.buf.get())[head] };
        self.rb.head.store(RingBuffer::<N>::next(head), Ordering::Release);
        Some(byte)
    }

    /// Read and clear the sticky overrun flag.
    pub fn take_overrun(&mut self) -> bool {
        self.rb.overrun.swap(false, Ordering::AcqRel)
    }

    /// Number of bytes waiting.
    pub fn len(&self) -> usize {
        let head = self.rb.head.load(Ordering::Relaxed);
        let tail = self.rb.tail.load(Ordering::Acquire);
        (tail + N - head) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;

    #[test]
    fn fifo_order() {
        let rb: RingBuffer<8> = RingBuffer::new();
        let (mut tx, mut rx) = rb.split();
        for b in 0..5u8 {
            tx.push(b).unwrap();
        }
        assert_eq!(rx.len(), 5);
        for b in 0..5u8 {
            assert_eq!(rx.pop(), Some(b));
        }
        assert_eq!(rx.pop(), None);
        assert!(!rx.take_overrun());
    }

    #[test]
    fn wraps_around() {
        let rb: RingBuffer<4> = RingBuffer::new();
        let (mut tx, mut rx) = rb.split();
        for round in 0..10u8 {
            tx.push(round).unwrap();
            tx.push(round.wrapping_add(1)).unwrap();
            assert_eq!(rx.pop(), Some(round));
            assert_eq!(rx.pop(), Some(round.wrapping_add(1)));
        }
    }

    #[test]
    fn overrun_drops_byte_and_latches() {
        let rb: RingBuffer<4> = RingBuffer::new();
        let (mut tx, mut rx) = rb.split();
        tx.push(1).unwrap();
        tx.push(2).unwrap();
        tx.push(3).unwrap();
        // Capacity is N - 1; the fourth push must be dropped.
        assert_eq!(tx.push(4), Err(4));
        assert!(rx.take_overrun());
        assert!(!rx.take_overrun(), "flag is read-and-clear");
        // The queue contents survive the overrun untouched.
        assert_eq!(rx.pop(), Some(1));
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn producer_consumer_across_threads() {
        use std::sync::Arc;
        // Box the ring so both threads can reach it; on target this is a
        // `static`.
        let rb = Arc::new(RingBuffer::<DEPTH>::new());
        let rb2 = Arc::clone(&rb);
        let writer = std::thread::spawn(move || {
            let (mut tx, _) = rb2.split();
            let mut sent = 0u32;
            for b in 0..200u32 {
                while tx.push(b as u8).is_err() {
                    std::thread::yield_now();
                }
                sent += 1;
            }
            sent
        });
        let (_, mut rx) = rb.split();
        let mut got = std::vec::Vec::new();
        while got.len() < 200 {
            if let Some(b) = rx.pop() {
                got.push(b);
            }
        }
        assert_eq!(writer.join().unwrap(), 200);
        for (i, b) in got.iter().enumerate() {
            assert_eq!(*b, i as u8);
        }
    }
}
