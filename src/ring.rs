//! Ring - bounded lock-free MPMC queue of orders
//!
//! The shared buffer between producer and consumer threads. Every slot
//! carries its own sequence counter, so any number of producers and
//! consumers can operate on the same ring without locks:
//!
//! ```text
//! producers ──CAS head──▶ [slot][slot][slot][slot] ──CAS tail──▶ consumers
//!                           seq    seq   seq   seq
//! ```
//!
//! A producer claims a position by advancing `head`, writes its slot, then
//! publishes `seq = pos + 1` (release). A consumer may take a position only
//! once it observes that sequence (acquire), and after reading it publishes
//! `seq = pos + capacity` to hand the slot back for the next lap.
//!
//! Capacity is a power of two so positions map to slots with a single
//! bitmask. One slot is kept free so a full ring and an empty ring remain
//! distinguishable: a ring of capacity C holds at most C - 1 orders.
//!
//! `try_push`/`try_pop` never block and never yield; the `*_timeout`
//! variants poll at a 1 µs cadence for callers that can afford to wait.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::models::Order;

/// Ring construction error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("ring capacity must be a power of two >= 2, got {0}")]
    CapacityNotPowerOfTwo(usize),
}

/// Pad to a cache line so the producer and consumer cursors never share one.
#[repr(align(64))]
struct CacheAligned<T>(T);

struct Slot {
    /// Lap marker for the handshake described in the module docs.
    seq: AtomicUsize,
    value: UnsafeCell<MaybeUninit<Order>>,
}

/// Bounded lock-free MPMC queue of [`Order`]s.
pub struct OrderRing {
    slots: Box<[Slot]>,
    mask: usize,
    /// Producer cursor. Monotonic; masked down to a slot index on use.
    head: CacheAligned<AtomicUsize>,
    /// Consumer cursor.
    tail: CacheAligned<AtomicUsize>,
}

// SAFETY: a slot's payload is written only by the producer that won the
// head CAS for that position and read only by the consumer that won the
// tail CAS, with the seq release/acquire pair ordering the two.
unsafe impl Send for OrderRing {}
unsafe impl Sync for OrderRing {}

impl OrderRing {
    /// Create a ring with `capacity` slots (usable occupancy `capacity - 1`).
    pub fn with_capacity(capacity: usize) -> Result<Self, RingError> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(RingError::CapacityNotPowerOfTwo(capacity));
        }
        let slots = (0..capacity)
            .map(|i| Slot {
                seq: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Ok(Self {
            slots,
            mask: capacity - 1,
            head: CacheAligned(AtomicUsize::new(0)),
            tail: CacheAligned(AtomicUsize::new(0)),
        })
    }

    /// Push an order; returns `false` if the ring is full.
    ///
    /// Under concurrent pushes a stale `tail` read can reject slightly
    /// early; occupancy never exceeds `capacity - 1`.
    pub fn try_push(&self, order: Order) -> bool {
        let mask = self.mask;
        let mut pos = self.head.0.load(Ordering::Relaxed);
        loop {
            let tail = self.tail.0.load(Ordering::Acquire);
            if pos.wrapping_sub(tail) >= mask {
                return false;
            }
            let slot = &self.slots[pos & mask];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;
            if diff == 0 {
                if self
                    .head
                    .0
                    .compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    // Position claimed: this thread owns the slot until the
                    // release store below publishes it.
                    unsafe { (*slot.value.get()).write(order) };
                    slot.seq.store(pos.wrapping_add(1), Ordering::Release);
                    return true;
                }
                pos = self.head.0.load(Ordering::Relaxed);
            } else if diff < 0 {
                // Slot still holds last lap's entry
                return false;
            } else {
                pos = self.head.0.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop the oldest order; returns `None` if the ring is empty.
    pub fn try_pop(&self) -> Option<Order> {
        let mask = self.mask;
        let mut pos = self.tail.0.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & mask];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = seq as isize - pos.wrapping_add(1) as isize;
            if diff == 0 {
                if self
                    .tail
                    .0
                    .compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    let order = unsafe { (*slot.value.get()).assume_init_read() };
                    // Hand the slot to producers one lap ahead
                    slot.seq
                        .store(pos.wrapping_add(mask + 1), Ordering::Release);
                    return Some(order);
                }
                pos = self.tail.0.load(Ordering::Relaxed);
            } else if diff < 0 {
                return None;
            } else {
                pos = self.tail.0.load(Ordering::Relaxed);
            }
        }
    }

    /// Push, polling at 1 µs until the deadline. Returns `false` on timeout.
    pub fn push_timeout(&self, order: Order, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_push(order) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_micros(1));
        }
    }

    /// Pop, polling at 1 µs until the deadline. Returns `None` on timeout.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Order> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(order) = self.try_pop() {
                return Some(order);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_micros(1));
        }
    }

    /// Current occupancy. Concurrent pushes/pops can make the result stale
    /// by the time it returns; use it for telemetry, not control flow.
    pub fn size(&self) -> usize {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    /// True when no orders are buffered. Same staleness caveat as [`size`].
    ///
    /// [`size`]: OrderRing::size
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// True when the ring is at its usable occupancy of `capacity - 1`.
    pub fn is_full(&self) -> bool {
        self.size() >= self.mask
    }

    /// Number of slots (usable occupancy is one less).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reset to empty. Requires exclusive access, so this is only reachable
    /// during single-threaded setup or teardown.
    pub fn clear(&mut self) {
        self.head.0.store(0, Ordering::Relaxed);
        self.tail.0.store(0, Ordering::Relaxed);
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.seq.store(i, Ordering::Relaxed);
        }
    }
}

impl fmt::Debug for OrderRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderRing")
            .field("capacity", &self.capacity())
            .field("size", &self.size())
            .finish()
    }
}

// ============================================================
// TESTS
// ============================================================
