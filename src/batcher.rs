//! Batcher - time-and-size windowed batch accumulator
//!
//! Collects orders popped off the ring and hands them to an egress sink as
//! a batch. A flush happens on whichever trigger fires first:
//!
//! 1. **Size**: the buffer reaches `batch_size` (checked inside [`add`]).
//! 2. **Age**: the oldest buffered order is `timeout` old (checked only
//!    when the owner calls [`check_timeout`]; the batcher has no timer
//!    thread, so drive it from the consumer loop at a cadence finer than
//!    the timeout).
//!
//! The batcher is single-threaded by construction (`&mut self` on every
//! operation); each consumer owns its own instance. The sink receives the
//! batch and its age in microseconds and reports nothing back: delivery
//! success is the transport's business, and a failed batch is not requeued.
//!
//! [`add`]: Batcher::add
//! [`check_timeout`]: Batcher::check_timeout

use std::time::{Duration, Instant};

use crate::models::Order;

/// Receives each flushed batch along with its age in microseconds.
pub type BatchSink = Box<dyn FnMut(&[Order], u64) + Send>;

pub struct Batcher {
    buffer: Vec<Order>,
    batch_size: usize,
    timeout: Duration,
    /// Set when the first order enters an empty buffer; cleared on flush.
    first_arrival: Option<Instant>,
    sink: BatchSink,
}

impl Batcher {
    pub fn new(batch_size: usize, timeout: Duration, sink: BatchSink) -> Self {
        Self {
            buffer: Vec::with_capacity(batch_size),
            batch_size,
            timeout,
            first_arrival: None,
            sink,
        }
    }

    /// Append an order, flushing if the buffer reaches `batch_size`.
    pub fn add(&mut self, order: Order) {
        if self.buffer.is_empty() {
            self.first_arrival = Some(Instant::now());
        }
        self.buffer.push(order);
        if self.buffer.len() >= self.batch_size {
            self.flush();
        }
    }

    /// Flush if the buffered batch has aged past the timeout.
    /// Returns true iff a flush occurred.
    pub fn check_timeout(&mut self) -> bool {
        match self.first_arrival {
            Some(first) if !self.buffer.is_empty() && first.elapsed() >= self.timeout => {
                self.flush();
                true
            }
            _ => false,
        }
    }

    /// Flush whatever is buffered; no-op when empty.
    pub fn force_flush(&mut self) {
        if !self.buffer.is_empty() {
            self.flush();
        }
    }

    /// Number of orders currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn flush(&mut self) {
        let age_us = self
            .first_arrival
            .map(|first| first.elapsed().as_micros() as u64)
            .unwrap_or(0);
        (self.sink)(&self.buffer, age_us);
        self.buffer.clear();
        self.first_arrival = None;
    }
}

// ============================================================
// TESTS
// ============================================================
