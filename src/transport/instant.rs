//! Instant (shared-memory-like) transport: never fails, optionally adds
//! nanosecond-scale timing noise.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use super::{Egress, EgressStats};
use crate::models::Order;

pub struct InstantTransport {
    noise_enabled: bool,
    noise_range_ns: u64,

    messages_sent: AtomicU64,
    /// Observed send latencies in ns; min starts at MAX until the first send.
    min_delay_ns: AtomicU64,
    max_delay_ns: AtomicU64,
    total_delay_ns: AtomicU64,
}

impl InstantTransport {
    pub fn new(noise_enabled: bool, noise_range_ns: u64) -> Self {
        Self {
            noise_enabled,
            noise_range_ns,
            messages_sent: AtomicU64::new(0),
            min_delay_ns: AtomicU64::new(u64::MAX),
            max_delay_ns: AtomicU64::new(0),
            total_delay_ns: AtomicU64::new(0),
        }
    }
}

impl Default for InstantTransport {
    fn default() -> Self {
        Self::new(true, 100)
    }
}

impl Egress for InstantTransport {
    /// Noise draws are uniform over ±noise_range_ns. Only positive draws
    /// sleep; a negative draw models a better-than-expected tick and costs
    /// nothing.
    fn send(&self, _batch: &[Order], _batch_age_us: u64) -> bool {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        if self.noise_enabled && self.noise_range_ns > 0 {
            let range = self.noise_range_ns as i64;
            let noise_ns: i64 = rand::thread_rng().gen_range(-range..=range);
            if noise_ns > 0 {
                thread::sleep(Duration::from_nanos(noise_ns as u64));
            }
        }
        let elapsed_ns = start.elapsed().as_nanos() as u64;

        self.min_delay_ns.fetch_min(elapsed_ns, Ordering::Relaxed);
        self.max_delay_ns.fetch_max(elapsed_ns, Ordering::Relaxed);
        self.total_delay_ns.fetch_add(elapsed_ns, Ordering::Relaxed);
        true
    }

    fn stats(&self) -> EgressStats {
        let sent = self.messages_sent.load(Ordering::Relaxed);
        let min = self.min_delay_ns.load(Ordering::Relaxed);
        EgressStats::Instant(InstantStats {
            messages_sent: sent,
            min_delay_ns: if min == u64::MAX { 0 } else { min },
            max_delay_ns: self.max_delay_ns.load(Ordering::Relaxed),
            avg_delay_ns: if sent > 0 {
                self.total_delay_ns.load(Ordering::Relaxed) as f64 / sent as f64
            } else {
                0.0
            },
            noise_enabled: self.noise_enabled,
            noise_range_ns: self.noise_range_ns,
        })
    }

    fn name(&self) -> &'static str {
        "instant"
    }
}

#[derive(Debug, Clone)]
pub struct InstantStats {
    pub messages_sent: u64,
    pub min_delay_ns: u64,
    pub max_delay_ns: u64,
    pub avg_delay_ns: f64,
    pub noise_enabled: bool,
    pub noise_range_ns: u64,
}

impl fmt::Display for InstantStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Instant Transport Statistics ===")?;
        writeln!(f, "Messages sent: {}", self.messages_sent)?;
        writeln!(f, "Average delay: {:.1}ns", self.avg_delay_ns)?;
        writeln!(f, "Min delay: {}ns", self.min_delay_ns)?;
        writeln!(f, "Max delay: {}ns", self.max_delay_ns)?;
        writeln!(f, "Noise enabled: {}", self.noise_enabled)?;
        write!(f, "Noise range: {}ns", self.noise_range_ns)
    }
}

// ============================================================
// TESTS
// ============================================================
