//! Reliable (TCP-like) transport: retransmits with backoff until the batch
//! lands or retries run out.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use super::{Egress, EgressStats};
use crate::models::Order;

pub struct ReliableTransport {
    drop_rate: f64,
    base_delay_ms: u64,
    max_retries: u32,
    congestion_control: bool,

    /// Gauge: sends currently in flight across all threads.
    active_connections: AtomicU64,
    dropped_packets: AtomicU64,
    retransmissions: AtomicU64,
}

impl ReliableTransport {
    /// `drop_rate` is clamped into [0, 1].
    pub fn new(drop_rate: f64, base_delay_ms: u64, max_retries: u32, congestion_control: bool) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 1.0),
            base_delay_ms,
            max_retries,
            congestion_control,
            active_connections: AtomicU64::new(0),
            dropped_packets: AtomicU64::new(0),
            retransmissions: AtomicU64::new(0),
        }
    }
}

impl Default for ReliableTransport {
    fn default() -> Self {
        Self::new(0.02, 5, 3, true)
    }
}

impl Egress for ReliableTransport {
    /// Makes up to `max_retries + 1` delivery attempts. Each attempt pays
    /// the jittered base delay plus congestion delay; failed attempts that
    /// still have retries left also pay a growing backoff.
    fn send(&self, _batch: &[Order], _batch_age_us: u64) -> bool {
        let conns = self.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
        let congestion_ms = if self.congestion_control && conns > 10 {
            (conns - 10) * 2
        } else {
            0
        };

        let mut rng = rand::thread_rng();
        let mut delivered = false;

        for attempt in 0..=self.max_retries {
            let jitter: f64 = rng.gen_range(0.8..1.2);
            let delay_ms = self.base_delay_ms as f64 * jitter + congestion_ms as f64;
            thread::sleep(Duration::from_secs_f64(delay_ms / 1_000.0));

            if !rng.gen_bool(self.drop_rate) {
                delivered = true;
                break;
            }
            self.dropped_packets.fetch_add(1, Ordering::Relaxed);

            if attempt < self.max_retries {
                self.retransmissions.fetch_add(1, Ordering::Relaxed);
                let retry_ms = if self.base_delay_ms > 0 {
                    rng.gen_range(2.0 * self.base_delay_ms as f64..4.0 * self.base_delay_ms as f64)
                } else {
                    0.0
                };
                thread::sleep(Duration::from_secs_f64(
                    retry_ms * (attempt + 1) as f64 / 1_000.0,
                ));
            }
        }

        self.active_connections.fetch_sub(1, Ordering::Relaxed);
        delivered
    }

    fn stats(&self) -> EgressStats {
        EgressStats::Reliable(ReliableStats {
            active_connections: self.active_connections.load(Ordering::Relaxed),
            dropped_packets: self.dropped_packets.load(Ordering::Relaxed),
            retransmissions: self.retransmissions.load(Ordering::Relaxed),
            base_delay_ms: self.base_delay_ms,
            drop_rate: self.drop_rate,
            max_retries: self.max_retries,
            congestion_control: self.congestion_control,
        })
    }

    fn name(&self) -> &'static str {
        "reliable"
    }
}

#[derive(Debug, Clone)]
pub struct ReliableStats {
    pub active_connections: u64,
    pub dropped_packets: u64,
    pub retransmissions: u64,
    pub base_delay_ms: u64,
    pub drop_rate: f64,
    pub max_retries: u32,
    pub congestion_control: bool,
}

impl fmt::Display for ReliableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Reliable Transport Statistics ===")?;
        writeln!(f, "Active connections: {}", self.active_connections)?;
        writeln!(f, "Dropped packets: {}", self.dropped_packets)?;
        writeln!(f, "Retransmissions: {}", self.retransmissions)?;
        writeln!(f, "Base delay: {}ms", self.base_delay_ms)?;
        writeln!(f, "Drop rate: {}", self.drop_rate)?;
        writeln!(f, "Max retries: {}", self.max_retries)?;
        write!(f, "Congestion control: {}", self.congestion_control)
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, Side};

    fn batch() -> Vec<Order> {
        vec![Order::new(1, "AAPL", Side::Buy, 100.0, 10)]
    }

    fn reliable_stats(t: &ReliableTransport) -> ReliableStats {
        match t.stats() {
            EgressStats::Reliable(s) => s,
            other => panic!("unexpected stats variant {other:?}"),
        }
    }

    #[test]
    fn test_clean_wire_always_delivers() {
        let t = ReliableTransport::new(0.0, 0, 3, false);
        for _ in 0..10 {
            assert!(t.send(&batch(), 0));
        }
        let s = reliable_stats(&t);
        assert_eq!(s.dropped_packets, 0);
        assert_eq!(s.retransmissions, 0);
    }

    #[test]
    fn test_total_loss_exhausts_retries() {
        // drop_rate 1.0, max_retries 2: 3 attempts, 2 of them retransmissions
        let t = ReliableTransport::new(1.0, 0, 2, false);
        assert!(!t.send(&batch(), 0));

        let s = reliable_stats(&t);
        assert_eq!(s.dropped_packets, 3);
        assert_eq!(s.retransmissions, 2);
    }

    #[test]
    fn test_zero_retries_single_attempt() {
        let t = ReliableTransport::new(1.0, 0, 0, false);
        assert!(!t.send(&batch(), 0));

        let s = reliable_stats(&t);
        assert_eq!(s.dropped_packets, 1);
        assert_eq!(s.retransmissions, 0);
    }

    #[test]
    fn test_per_send_retry_bounds() {
        // Per send: dropped <= R+1 and retransmissions <= R
        let t = ReliableTransport::new(1.0, 0, 4, true);
        let mut prev = reliable_stats(&t);
        for _ in 0..5 {
            t.send(&batch(), 0);
            let s = reliable_stats(&t);
            assert!(s.dropped_packets - prev.dropped_packets <= 5);
            assert!(s.retransmissions - prev.retransmissions <= 4);
            // Counters are monotonic
            assert!(s.dropped_packets >= prev.dropped_packets);
            assert!(s.retransmissions >= prev.retransmissions);
            prev = s;
        }
    }

    #[test]
    fn test_gauge_returns_to_zero() {
        let t = ReliableTransport::new(0.5, 0, 1, true);
        for _ in 0..8 {
            t.send(&batch(), 0);
        }
        assert_eq!(reliable_stats(&t).active_connections, 0);
    }

    #[test]
    fn test_stats_echo_configuration() {
        let t = ReliableTransport::new(0.25, 7, 9, true);
        let s = reliable_stats(&t);
        assert_eq!(s.base_delay_ms, 7);
        assert_eq!(s.max_retries, 9);
        assert!(s.congestion_control);
        assert!((s.drop_rate - 0.25).abs() < f64::EPSILON);
    }
}
