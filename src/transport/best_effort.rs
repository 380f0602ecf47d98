//! Best-effort (UDP-like) transport: fast, lossy, never retries.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use super::{Egress, EgressStats};
use crate::models::Order;

pub struct BestEffortTransport {
    drop_rate: f64,
    base_delay_us: u64,
    jitter: bool,

    packets_sent: AtomicU64,
    packets_dropped: AtomicU64,
    /// Sum of simulated wire delays across delivered packets.
    total_delay_us: AtomicU64,
}

impl BestEffortTransport {
    /// `drop_rate` is clamped into [0, 1].
    pub fn new(drop_rate: f64, base_delay_us: u64, jitter: bool) -> Self {
        Self {
            drop_rate: drop_rate.clamp(0.0, 1.0),
            base_delay_us,
            jitter,
            packets_sent: AtomicU64::new(0),
            packets_dropped: AtomicU64::new(0),
            total_delay_us: AtomicU64::new(0),
        }
    }
}

impl Default for BestEffortTransport {
    fn default() -> Self {
        Self::new(0.02, 1_000, true)
    }
}

impl Egress for BestEffortTransport {
    /// A dropped packet returns immediately; a delivered one sleeps the
    /// jittered base delay plus up to ±50 µs of noise, floored at 1 µs.
    fn send(&self, _batch: &[Order], _batch_age_us: u64) -> bool {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);

        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.drop_rate) {
            self.packets_dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let jitter: f64 = if self.jitter { rng.gen_range(0.5..1.5) } else { 1.0 };
        let noise_us: i64 = rng.gen_range(-50..=50);
        let delay_us = ((self.base_delay_us as f64 * jitter) as i64 + noise_us).max(1) as u64;

        thread::sleep(Duration::from_micros(delay_us));
        self.total_delay_us.fetch_add(delay_us, Ordering::Relaxed);
        true
    }

    fn stats(&self) -> EgressStats {
        let sent = self.packets_sent.load(Ordering::Relaxed);
        let dropped = self.packets_dropped.load(Ordering::Relaxed);
        let total_delay_us = self.total_delay_us.load(Ordering::Relaxed);
        let delivered = sent.saturating_sub(dropped);
        EgressStats::BestEffort(BestEffortStats {
            packets_sent: sent,
            packets_dropped: dropped,
            total_delay_us,
            avg_delay_us: if delivered > 0 {
                total_delay_us as f64 / delivered as f64
            } else {
                0.0
            },
            actual_drop_rate: if sent > 0 { dropped as f64 / sent as f64 } else { 0.0 },
            base_delay_us: self.base_delay_us,
            drop_rate: self.drop_rate,
        })
    }

    fn name(&self) -> &'static str {
        "best-effort"
    }
}

#[derive(Debug, Clone)]
pub struct BestEffortStats {
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub total_delay_us: u64,
    pub avg_delay_us: f64,
    pub actual_drop_rate: f64,
    pub base_delay_us: u64,
    pub drop_rate: f64,
}

impl fmt::Display for BestEffortStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Best-Effort Transport Statistics ===")?;
        writeln!(f, "Packets sent: {}", self.packets_sent)?;
        writeln!(f, "Packets dropped: {}", self.packets_dropped)?;
        writeln!(f, "Average delay: {:.2}µs", self.avg_delay_us)?;
        writeln!(f, "Actual drop rate: {:.4}", self.actual_drop_rate)?;
        writeln!(f, "Base delay: {}µs", self.base_delay_us)?;
        write!(f, "Configured drop rate: {}", self.drop_rate)
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, Side};
    use std::time::Instant;

    fn batch() -> Vec<Order> {
        vec![Order::new(1, "TSLA", Side::Sell, 180.0, 50)]
    }

    fn best_effort_stats(t: &BestEffortTransport) -> BestEffortStats {
        match t.stats() {
            EgressStats::BestEffort(s) => s,
            other => panic!("unexpected stats variant {other:?}"),
        }
    }

    #[test]
    fn test_total_loss_drops_without_delay() {
        let t = BestEffortTransport::new(1.0, 1_000, true);

        let start = Instant::now();
        assert!(!t.send(&batch(), 0));
        // No network-delay sleep on the drop path
        assert!(start.elapsed() < Duration::from_millis(50));

        let s = best_effort_stats(&t);
        assert_eq!(s.packets_sent, 1);
        assert_eq!(s.packets_dropped, 1);
        assert_eq!(s.total_delay_us, 0);
        assert!((s.actual_drop_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delivery_records_delay() {
        let t = BestEffortTransport::new(0.0, 100, false);
        assert!(t.send(&batch(), 0));

        let s = best_effort_stats(&t);
        assert_eq!(s.packets_sent, 1);
        assert_eq!(s.packets_dropped, 0);
        // 100 µs base ± 50 µs noise, floored at 1
        assert!(s.total_delay_us >= 1 && s.total_delay_us <= 150);
        assert!(s.avg_delay_us >= 1.0);
    }

    #[test]
    fn test_delay_floor_is_one_microsecond() {
        // Base 1 µs with noise down to −50 µs must still clamp to >= 1
        let t = BestEffortTransport::new(0.0, 1, true);
        for _ in 0..20 {
            t.send(&batch(), 0);
        }
        let s = best_effort_stats(&t);
        assert!(s.total_delay_us >= 20);
    }

    #[test]
    fn test_counters_monotonic() {
        let t = BestEffortTransport::new(0.5, 1, true);
        let mut prev = best_effort_stats(&t);
        for _ in 0..20 {
            t.send(&batch(), 0);
            let s = best_effort_stats(&t);
            assert!(s.packets_sent >= prev.packets_sent);
            assert!(s.packets_dropped >= prev.packets_dropped);
            assert!(s.total_delay_us >= prev.total_delay_us);
            prev = s;
        }
        assert_eq!(prev.packets_sent, 20);
    }

    #[test]
    fn test_empty_stats_have_zero_rates() {
        let t = BestEffortTransport::default();
        let s = best_effort_stats(&t);
        assert_eq!(s.avg_delay_us, 0.0);
        assert_eq!(s.actual_drop_rate, 0.0);
    }
}
