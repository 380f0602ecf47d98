//! Pipeline - shared counters and shutdown signalling
//!
//! The state shared by every worker thread: a block of atomic counters for
//! telemetry and the cooperative shutdown flags. Both are plain atomics;
//! workers never block on each other through this module.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ============================================================
// PIPELINE STATISTICS
// ============================================================

/// Counters accumulated across all workers for the lifetime of a run.
///
/// All counters are monotonic. Increments are relaxed; the snapshot taken
/// for telemetry may be slightly torn across fields, which is fine for
/// reporting.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Orders successfully pushed onto the ring (drops on a full ring are
    /// not counted).
    pub orders_produced: AtomicU64,
    /// Orders delivered to the egress inside a successful batch send.
    pub orders_consumed: AtomicU64,
    /// Batches the egress accepted.
    pub batches_sent: AtomicU64,
    /// Batches the egress ultimately dropped. Not requeued.
    pub batches_dropped: AtomicU64,
    /// Sum of batch ages at flush time, for the average latency figure.
    pub total_batch_latency_us: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_produced(&self) {
        self.orders_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_consumed(&self, count: u64) {
        self.orders_consumed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn incr_batches_sent(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_batches_dropped(&self) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_batch_latency(&self, age_us: u64) {
        self.total_batch_latency_us.fetch_add(age_us, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            orders_produced: self.orders_produced.load(Ordering::Relaxed),
            orders_consumed: self.orders_consumed.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            total_batch_latency_us: self.total_batch_latency_us.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of stats (for reporting)
#[derive(Debug, Clone, Default)]
pub struct PipelineStatsSnapshot {
    pub orders_produced: u64,
    pub orders_consumed: u64,
    pub batches_sent: u64,
    pub batches_dropped: u64,
    pub total_batch_latency_us: u64,
}

impl PipelineStatsSnapshot {
    /// Mean batch age at flush, in microseconds.
    pub fn avg_batch_latency_us(&self) -> f64 {
        if self.batches_sent > 0 {
            self.total_batch_latency_us as f64 / self.batches_sent as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for PipelineStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Final Statistics ===")?;
        writeln!(f, "Total orders produced: {}", self.orders_produced)?;
        writeln!(f, "Total orders consumed: {}", self.orders_consumed)?;
        writeln!(f, "Total batches sent: {}", self.batches_sent)?;
        writeln!(f, "Batches dropped: {}", self.batches_dropped)?;
        write!(
            f,
            "Average batch latency: {:.2}µs",
            self.avg_batch_latency_us()
        )
    }
}

// ============================================================
// SHUTDOWN SIGNALLING
// ============================================================

/// Cooperative shutdown for the worker threads.
///
/// Two flags, matching the two ways a run ends: `running` is cleared by the
/// orchestrator when the runtime deadline passes, `shutdown_requested` is
/// set from the signal handler. Workers poll [`should_run`] and exit their
/// loops on either.
///
/// [`should_run`]: ShutdownSignal::should_run
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    running: AtomicBool,
    shutdown_requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the pipeline live. Called once before workers spawn.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Orchestrator-side stop (runtime elapsed, teardown).
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Signal-handler-side stop (SIGINT/SIGTERM).
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// True while workers should keep looping.
    pub fn should_run(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.is_shutdown_requested()
    }
}

// ============================================================
// TESTS
// ============================================================
