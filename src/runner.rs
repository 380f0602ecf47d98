//! Runner - producer/consumer/telemetry thread orchestration
//!
//! Wires the whole pipeline together and owns its threads:
//!
//! ```text
//! Producer ──┐                        ┌── Consumer ── Batcher ──┐
//! Producer ──┼──▶ OrderRing (MPMC) ──▶┼── Consumer ── Batcher ──┼──▶ Egress
//! Producer ──┘                        └── Consumer ── Batcher ──┘
//!                    Telemetry (1 s snapshots)
//! ```
//!
//! Each consumer owns its own batcher, so flushes never cross threads; the
//! egress and the stats block are the only shared sinks. The main thread
//! polls the runtime deadline and the shutdown flags at 100 ms, then stops
//! the workers and joins them. Consumers force-flush their partial batch on
//! the way out, so nothing buffered is silently discarded at shutdown.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::info;

use crate::batcher::{BatchSink, Batcher};
use crate::config::RuntimeConfig;
use crate::models::{Order, Side};
use crate::pipeline::{PipelineStats, PipelineStatsSnapshot, ShutdownSignal};
use crate::ring::{OrderRing, RingError};
use crate::transport::{Egress, EgressStats};

/// Symbols the synthetic producers draw from.
const SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];

/// Consumer throttle between ring polls.
const CONSUMER_IDLE: Duration = Duration::from_micros(10);

/// Main-thread cadence for the deadline/shutdown poll.
const DEADLINE_POLL: Duration = Duration::from_millis(100);

const TELEMETRY_PERIOD: Duration = Duration::from_secs(1);

/// What a finished run hands back to the caller.
#[derive(Debug)]
pub struct PipelineReport {
    pub stats: PipelineStatsSnapshot,
    pub egress: EgressStats,
}

/// Run the pipeline to completion: spawn workers, wait for the runtime
/// deadline or a shutdown request, stop and join everything.
///
/// The caller owns `signal` so a signal handler (or a test) can request
/// shutdown from outside.
pub fn run_pipeline(
    config: &RuntimeConfig,
    egress: Arc<dyn Egress>,
    signal: Arc<ShutdownSignal>,
) -> Result<PipelineReport, RingError> {
    let ring = Arc::new(OrderRing::with_capacity(config.buffer_size)?);
    let stats = Arc::new(PipelineStats::new());
    signal.start();

    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    for producer_id in 1..=config.producers {
        let ring = ring.clone();
        let stats = stats.clone();
        let signal = signal.clone();
        let pace = config.producer_interval();
        workers.push(thread::spawn(move || {
            producer_loop(producer_id as u64, &ring, &stats, &signal, pace);
        }));
    }

    for _ in 0..config.consumers {
        let ring = ring.clone();
        let stats = stats.clone();
        let signal = signal.clone();
        let egress = egress.clone();
        let config = config.clone();
        workers.push(thread::spawn(move || {
            consumer_loop(&ring, stats, &signal, egress, &config);
        }));
    }

    {
        let ring = ring.clone();
        let stats = stats.clone();
        let signal = signal.clone();
        workers.push(thread::spawn(move || {
            telemetry_loop(&ring, &stats, &signal);
        }));
    }

    let deadline = Instant::now() + Duration::from_secs(config.runtime_secs);
    while signal.should_run() {
        if Instant::now() >= deadline {
            info!("Runtime completed, initiating shutdown");
            break;
        }
        thread::sleep(DEADLINE_POLL);
    }

    signal.stop();
    for worker in workers {
        // A worker that panicked already lost its orders; propagate
        worker.join().expect("pipeline worker panicked");
    }

    Ok(PipelineReport {
        stats: stats.snapshot(),
        egress: egress.stats(),
    })
}

// ============================================================
// WORKERS
// ============================================================

/// Synthesizes orders and pushes them onto the ring, dropping on a full
/// ring without retry. Ids are `producer_id * 1_000_000 + n`, unique per
/// producer only.
fn producer_loop(
    producer_id: u64,
    ring: &OrderRing,
    stats: &PipelineStats,
    signal: &ShutdownSignal,
    pace: Duration,
) {
    let mut rng = rand::thread_rng();
    let id_base = producer_id * 1_000_000;
    let mut seq = 0u64;

    while signal.should_run() {
        seq += 1;
        let order = Order::new(
            id_base + seq,
            SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
            if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            rng.gen_range(100.0..200.0),
            rng.gen_range(1..=1000),
        );
        if ring.try_push(order) {
            stats.incr_produced();
        }
        thread::sleep(pace);
    }
}

/// Drains the ring into this thread's batcher (or straight to the egress
/// when batching is off). The age trigger is checked every iteration so a
/// stalled feed still flushes on time.
fn consumer_loop(
    ring: &OrderRing,
    stats: Arc<PipelineStats>,
    signal: &ShutdownSignal,
    egress: Arc<dyn Egress>,
    config: &RuntimeConfig,
) {
    let mut sink = egress_sink(egress, stats, config.network_enabled);

    if config.batching_enabled {
        let mut batcher = Batcher::new(config.batch_size, config.batch_timeout(), sink);
        while signal.should_run() {
            if let Some(order) = ring.try_pop() {
                batcher.add(order);
            }
            batcher.check_timeout();
            thread::sleep(CONSUMER_IDLE);
        }
        // Partial batch leaves with this thread
        batcher.force_flush();
    } else {
        while signal.should_run() {
            if let Some(order) = ring.try_pop() {
                sink(&[order], 0);
            }
            thread::sleep(CONSUMER_IDLE);
        }
    }
}

/// The sink every flush goes through: dispatch to the egress (unless the
/// simulation is disabled) and account for the outcome. A dropped batch is
/// counted and forgotten, never requeued.
fn egress_sink(
    egress: Arc<dyn Egress>,
    stats: Arc<PipelineStats>,
    network_enabled: bool,
) -> BatchSink {
    Box::new(move |batch, batch_age_us| {
        let delivered = if network_enabled {
            egress.send(batch, batch_age_us)
        } else {
            true
        };
        if delivered {
            stats.incr_batches_sent();
            stats.add_batch_latency(batch_age_us);
            stats.add_consumed(batch.len() as u64);
        } else {
            stats.incr_batches_dropped();
        }
    })
}

/// Emits a stats line roughly once per second. Observation only; it takes
/// no corrective action.
fn telemetry_loop(ring: &OrderRing, stats: &PipelineStats, signal: &ShutdownSignal) {
    let mut last_emit = Instant::now();
    let mut last_consumed = 0u64;

    while signal.should_run() {
        thread::sleep(DEADLINE_POLL);
        let elapsed = last_emit.elapsed();
        if elapsed < TELEMETRY_PERIOD {
            continue;
        }

        let snap = stats.snapshot();
        let throughput =
            (snap.orders_consumed.saturating_sub(last_consumed)) as f64 / elapsed.as_secs_f64();
        info!(
            "Stats: produced={} consumed={} batches={} dropped={} throughput={:.2} ops/sec avg_latency={:.2}µs buffer={}/{}",
            snap.orders_produced,
            snap.orders_consumed,
            snap.batches_sent,
            snap.batches_dropped,
            throughput,
            snap.avg_batch_latency_us(),
            ring.size(),
            ring.capacity(),
        );
        last_emit = Instant::now();
        last_consumed = snap.orders_consumed;
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkKind;
    use crate::transport::InstantTransport;

    #[test]
    fn test_zero_runtime_returns_promptly() {
        let config = RuntimeConfig {
            producers: 1,
            consumers: 1,
            buffer_size: 64,
            runtime_secs: 0,
            network: NetworkKind::Shm,
            ..Default::default()
        };
        let signal = Arc::new(ShutdownSignal::new());
        let egress: Arc<dyn Egress> = Arc::new(InstantTransport::default());

        let start = Instant::now();
        let report = run_pipeline(&config, egress, signal).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(report.stats.orders_consumed <= report.stats.orders_produced);
    }

    #[test]
    fn test_invalid_capacity_is_rejected() {
        let config = RuntimeConfig {
            buffer_size: 100,
            ..Default::default()
        };
        let signal = Arc::new(ShutdownSignal::new());
        let egress: Arc<dyn Egress> = Arc::new(InstantTransport::default());
        assert_eq!(
            run_pipeline(&config, egress, signal).unwrap_err(),
            RingError::CapacityNotPowerOfTwo(100)
        );
    }
}
