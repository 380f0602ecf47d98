//! Transport - simulated egress layer
//!
//! Batches leave the pipeline through one of three in-process simulations,
//! each modelling a different reliability/latency trade-off:
//!
//! - [`ReliableTransport`]: TCP-like, retransmits dropped batches with
//!   backoff, pays per-connection congestion delay.
//! - [`BestEffortTransport`]: UDP-like, fast, drops without retry.
//! - [`InstantTransport`]: shared-memory-like, never fails, sub-µs noise.
//!
//! All variants expose the same [`Egress`] interface and are safe to call
//! from any number of flushing threads concurrently: statistics are plain
//! atomics and random draws come from the calling thread's generator.
//! Nothing here touches a real socket; "packets" never leave the process.

mod best_effort;
mod instant;
mod reliable;

pub use best_effort::{BestEffortStats, BestEffortTransport};
pub use instant::{InstantStats, InstantTransport};
pub use reliable::{ReliableStats, ReliableTransport};

use std::fmt;
use std::sync::Arc;

use crate::config::NetworkKind;
use crate::models::Order;

/// Uniform egress interface over the three transport models.
///
/// `send` blocks for the simulated wire time and returns whether the batch
/// was ultimately delivered. Callers must not hold locks across it: a
/// reliable send with retries can sleep for a long time.
pub trait Egress: Send + Sync {
    fn send(&self, batch: &[Order], batch_age_us: u64) -> bool;
    fn stats(&self) -> EgressStats;
    fn name(&self) -> &'static str;
}

/// Per-variant statistics snapshot.
#[derive(Debug, Clone)]
pub enum EgressStats {
    Reliable(ReliableStats),
    BestEffort(BestEffortStats),
    Instant(InstantStats),
}

impl fmt::Display for EgressStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EgressStats::Reliable(s) => fmt::Display::fmt(s, f),
            EgressStats::BestEffort(s) => fmt::Display::fmt(s, f),
            EgressStats::Instant(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Construct the process-wide transport for the selected network model,
/// with the stock simulation parameters.
pub fn build_egress(kind: NetworkKind) -> Arc<dyn Egress> {
    match kind {
        NetworkKind::Tcp => Arc::new(ReliableTransport::default()),
        NetworkKind::Udp => Arc::new(BestEffortTransport::default()),
        NetworkKind::Shm => Arc::new(InstantTransport::default()),
    }
}
