//! orderflux - low-latency order-flow pipeline
//!
//! A bounded lock-free ring plus a time-and-size windowed batcher feeding a
//! pluggable simulated egress. Orders flow:
//!
//! ```text
//! Producer → Ring (push) → Consumer (pop) → Batcher (add) → Egress (send)
//! ```
//!
//! # Modules
//!
//! - [`models`] - The fixed-layout order record
//! - [`ring`] - Lock-free MPMC order queue
//! - [`batcher`] - Size/age dual-trigger batch accumulator
//! - [`transport`] - Reliable / best-effort / instant egress simulations
//! - [`pipeline`] - Shared counters and shutdown signalling
//! - [`runner`] - Thread orchestration
//! - [`config`] - Runtime configuration and validation
//! - [`logging`] - tracing subscriber setup

pub mod batcher;
pub mod config;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod ring;
pub mod runner;
pub mod transport;

// Convenient re-exports at crate root
pub use batcher::{BatchSink, Batcher};
pub use config::{ConfigError, NetworkKind, RuntimeConfig};
pub use models::{Order, OrderStatus, Side};
pub use pipeline::{PipelineStats, PipelineStatsSnapshot, ShutdownSignal};
pub use ring::{OrderRing, RingError};
pub use runner::{PipelineReport, run_pipeline};
pub use transport::{Egress, EgressStats, build_egress};
