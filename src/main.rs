// main.rs - CLI entry point: parse, validate, run, report

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use orderflux::config::{NetworkKind, RuntimeConfig};
use orderflux::logging::init_logging;
use orderflux::pipeline::ShutdownSignal;
use orderflux::runner::run_pipeline;
use orderflux::transport::build_egress;

#[derive(Parser, Debug)]
#[command(name = "orderflux", version, about = "Low-latency order-flow pipeline with simulated egress")]
struct Args {
    /// Number of producer threads
    #[arg(long, default_value_t = 2)]
    producers: usize,

    /// Number of consumer threads
    #[arg(long, default_value_t = 3)]
    consumers: usize,

    /// Ring buffer capacity (must be a power of two)
    #[arg(long, default_value_t = 1024)]
    buffer_size: usize,

    /// Orders per batch
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Target orders per second across all producers
    #[arg(long, default_value_t = 10_000)]
    rate: u64,

    /// Runtime in seconds
    #[arg(long, default_value_t = 60)]
    runtime: u64,

    /// Batch age limit in microseconds
    #[arg(long, default_value_t = 1_000)]
    batch_timeout_us: u64,

    /// Disable batching (each order ships as its own batch)
    #[arg(long)]
    no_batching: bool,

    /// Disable the network simulation
    #[arg(long)]
    no_network: bool,

    /// Network model: tcp, udp, shm
    #[arg(long, default_value = "tcp")]
    network: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Optional directory for a rolling log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args.log_level, args.log_dir.as_deref());

    let network: NetworkKind = args.network.parse()?;
    let config = RuntimeConfig {
        producers: args.producers,
        consumers: args.consumers,
        buffer_size: args.buffer_size,
        batch_size: args.batch_size,
        orders_per_second: args.rate,
        runtime_secs: args.runtime,
        batch_timeout_us: args.batch_timeout_us,
        batching_enabled: !args.no_batching,
        network_enabled: !args.no_network,
        network,
    };
    config.validate().context("invalid configuration")?;

    info!(
        "orderflux {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );
    info!(
        "Configuration: producers={} consumers={} buffer={} batch={} rate={} ops/sec network={} ({}) runtime={}s",
        config.producers,
        config.consumers,
        config.buffer_size,
        config.batch_size,
        config.orders_per_second,
        config.network,
        if config.network_enabled { "simulated" } else { "disabled" },
        config.runtime_secs,
    );

    let signal = Arc::new(ShutdownSignal::new());
    let handler_signal = signal.clone();
    ctrlc::set_handler(move || {
        info!("Termination signal received, initiating shutdown");
        handler_signal.request_shutdown();
    })
    .context("failed to install signal handler")?;

    let egress = build_egress(network);
    info!("System started ({} egress). Press Ctrl+C to stop.", egress.name());

    let report = run_pipeline(&config, egress, signal)?;

    println!("{}", report.stats);
    if config.network_enabled {
        println!("{}", report.egress);
    }
    info!("System shutdown complete");
    Ok(())
}
