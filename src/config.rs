// config.rs - Runtime configuration and startup validation

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors. All of these are fatal at startup; nothing here
/// can occur once the pipeline is running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ring capacity must be a power of two >= 2, got {0}")]
    InvalidBufferSize(usize),

    #[error("unknown network type '{0}' (expected tcp, udp, or shm)")]
    UnknownNetwork(String),

    #[error("{0} must be greater than zero")]
    ZeroParameter(&'static str),
}

/// Which egress model the process runs with. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Tcp,
    Udp,
    Shm,
}

impl FromStr for NetworkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(NetworkKind::Tcp),
            "udp" => Ok(NetworkKind::Udp),
            "shm" => Ok(NetworkKind::Shm),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkKind::Tcp => "tcp",
            NetworkKind::Udp => "udp",
            NetworkKind::Shm => "shm",
        })
    }
}

/// Everything the orchestrator needs to build and run the pipeline.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub producers: usize,
    pub consumers: usize,
    /// Ring capacity; power of two.
    pub buffer_size: usize,
    pub batch_size: usize,
    /// Target aggregate production rate; shapes the producer sleep.
    pub orders_per_second: u64,
    pub runtime_secs: u64,
    /// Age limit before a partial batch is flushed.
    pub batch_timeout_us: u64,
    pub batching_enabled: bool,
    pub network_enabled: bool,
    pub network: NetworkKind,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 3,
            buffer_size: 1024,
            batch_size: 10,
            orders_per_second: 10_000,
            runtime_secs: 60,
            batch_timeout_us: 1_000,
            batching_enabled: true,
            network_enabled: true,
            network: NetworkKind::Tcp,
        }
    }
}

impl RuntimeConfig {
    /// Validate at startup. Any error here terminates the process before a
    /// single thread is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size < 2 || !self.buffer_size.is_power_of_two() {
            return Err(ConfigError::InvalidBufferSize(self.buffer_size));
        }
        if self.producers == 0 {
            return Err(ConfigError::ZeroParameter("producers"));
        }
        if self.consumers == 0 {
            return Err(ConfigError::ZeroParameter("consumers"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroParameter("batch-size"));
        }
        if self.orders_per_second == 0 {
            return Err(ConfigError::ZeroParameter("rate"));
        }
        Ok(())
    }

    /// Per-producer pacing interval so that all producers together target
    /// `orders_per_second`. Floored at 1 µs.
    pub fn producer_interval(&self) -> Duration {
        let us = (1_000_000 * self.producers as u64) / self.orders_per_second;
        Duration::from_micros(us.max(1))
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_micros(self.batch_timeout_us)
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_buffer_size_must_be_power_of_two() {
        let config = RuntimeConfig {
            buffer_size: 1000,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidBufferSize(1000)
        );
    }

    #[test]
    fn test_zero_counts_rejected() {
        for field in ["producers", "consumers", "batch-size", "rate"] {
            let mut config = RuntimeConfig::default();
            match field {
                "producers" => config.producers = 0,
                "consumers" => config.consumers = 0,
                "batch-size" => config.batch_size = 0,
                _ => config.orders_per_second = 0,
            }
            assert_eq!(
                config.validate().unwrap_err(),
                ConfigError::ZeroParameter(field)
            );
        }
    }

    #[test]
    fn test_network_kind_parsing() {
        assert_eq!("tcp".parse::<NetworkKind>().unwrap(), NetworkKind::Tcp);
        assert_eq!("udp".parse::<NetworkKind>().unwrap(), NetworkKind::Udp);
        assert_eq!("shm".parse::<NetworkKind>().unwrap(), NetworkKind::Shm);
        assert_eq!(
            "quic".parse::<NetworkKind>().unwrap_err(),
            ConfigError::UnknownNetwork("quic".to_string())
        );
    }

    #[test]
    fn test_producer_interval_splits_rate() {
        // 10_000 ops/sec over 2 producers → 200 µs between orders each
        let config = RuntimeConfig::default();
        assert_eq!(config.producer_interval(), Duration::from_micros(200));

        // Extreme rates floor at 1 µs
        let config = RuntimeConfig {
            orders_per_second: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.producer_interval(), Duration::from_micros(1));
    }
}
