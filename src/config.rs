//! Configuration for the photond daemon
//!
//! Loads configuration from a TOML file. All values are static for the
//! process lifetime; there is no live reconfiguration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub serial: SerialConfig,
    pub network: NetworkConfig,
    pub queues: QueueConfig,
    pub logging: LoggingConfig,
}

/// Serial acquisition configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Instrument serial port (e.g. `/dev/ttyUSB0`)
    pub device: String,
    /// Baud rate (the photon counter streams at 3 Mbaud)
    pub baud_rate: u32,
    /// Size of one hardware read in bytes (`SERBUF`)
    pub chunk_size: usize,
    /// Packets are `packet_multiplier * chunk_size` bytes (`BUF`)
    pub packet_multiplier: usize,
    /// Read timeout for one full chunk; a read that cannot be satisfied
    /// within this window is treated as a hardware fault
    pub read_timeout_ms: u64,
}

/// TCP distribution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Listen address
    pub bind_address: String,
    /// Listen port
    pub port: u16,
    /// Poll tick for the server loop and all shutdown-sensitive waits
    pub poll_timeout_ms: u64,
}

/// Bounded queue capacities
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Raw chunk queue capacity (drop-oldest on overflow)
    pub chunk_capacity: usize,
    /// Packet queue capacity (blocking on overflow)
    pub packet_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration for the photon counter deployment
    ///
    /// 8192-byte serial reads at 3 Mbaud, 64 KiB packets, port 18888.
    pub fn instrument_defaults() -> Self {
        Self {
            serial: SerialConfig {
                device: "/dev/ttyUSB0".to_string(),
                baud_rate: 3_000_000,
                chunk_size: 8192,
                packet_multiplier: 8,
                read_timeout_ms: 3000,
            },
            network: NetworkConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 18888,
                poll_timeout_ms: 20,
            },
            queues: QueueConfig {
                chunk_capacity: 32,
                packet_capacity: 16,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.serial.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be nonzero".into()));
        }
        if self.serial.packet_multiplier == 0 {
            return Err(Error::InvalidConfig(
                "packet_multiplier must be nonzero".into(),
            ));
        }
        if self.serial.read_timeout_ms == 0 || self.network.poll_timeout_ms == 0 {
            return Err(Error::InvalidConfig("timeouts must be nonzero".into()));
        }
        if self.queues.chunk_capacity == 0 || self.queues.packet_capacity == 0 {
            return Err(Error::InvalidConfig(
                "queue capacities must be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Packet size in bytes (`BUF`), always an exact multiple of the chunk
    /// size by construction
    pub fn packet_size(&self) -> usize {
        self.serial.chunk_size * self.serial.packet_multiplier
    }

    /// Serial read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.read_timeout_ms)
    }

    /// Server poll tick as a `Duration`
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.network.poll_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::instrument_defaults()
    }
}
