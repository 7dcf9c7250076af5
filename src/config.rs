//! Controller configuration
//!
//! All tunable parameters for the door controller.  Loaded from a JSON
//! file; any field left out falls back to its default.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::pins;

/// Which pin implementation the daemon drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinBackend {
    /// Linux `/sys/class/gpio`.
    Sysfs,
    /// In-memory pin bank (bench testing without hardware).
    Simulated,
}

/// GPIO numbers for every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub power: u32,
    pub direction: u32,
    pub upper: u32,
    pub lower: u32,
    pub up: u32,
    pub down: u32,
    /// Motor driver is energised by a LOW output.
    pub power_active_low: bool,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            power: pins::POWER_GPIO,
            direction: pins::DIRECTION_GPIO,
            upper: pins::UPPER_LIMIT_GPIO,
            lower: pins::LOWER_LIMIT_GPIO,
            up: pins::UP_SWITCH_GPIO,
            down: pins::DOWN_SWITCH_GPIO,
            power_active_low: true,
        }
    }
}

impl PinMap {
    fn all(&self) -> [u32; 6] {
        [
            self.power,
            self.direction,
            self.upper,
            self.lower,
            self.up,
            self.down,
        ]
    }
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    // --- Command channel ---
    /// Listen address; localhost only unless overridden.
    pub bind_addr: IpAddr,
    /// Listen port for the line protocol.
    pub port: u16,

    // --- Edge handling ---
    /// Delay between a detected edge and the confirming re-sample (ms).
    pub settle_delay_ms: u64,
    /// Minimum spacing between accepted edges on one line (ms).
    pub debounce_ms: u64,
    /// Sampling period for polled pin backends (ms).
    pub poll_interval_ms: u64,

    // --- Jam recovery ---
    /// Length of the reverse pulse used to free a jammed door (ms).
    pub recovery_pulse_ms: u64,

    // --- Hardware ---
    pub backend: PinBackend,
    pub pins: PinMap,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: pins::COMMAND_PORT,

            settle_delay_ms: 50,
            debounce_ms: 100,
            poll_interval_ms: 5,

            recovery_pulse_ms: 250,

            backend: PinBackend::Sysfs,
            pins: PinMap::default(),
        }
    }
}

impl DoorConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            warn!("Cannot read config {}: {}", path.display(), e);
            ConfigError::Io
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            warn!("Malformed config {}: {}", path.display(), e);
            ConfigError::Parse
        })?;
        config.validate()?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationFailed("port must be non-zero"));
        }
        if self.settle_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("settle_delay_ms must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be non-zero"));
        }
        if self.recovery_pulse_ms == 0 {
            return Err(ConfigError::ValidationFailed("recovery_pulse_ms must be non-zero"));
        }
        if self.settle_delay_ms > self.debounce_ms {
            return Err(ConfigError::ValidationFailed(
                "settle_delay_ms must not exceed debounce_ms",
            ));
        }
        let all = self.pins.all();
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                return Err(ConfigError::ValidationFailed("pin numbers must be distinct"));
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recovery_pulse(&self) -> Duration {
        Duration::from_millis(self.recovery_pulse_ms)
    }
}
