//! Device configuration.
//!
//! ```toml
//! host = "raspberrypi.local"   # required
//! port = 9788                  # optional
//! pins = [3, 5, 7, 8]          # optional, candidate pins
//! timeout_ms = 3000            # optional
//! ```

use std::time::Duration;

use pinlink_core::constants::{DEFAULT_AGENT_PORT, DEFAULT_IO_TIMEOUT_MS, DEFAULT_PINS};
use pinlink_core::{Error, PinSet, Result};
use pinlink_network::TransportConfig;
use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    DEFAULT_AGENT_PORT
}

fn default_pins() -> Vec<u16> {
    DEFAULT_PINS.to_vec()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_IO_TIMEOUT_MS
}

/// Where the agent lives and which pins to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Host name or address of the board running the agent.
    pub host: String,

    /// TCP port of the agent.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Candidate pins, reconciled against the agent at every init.
    #[serde(default = "default_pins")]
    pub pins: Vec<u16>,

    /// Timeout for connect, send and receive.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DeviceConfig {
    /// Configuration for `host` with every other setting at its default.
    ///
    /// # Example
    ///
    /// ```
    /// use pinlink_device::DeviceConfig;
    ///
    /// let config = DeviceConfig::new("10.0.0.7");
    /// assert_eq!(config.port, 9788);
    /// assert_eq!(config.pins.len(), 14);
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            pins: default_pins(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_pins<I: IntoIterator<Item = u16>>(mut self, pins: I) -> Self {
        self.pins = pins.into_iter().collect();
        self
    }

    /// Set the I/O timeout, saturating at `u64::MAX` milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns `Error::Config` if the document is malformed, misses `host`
    /// or carries unknown keys. The values are not validated here.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check the configuration and return the candidate pin set.
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty host, a zero port, a zero
    /// timeout or a pin numbered zero.
    pub fn validate(&self) -> Result<PinSet> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must not be 0".to_string()));
        }
        PinSet::from_numbers(self.pins.iter().copied())
            .map_err(|e| Error::Config(format!("invalid pin list: {e}")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = DeviceConfig::from_toml(r#"host = "board""#).unwrap();

        assert_eq!(config, DeviceConfig::new("board"));
        assert_eq!(config.port, 9788);
        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.pins, DEFAULT_PINS.to_vec());
    }

    #[test]
    fn test_full_toml() {
        let config = DeviceConfig::from_toml(
            r#"
            host = "10.0.0.7"
            port = 10000
            pins = [3, 5, 7, 99]
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 10000);
        assert_eq!(config.timeout(), Duration::from_millis(250));

        let pins = config.validate().unwrap();
        assert_eq!(pins, PinSet::from_numbers([3, 5, 7, 99]).unwrap());
    }

    #[rstest]
    #[case("port = 9788")]
    #[case(r#"host = "board"
colour = "blue""#)]
    #[case(r#"host = "board"
pins = ["three"]"#)]
    fn test_invalid_toml(#[case] text: &str) {
        assert!(matches!(DeviceConfig::from_toml(text), Err(Error::Config(_))));
    }

    #[rstest]
    #[case(DeviceConfig::new("  "))]
    #[case(DeviceConfig::new("board").with_port(0))]
    #[case(DeviceConfig::new("board").with_pins([3, 0, 5]))]
    #[case(DeviceConfig::new("board").with_timeout(Duration::ZERO))]
    fn test_validate_rejects(#[case] config: DeviceConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_collapses_duplicate_pins() {
        let config = DeviceConfig::new("board").with_pins([5, 3, 5]);
        assert_eq!(config.validate().unwrap().len(), 2);
    }

    #[test]
    fn test_transport_config_carries_timeout() {
        let config = DeviceConfig::new("board").with_timeout(Duration::from_millis(40));
        assert_eq!(config.transport_config().timeout, Duration::from_millis(40));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = DeviceConfig::new("board").with_timeout(Duration::MAX);
        assert_eq!(config.timeout_ms, u64::MAX);
        assert!(config.validate().is_ok());
    }
}
