//! Command line arguments and configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use pinlink_device::DeviceConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PINLINK_CONFIG";

/// Configuration file used when neither `--config` nor the environment name one.
pub const DEFAULT_CONFIG_PATH: &str = "pinlink.toml";

/// Drive the GPIO pins of a remote board through its pin agent.
#[derive(Debug, Parser)]
#[command(name = "pinlink", version, about)]
pub struct Cli {
    /// Configuration file (defaults to $PINLINK_CONFIG, then pinlink.toml).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Agent host, overriding the configuration file.
    #[arg(long)]
    pub host: Option<String>,

    /// Agent port, overriding the configuration file.
    #[arg(long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the device and print its state and reconciled pins.
    Status,
    /// List the attributes of the reconciled pins.
    Attributes,
    /// Read a boolean attribute, e.g. pin3_voltage.
    Read {
        attribute: String,
    },
    /// Write a boolean attribute, e.g. pin3_output true.
    Write {
        attribute: String,
        /// true/false, on/off, high/low or 1/0.
        #[arg(action = ArgAction::Set, value_parser = parse_level)]
        value: bool,
    },
    /// De-energize every pin and switch the device off.
    TurnOff,
    /// Return every pin to its power-on configuration.
    ResetAll,
}

fn parse_level(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "high" | "1" => Ok(true),
        "false" | "off" | "low" | "0" => Ok(false),
        other => Err(format!("expected true or false, got {other:?}")),
    }
}

impl Cli {
    /// Path of the configuration file to read.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load the configuration file, if any, and apply the flag overrides.
    pub fn device_config(&self) -> anyhow::Result<DeviceConfig> {
        let path = self.config_path();
        let text = if path.exists() {
            Some(read_config(&path)?)
        } else {
            None
        };
        resolve_config(text.as_deref(), self.host.clone(), self.port)
            .with_context(|| format!("configuring device from {}", path.display()))
    }
}

fn read_config(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Merge an optional TOML document with the `--host` and `--port` flags.
pub fn resolve_config(
    text: Option<&str>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<DeviceConfig> {
    let mut config = match (text, host) {
        (Some(text), host) => {
            let mut config = DeviceConfig::from_toml(text)?;
            if let Some(host) = host {
                config.host = host;
            }
            config
        }
        (None, Some(host)) => DeviceConfig::new(host),
        (None, None) => bail!("no configuration file found and no --host given"),
    };

    if let Some(port) = port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_file_only() {
        let config = resolve_config(Some("host = \"board\"\nport = 10000"), None, None).unwrap();
        assert_eq!(config.host, "board");
        assert_eq!(config.port, 10000);
    }

    #[test]
    fn test_flags_override_file() {
        let config = resolve_config(
            Some("host = \"board\"\nport = 10000"),
            Some("10.0.0.7".to_string()),
            Some(9000),
        )
        .unwrap();
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_host_flag_without_file() {
        let config = resolve_config(None, Some("board".to_string()), None).unwrap();
        assert_eq!(config, DeviceConfig::new("board"));
    }

    #[test]
    fn test_no_host_anywhere() {
        assert!(resolve_config(None, None, Some(9788)).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(resolve_config(Some("host = \"board\"\npins = [0]"), None, None).is_err());
        assert!(resolve_config(None, Some("board".to_string()), Some(0)).is_err());
    }

    #[rstest]
    #[case("true", true)]
    #[case("ON", true)]
    #[case("1", true)]
    #[case("low", false)]
    #[case("False", false)]
    fn test_parse_level(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(parse_level(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_level_rejects_garbage() {
        assert!(parse_level("maybe").is_err());
    }

    #[test]
    fn test_write_subcommand() {
        let cli = Cli::try_parse_from(["pinlink", "--host", "board", "write", "pin3_output", "on"])
            .unwrap();
        match cli.command {
            Command::Write { attribute, value } => {
                assert_eq!(attribute, "pin3_output");
                assert!(value);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_config_flag_wins() {
        let cli = Cli::try_parse_from(["pinlink", "--config", "board.toml", "status"]).unwrap();
        assert_eq!(cli.config_path(), PathBuf::from("board.toml"));
    }
}
