//! Query configuration
//!
//! Layered from an optional config file, then `ELM_QUERY__*` environment
//! variables; command-line flags are applied on top by the caller.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix (`ELM_QUERY__DEVICE=...`)
const ENV_PREFIX: &str = "ELM_QUERY";

/// URL scheme selecting a TCP (Wi-Fi) adapter
const TCP_SCHEME: &str = "tcp://";

/// Output format for readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `name: value unit`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Where the adapter lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Serial(String),
    Tcp(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Serial device path, or `tcp://host:port`
    pub device: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Settling delay between write and read (ms)
    pub response_delay_ms: u64,
    /// Per-command timeout (ms)
    pub timeout_ms: u64,
    /// Report readings in imperial units
    pub imperial_units: bool,
    /// Catalog names or `raw:` commands, run in order
    pub commands: Vec<String>,
    pub output: OutputFormat,
    /// trace, debug, info, warn or error
    pub log_level: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: elm_protocol::DEFAULT_BAUD_RATE,
            response_delay_ms: 0,
            timeout_ms: 2000,
            imperial_units: false,
            commands: vec!["pids-01-20".to_string()],
            output: OutputFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

impl QueryConfig {
    /// Load from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Self::build(builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("commands")
                .try_parsing(true),
        ))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn device(&self) -> Device {
        match self.device.strip_prefix(TCP_SCHEME) {
            Some(addr) => Device::Tcp(addr.to_string()),
            None => Device::Serial(self.device.clone()),
        }
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
