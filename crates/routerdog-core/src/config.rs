//! routerdog.toml configuration parser.
//!
//! The configuration is read once at startup and never mutated. Every field
//! is optional in the file; missing fields take the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::host::Host;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchdogConfig {
    /// Hosts to check, probed in this order.
    pub hosts: Vec<Host>,
    /// Pause between check cycles.
    #[serde(with = "crate::duration::serde_format")]
    pub interval: Duration,
    /// Consecutive failed cycles before a restart is considered.
    pub threshold: u32,
    /// Per-probe timeout.
    #[serde(with = "crate::duration::serde_format")]
    pub timeout: Duration,
    /// Extra attempts per check cycle (0 = disabled).
    pub retries: u32,
    /// Pause between attempts within one cycle.
    #[serde(with = "crate::duration::serde_format")]
    pub retry_interval: Duration,
    /// Approximate time the router needs to boot after a power cycle.
    #[serde(with = "crate::duration::serde_format")]
    pub restart_duration: Duration,
    /// Minimum time between two restarts.
    #[serde(with = "crate::duration::serde_format")]
    pub min_restart_interval: Duration,
    /// File holding the timestamp of the last restart.
    pub state_file: PathBuf,
    pub actuator: ActuatorConfig,
}

/// RF power switch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// When false the watchdog runs observe-only.
    pub enabled: bool,
    /// External RF transmit command, resolved on `PATH`.
    pub command: String,
    /// BCM GPIO pin of the transmitter.
    pub gpio: u8,
    pub protocol: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_length: Option<u32>,
    pub on_code: u32,
    pub off_code: u32,
    /// Upper bound for a single transmission.
    #[serde(with = "crate::duration::serde_format")]
    pub tx_timeout: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            hosts: vec![
                Host::Icmp([1, 1, 1, 1].into()),
                Host::Icmp([8, 8, 8, 8].into()),
                Host::Http("https://www.google.com".to_string()),
                Host::Http("https://www.amazon.com".to_string()),
            ],
            interval: Duration::from_secs(300),
            threshold: 3,
            timeout: Duration::from_secs(15),
            retries: 0,
            retry_interval: Duration::from_secs(10),
            restart_duration: Duration::from_secs(300),
            min_restart_interval: Duration::from_secs(1800),
            state_file: PathBuf::from("last_restart.txt"),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "rpi-rf_send".to_string(),
            gpio: 17,
            protocol: 4,
            pulse_length: None,
            on_code: 3_323_996,
            off_code: 4_099_212,
            tx_timeout: Duration::from_secs(10),
        }
    }
}

impl WatchdogConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: WatchdogConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to the defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hosts.is_empty() {
            return Err(ConfigError::Invalid("at least one host is required".into()));
        }
        if self.threshold == 0 {
            return Err(ConfigError::Invalid("threshold must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be greater than zero".into()));
        }
        if self.actuator.enabled && self.actuator.command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "actuator.command must not be empty".into(),
            ));
        }
        Ok(())
    }
}
