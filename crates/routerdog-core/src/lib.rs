pub mod config;
pub mod duration;
pub mod error;
pub mod host;

pub use config::{ActuatorConfig, WatchdogConfig};
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use host::{Host, ProbeMethod};
