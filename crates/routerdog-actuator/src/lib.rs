//! routerdog-actuator — power control for the upstream router.
//!
//! The router hangs off an RF-controlled power socket. An [`Actuator`]
//! exposes the two operations the watchdog needs:
//!
//! - `power_on()` — send only the ON code; used once at startup so the
//!   socket is in a known state whatever happened before.
//! - `power_cycle()` — OFF, wait [`POWER_CYCLE_DELAY`], ON.
//!
//! The implementation is chosen once at startup by [`select_actuator`]:
//! either an [`RfActuator`] driving an external transmit command, or a
//! [`NoopActuator`] when the transmitter is disabled or missing. Callers
//! only ever see `Arc<dyn Actuator>`.

pub mod error;
pub mod rf;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use routerdog_core::ActuatorConfig;

pub use error::{ActuatorError, ActuatorResult};
pub use rf::RfActuator;

/// Pause between the OFF and the ON signal of a power cycle.
pub const POWER_CYCLE_DELAY: Duration = Duration::from_secs(10);

/// Switches the router's power socket.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Send the ON signal only.
    async fn power_on(&self) -> ActuatorResult<()>;

    /// Send OFF, wait, then send ON.
    ///
    /// The ON signal is attempted even if OFF failed, so the socket is
    /// not left switched off.
    async fn power_cycle(&self) -> ActuatorResult<()>;
}

/// Stand-in used when no transmitter is available.
#[derive(Debug, Clone, Default)]
pub struct NoopActuator;

#[async_trait]
impl Actuator for NoopActuator {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn power_on(&self) -> ActuatorResult<()> {
        warn!("RF transmitter not available, power on skipped");
        Err(ActuatorError::Unavailable)
    }

    async fn power_cycle(&self) -> ActuatorResult<()> {
        warn!("RF transmitter not available, power cycle skipped");
        Err(ActuatorError::Unavailable)
    }
}

/// Pick the actuator implementation for this process.
///
/// Falls back to [`NoopActuator`] (observe-only mode) when the actuator is
/// disabled or its transmit command cannot be found on `PATH`.
pub fn select_actuator(config: &ActuatorConfig) -> Arc<dyn Actuator> {
    if !config.enabled {
        info!("actuator disabled, running observe-only");
        return Arc::new(NoopActuator);
    }

    match which::which(&config.command) {
        Ok(program) => {
            info!(
                program = %program.display(),
                gpio = config.gpio,
                protocol = config.protocol,
                "RF transmitter found"
            );
            Arc::new(RfActuator::new(program, config.clone()))
        }
        Err(e) => {
            error!(
                command = %config.command,
                error = %e,
                "can't locate RF transmitter, restart will not work"
            );
            Arc::new(NoopActuator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_reports_unavailable() {
        let actuator = NoopActuator;
        assert!(matches!(
            actuator.power_on().await,
            Err(ActuatorError::Unavailable)
        ));
        assert!(matches!(
            actuator.power_cycle().await,
            Err(ActuatorError::Unavailable)
        ));
    }

    #[test]
    fn disabled_config_selects_noop() {
        let config = ActuatorConfig {
            enabled: false,
            ..ActuatorConfig::default()
        };
        assert_eq!(select_actuator(&config).name(), "noop");
    }

    #[test]
    fn missing_command_selects_noop() {
        let config = ActuatorConfig {
            command: "routerdog-no-such-transmitter".to_string(),
            ..ActuatorConfig::default()
        };
        assert_eq!(select_actuator(&config).name(), "noop");
    }

    #[cfg(unix)]
    #[test]
    fn present_command_selects_rf() {
        let config = ActuatorConfig {
            command: "true".to_string(),
            ..ActuatorConfig::default()
        };
        assert_eq!(select_actuator(&config).name(), "rf");
    }
}
