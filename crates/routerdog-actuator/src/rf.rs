//! RF transmitter actuator.
//!
//! Each signal is one run of the external transmit command (by default
//! `rpi-rf_send -g <gpio> -t <protocol> [-p <pulse>] <code>`). The child is
//! spawned with `kill_on_drop`, so the transmitter is released on every
//! exit path, including a timed out transmission.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use routerdog_core::ActuatorConfig;

use crate::error::{ActuatorError, ActuatorResult};
use crate::{Actuator, POWER_CYCLE_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    On,
    Off,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::On => f.write_str("ON"),
            Signal::Off => f.write_str("OFF"),
        }
    }
}

/// Drives an RF power socket through an external transmit command.
#[derive(Debug, Clone)]
pub struct RfActuator {
    program: PathBuf,
    config: ActuatorConfig,
    cycle_delay: Duration,
}

impl RfActuator {
    pub fn new(program: PathBuf, config: ActuatorConfig) -> Self {
        Self {
            program,
            config,
            cycle_delay: POWER_CYCLE_DELAY,
        }
    }

    /// Override the OFF→ON pause (for testing).
    pub fn with_cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }

    fn code(&self, signal: Signal) -> u32 {
        match signal {
            Signal::On => self.config.on_code,
            Signal::Off => self.config.off_code,
        }
    }

    fn args(&self, code: u32) -> Vec<String> {
        let mut args = vec![
            "-g".to_string(),
            self.config.gpio.to_string(),
            "-t".to_string(),
            self.config.protocol.to_string(),
        ];
        if let Some(pulse) = self.config.pulse_length {
            args.push("-p".to_string());
            args.push(pulse.to_string());
        }
        args.push(code.to_string());
        args
    }

    async fn transmit(&self, signal: Signal) -> ActuatorResult<()> {
        let code = self.code(signal);
        debug!(%signal, code, program = %self.program.display(), "transmitting");

        let child = Command::new(&self.program)
            .args(self.args(code))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ActuatorError::Spawn {
                command: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.config.tx_timeout, child.wait_with_output())
            .await
            .map_err(|_| ActuatorError::Timeout(self.config.tx_timeout))?
            .map_err(|e| ActuatorError::Spawn {
                command: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ActuatorError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(%signal, code, "RF code sent");
        Ok(())
    }
}

#[async_trait]
impl Actuator for RfActuator {
    fn name(&self) -> &'static str {
        "rf"
    }

    async fn power_on(&self) -> ActuatorResult<()> {
        self.transmit(Signal::On).await
    }

    async fn power_cycle(&self) -> ActuatorResult<()> {
        let off = self.transmit(Signal::Off).await;
        if let Err(ref e) = off {
            warn!(error = %e, "OFF signal failed, still sending ON");
        }

        tokio::time::sleep(self.cycle_delay).await;

        let on = self.transmit(Signal::On).await;
        off.and(on)
    }
}
