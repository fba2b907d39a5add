//! Restart decisions.
//!
//! `RestartPolicy` is the pure rule: restart once the failure count has
//! reached the threshold, unless the previous restart is more recent than
//! `min_restart_interval`. `RestartEngine` applies it against the cooldown
//! store and drives the actuator.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{error, info, warn};

use routerdog_actuator::{Actuator, ActuatorResult};
use routerdog_core::WatchdogConfig;
use routerdog_state::CooldownStore;

/// Outcome of a restart decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Not enough consecutive failures yet.
    BelowThreshold,
    /// Threshold reached but the last restart is too recent.
    Cooldown { remaining: Duration },
    /// Power-cycle the router now.
    Restart,
}

/// Threshold and cooldown rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub threshold: u32,
    pub min_restart_interval: Duration,
}

impl RestartPolicy {
    pub fn from_config(config: &WatchdogConfig) -> Self {
        Self {
            threshold: config.threshold,
            min_restart_interval: config.min_restart_interval,
        }
    }

    /// Decide whether `failures` consecutive failed cycles warrant a restart.
    ///
    /// A `last_restart` later than `now` cannot be trusted and is ignored.
    pub fn decide(
        &self,
        failures: u32,
        last_restart: Option<SystemTime>,
        now: SystemTime,
    ) -> RestartDecision {
        if failures < self.threshold {
            return RestartDecision::BelowThreshold;
        }

        let elapsed = last_restart.and_then(|at| now.duration_since(at).ok());
        match elapsed {
            Some(elapsed) if elapsed < self.min_restart_interval => RestartDecision::Cooldown {
                remaining: self.min_restart_interval - elapsed,
            },
            _ => RestartDecision::Restart,
        }
    }
}

/// Applies the restart policy and performs restarts.
#[derive(Clone)]
pub struct RestartEngine {
    policy: RestartPolicy,
    store: Arc<dyn CooldownStore>,
    actuator: Arc<dyn Actuator>,
}

impl RestartEngine {
    pub fn new(
        policy: RestartPolicy,
        store: Arc<dyn CooldownStore>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        Self {
            policy,
            store,
            actuator,
        }
    }

    pub fn policy(&self) -> RestartPolicy {
        self.policy
    }

    /// The last recorded restart; unreadable records count as absent.
    pub fn last_restart(&self) -> Option<SystemTime> {
        match self.store.read() {
            Ok(last) => last,
            Err(e) => {
                warn!(error = %e, "failed to read last restart time, assuming none");
                None
            }
        }
    }

    /// Decide against the current wall-clock time and the cooldown record.
    pub fn decide(&self, failures: u32) -> RestartDecision {
        if failures < self.policy.threshold {
            return RestartDecision::BelowThreshold;
        }

        let now = SystemTime::now();
        let mut last = self.last_restart();
        if let Some(at) = last
            && at > now
        {
            warn!(?at, "last restart time lies in the future, ignoring it");
            last = None;
        }
        self.policy.decide(failures, last, now)
    }

    /// Power-cycle the router and record the restart time.
    ///
    /// The timestamp is recorded even if the actuator failed, so an absent
    /// transmitter still observes the cooldown.
    pub async fn restart(&self) {
        info!(actuator = self.actuator.name(), "restarting router");
        let actuator = Arc::clone(&self.actuator);
        report("power cycle", tokio::spawn(async move { actuator.power_cycle().await }).await);

        if let Err(e) = self.store.write(SystemTime::now()) {
            error!(error = %e, "failed to save last restart time");
        }
    }

    /// Send the ON signal, e.g. once at startup.
    pub async fn power_on(&self) {
        info!(actuator = self.actuator.name(), "sending initial ON");
        let actuator = Arc::clone(&self.actuator);
        report("power on", tokio::spawn(async move { actuator.power_on().await }).await);
    }
}

/// Log the result of an actuator task. Actuator failures never propagate.
fn report(action: &str, result: Result<ActuatorResult<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!(action, "actuator action completed"),
        Ok(Err(e)) => warn!(action, error = %e, "actuator action failed"),
        Err(e) => error!(action, error = %e, "actuator task panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routerdog_actuator::NoopActuator;
    use routerdog_state::{MemoryCooldownStore, StateError, StateResult};

    const HOUR: Duration = Duration::from_secs(3600);

    fn policy() -> RestartPolicy {
        RestartPolicy {
            threshold: 3,
            min_restart_interval: Duration::from_secs(1800),
        }
    }

    struct BrokenStore;

    impl CooldownStore for BrokenStore {
        fn read(&self) -> StateResult<Option<SystemTime>> {
            Err(StateError::Corrupt("not a number: 'x'".into()))
        }

        fn write(&self, _at: SystemTime) -> StateResult<()> {
            Err(StateError::Write("read-only filesystem".into()))
        }
    }

    #[test]
    fn below_threshold() {
        let now = SystemTime::now();
        assert_eq!(policy().decide(0, None, now), RestartDecision::BelowThreshold);
        assert_eq!(policy().decide(2, None, now), RestartDecision::BelowThreshold);
    }

    #[test]
    fn threshold_without_prior_restart() {
        let now = SystemTime::now();
        assert_eq!(policy().decide(3, None, now), RestartDecision::Restart);
        assert_eq!(policy().decide(7, None, now), RestartDecision::Restart);
    }

    #[test]
    fn recent_restart_blocks() {
        let now = SystemTime::now();
        let last = now - Duration::from_secs(10);
        assert_eq!(
            policy().decide(3, Some(last), now),
            RestartDecision::Cooldown {
                remaining: Duration::from_secs(1790)
            }
        );
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        let now = SystemTime::now();
        let last = now - Duration::from_secs(1800);
        assert_eq!(policy().decide(3, Some(last), now), RestartDecision::Restart);

        let last = now - HOUR;
        assert_eq!(policy().decide(3, Some(last), now), RestartDecision::Restart);
    }

    #[test]
    fn future_restart_is_ignored_by_policy() {
        let now = SystemTime::now();
        assert_eq!(
            policy().decide(3, Some(now + HOUR), now),
            RestartDecision::Restart
        );
    }

    #[test]
    fn engine_reads_store() {
        let store = Arc::new(MemoryCooldownStore::with_last_restart(
            SystemTime::now() - Duration::from_secs(10),
        ));
        let engine = RestartEngine::new(policy(), store, Arc::new(NoopActuator));
        assert!(matches!(engine.decide(3), RestartDecision::Cooldown { .. }));
        assert_eq!(engine.decide(1), RestartDecision::BelowThreshold);
    }

    #[test]
    fn engine_ignores_future_record() {
        let store = Arc::new(MemoryCooldownStore::with_last_restart(
            SystemTime::now() + HOUR,
        ));
        let engine = RestartEngine::new(policy(), store, Arc::new(NoopActuator));
        assert_eq!(engine.decide(3), RestartDecision::Restart);
    }

    #[test]
    fn unreadable_store_allows_restart() {
        let engine = RestartEngine::new(policy(), Arc::new(BrokenStore), Arc::new(NoopActuator));
        assert_eq!(engine.last_restart(), None);
        assert_eq!(engine.decide(3), RestartDecision::Restart);
    }

    #[tokio::test]
    async fn restart_records_timestamp_without_transmitter() {
        let store = Arc::new(MemoryCooldownStore::new());
        let engine = RestartEngine::new(
            RestartPolicy {
                threshold: 3,
                min_restart_interval: Duration::from_secs(1800),
            },
            store.clone(),
            Arc::new(NoopActuator),
        );

        let before = SystemTime::now();
        engine.restart().await;

        let recorded = store.read().unwrap().unwrap();
        assert!(recorded >= before);
        assert!(matches!(engine.decide(3), RestartDecision::Cooldown { .. }));
    }

    #[tokio::test]
    async fn failed_write_is_not_fatal() {
        let engine = RestartEngine::new(policy(), Arc::new(BrokenStore), Arc::new(NoopActuator));
        engine.restart().await;
        engine.power_on().await;
    }
}
