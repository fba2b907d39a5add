//! The watchdog loop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use routerdog_core::WatchdogConfig;
use routerdog_probe::{CheckOutcome, ReachabilityChecker};

use crate::decision::{RestartDecision, RestartEngine};

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Checking,
    CountingFailure,
    Restarting,
    PostRestartSettle,
}

/// The result of executing one state: where to go next, and how long to
/// pause before getting there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: WatchdogState,
    pub pause: Duration,
}

impl Transition {
    fn to(next: WatchdogState) -> Self {
        Self {
            next,
            pause: Duration::ZERO,
        }
    }

    fn after(next: WatchdogState, pause: Duration) -> Self {
        Self { next, pause }
    }
}

/// Periodically checks connectivity and power-cycles the router after a
/// sustained outage.
pub struct Watchdog {
    checker: ReachabilityChecker,
    engine: RestartEngine,
    interval: Duration,
    settle: Duration,
    /// Consecutive all-unreachable cycles since the last reset.
    failures: u32,
    state: WatchdogState,
}

impl Watchdog {
    pub fn new(
        checker: ReachabilityChecker,
        engine: RestartEngine,
        interval: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            checker,
            engine,
            interval,
            settle,
            failures: 0,
            state: WatchdogState::Checking,
        }
    }

    pub fn from_config(
        checker: ReachabilityChecker,
        engine: RestartEngine,
        config: &WatchdogConfig,
    ) -> Self {
        Self::new(checker, engine, config.interval, config.restart_duration)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    /// Execute the current state and move to the next one.
    ///
    /// The returned pause has not been slept yet; `run` does that.
    pub async fn step(&mut self) -> Transition {
        let transition = match self.state {
            WatchdogState::Checking => self.check().await,
            WatchdogState::CountingFailure => self.count_failure(),
            WatchdogState::Restarting => {
                self.engine.restart().await;
                self.failures = 0;
                info!(
                    settle_secs = self.settle.as_secs_f64(),
                    "restarted, waiting for the router to boot"
                );
                Transition::to(WatchdogState::PostRestartSettle)
            }
            WatchdogState::PostRestartSettle => {
                Transition::after(WatchdogState::Checking, self.settle)
            }
        };
        self.state = transition.next;
        transition
    }

    async fn check(&mut self) -> Transition {
        // A panicking probe must not take the loop down with it.
        let checker = self.checker.clone();
        match tokio::spawn(async move { checker.check().await }).await {
            Ok(CheckOutcome::Reachable { host, attempt }) => {
                if self.failures > 0 {
                    info!(%host, previous_failures = self.failures, "connectivity restored");
                }
                self.failures = 0;
                info!(%host, attempt, "host reachable");
                Transition::after(WatchdogState::Checking, self.interval)
            }
            Ok(CheckOutcome::AllUnreachable) => {
                self.failures = self.failures.saturating_add(1);
                error!(failures = self.failures, "all hosts are unreachable");
                Transition::to(WatchdogState::CountingFailure)
            }
            Err(e) => {
                error!(error = %e, "check cycle panicked, outcome discarded");
                Transition::after(WatchdogState::Checking, self.interval)
            }
        }
    }

    fn count_failure(&mut self) -> Transition {
        match self.engine.decide(self.failures) {
            RestartDecision::BelowThreshold => {
                Transition::after(WatchdogState::Checking, self.interval)
            }
            RestartDecision::Cooldown { remaining } => {
                warn!(
                    failures = self.failures,
                    remaining_secs = remaining.as_secs(),
                    min_restart_interval_secs = self.engine.policy().min_restart_interval.as_secs(),
                    "restart skipped, last restart is too recent"
                );
                Transition::after(WatchdogState::Checking, self.interval)
            }
            RestartDecision::Restart => Transition::to(WatchdogState::Restarting),
        }
    }

    /// Switch the router on, then check forever until `shutdown` fires.
    ///
    /// Shutdown interrupts checks and sleeps. A restart in progress always
    /// runs to completion first.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.engine.power_on().await;
        info!(
            interval_secs = self.interval.as_secs_f64(),
            threshold = self.engine.policy().threshold,
            "starting host checks"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let transition = if self.state == WatchdogState::Restarting {
                self.step().await
            } else {
                tokio::select! {
                    transition = self.step() => transition,
                    _ = shutdown.changed() => break,
                }
            };

            if transition.pause.is_zero() {
                continue;
            }
            if transition.next == WatchdogState::Checking {
                info!(delay_secs = transition.pause.as_secs_f64(), "next check scheduled");
            }
            tokio::select! {
                _ = tokio::time::sleep(transition.pause) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(failures = self.failures, "watchdog stopped");
    }
}
