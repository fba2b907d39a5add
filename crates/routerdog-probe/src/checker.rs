//! Check cycles over the configured host set.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use routerdog_core::{Host, WatchdogConfig};

use crate::prober::Prober;

/// Result of one full check cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// At least one host answered.
    Reachable {
        host: Host,
        /// Zero-based attempt in which the host answered.
        attempt: u32,
    },
    /// No host answered in any of the `retries + 1` attempts.
    AllUnreachable,
}

impl CheckOutcome {
    pub fn is_all_unreachable(&self) -> bool {
        matches!(self, CheckOutcome::AllUnreachable)
    }
}

/// Decides whether the entire host set is unreachable.
#[derive(Clone)]
pub struct ReachabilityChecker {
    prober: Arc<dyn Prober>,
    hosts: Vec<Host>,
    retries: u32,
    retry_interval: Duration,
}

impl ReachabilityChecker {
    pub fn new(
        prober: Arc<dyn Prober>,
        hosts: Vec<Host>,
        retries: u32,
        retry_interval: Duration,
    ) -> Self {
        Self {
            prober,
            hosts,
            retries,
            retry_interval,
        }
    }

    pub fn from_config(prober: Arc<dyn Prober>, config: &WatchdogConfig) -> Self {
        Self::new(
            prober,
            config.hosts.clone(),
            config.retries,
            config.retry_interval,
        )
    }

    /// Run one check cycle.
    ///
    /// Hosts are probed in list order and the cycle stops at the first
    /// reachable one. If none answers, the whole list is retried up to
    /// `retries` more times, `retry_interval` apart.
    pub async fn check(&self) -> CheckOutcome {
        for attempt in 0..=self.retries {
            for host in &self.hosts {
                if self.prober.probe(host).await {
                    return CheckOutcome::Reachable {
                        host: host.clone(),
                        attempt,
                    };
                }
            }

            if attempt < self.retries {
                debug!(
                    retry = attempt + 1,
                    of = self.retries,
                    delay_secs = self.retry_interval.as_secs_f64(),
                    "no host was reachable, retrying"
                );
                tokio::time::sleep(self.retry_interval).await;
            }
        }

        CheckOutcome::AllUnreachable
    }

    /// `true` iff every host was unreachable across all attempts.
    pub async fn all_unreachable(&self) -> bool {
        self.check().await.is_all_unreachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns scripted results in call order (`false` once exhausted).
    #[derive(Default)]
    struct ScriptedProber {
        results: Mutex<VecDeque<bool>>,
        calls: Mutex<Vec<Host>>,
    }

    impl ScriptedProber {
        fn new(results: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.iter().copied().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Host> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, host: &Host) -> bool {
            self.calls.lock().unwrap().push(host.clone());
            self.results.lock().unwrap().pop_front().unwrap_or(false)
        }
    }

    fn hosts(list: &[&str]) -> Vec<Host> {
        list.iter().map(|h| Host::parse(h).unwrap()).collect()
    }

    #[tokio::test]
    async fn no_retries_probes_each_host_once() {
        let prober = ScriptedProber::new(&[]);
        let checker = ReachabilityChecker::new(
            prober.clone(),
            hosts(&["1.1.1.1", "8.8.8.8", "https://example.com"]),
            0,
            Duration::from_secs(10),
        );

        assert!(checker.all_unreachable().await);
        assert_eq!(prober.calls().len(), 3);
    }

    #[tokio::test]
    async fn first_reachable_host_short_circuits() {
        let prober = ScriptedProber::new(&[false, true]);
        let list = hosts(&["1.1.1.1", "https://example.com", "8.8.8.8"]);
        let checker = ReachabilityChecker::new(prober.clone(), list.clone(), 0, Duration::ZERO);

        let outcome = checker.check().await;
        assert_eq!(
            outcome,
            CheckOutcome::Reachable {
                host: list[1].clone(),
                attempt: 0
            }
        );
        assert_eq!(prober.calls(), list[..2].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_stop_at_first_success() {
        // Attempt 0: both down. Attempt 1: first host down, second up.
        let prober = ScriptedProber::new(&[false, false, false, true]);
        let checker = ReachabilityChecker::new(
            prober.clone(),
            hosts(&["1.1.1.1", "8.8.8.8"]),
            5,
            Duration::from_secs(10),
        );

        let start = tokio::time::Instant::now();
        let outcome = checker.check().await;

        assert!(matches!(outcome, CheckOutcome::Reachable { attempt: 1, .. }));
        assert_eq!(prober.calls().len(), 4);
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_all_unreachable() {
        let prober = ScriptedProber::new(&[]);
        let checker = ReachabilityChecker::new(
            prober.clone(),
            hosts(&["1.1.1.1", "8.8.8.8"]),
            2,
            Duration::from_secs(10),
        );

        let start = tokio::time::Instant::now();
        assert_eq!(checker.check().await, CheckOutcome::AllUnreachable);

        // Three attempts, two pauses in between, none after the last one.
        assert_eq!(prober.calls().len(), 6);
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test]
    async fn probes_follow_list_order() {
        let prober = ScriptedProber::new(&[]);
        let list = hosts(&["8.8.8.8", "https://a.example", "1.1.1.1"]);
        let checker = ReachabilityChecker::new(prober.clone(), list.clone(), 1, Duration::ZERO);

        checker.check().await;
        let mut expected = list.clone();
        expected.extend(list);
        assert_eq!(prober.calls(), expected);
    }
}
