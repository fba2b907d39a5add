//! routerdog-probe — reachability probing.
//!
//! # Architecture
//!
//! ```text
//! ReachabilityChecker
//!   └── for attempt in 0..=retries
//!       ├── Prober::probe(host) for each host, in order
//!       │   ├── Host::Icmp → system `ping`, one echo request
//!       │   └── Host::Http → one GET, any response counts
//!       ├── first reachable host → CheckOutcome::Reachable
//!       └── sleep retry_interval before the next attempt
//! ```
//!
//! Probes never fail: timeouts, refused connections, DNS errors and
//! missing `ping` binaries all collapse to "unreachable".

pub mod checker;
pub mod prober;

pub use checker::{CheckOutcome, ReachabilityChecker};
pub use prober::{NetworkProber, Prober, http_probe, icmp_probe};
