//! routerdog-watchdog — outage detection and router restarts.
//!
//! # State machine
//!
//! ```text
//!            reachable: failures = 0, sleep interval
//!          ┌──────────────┐
//!          ▼              │
//!   ┌──► CHECKING ────────┘
//!   │      │ all unreachable: failures += 1
//!   │      ▼
//!   ├── COUNTING_FAILURE ── below threshold / cooldown: sleep interval
//!   │      │ threshold reached, cooldown elapsed
//!   │      ▼
//!   │   RESTARTING ── power cycle, record timestamp, failures = 0
//!   │      │
//!   │      ▼
//!   └── POST_RESTART_SETTLE ── sleep restart_duration
//! ```
//!
//! The loop never terminates on its own. Shutdown is observed during
//! checks and sleeps, never in the middle of a restart.

pub mod decision;
pub mod watchdog;

pub use decision::{RestartDecision, RestartEngine, RestartPolicy};
pub use watchdog::{Transition, Watchdog, WatchdogState};
