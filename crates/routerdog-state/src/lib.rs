//! routerdog-state — persistence for the restart cooldown.
//!
//! The only durable state routerdog keeps is a single scalar: the wall-clock
//! time of the last restart, stored as seconds since the Unix epoch in a
//! plain text file so that it survives process restarts.
//!
//! Read failures (missing file, unparsable content) surface as `None` or a
//! `StateError` and callers treat both as "no prior restart known", which
//! never blocks recovery.

pub mod error;
pub mod store;

pub use error::{StateError, StateResult};
pub use store::{CooldownStore, FileCooldownStore, MemoryCooldownStore};
