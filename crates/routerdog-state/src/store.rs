//! Cooldown stores.
//!
//! `FileCooldownStore` keeps the timestamp as the whole textual content of a
//! file (`1729260000.512`). `MemoryCooldownStore` is the ephemeral variant
//! used in tests and observe-only runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{StateError, StateResult};

/// Persists the time of the last restart action.
pub trait CooldownStore: Send + Sync {
    /// The last recorded restart, or `None` if no restart is known.
    fn read(&self) -> StateResult<Option<SystemTime>>;

    /// Record a restart that happened at `at`.
    fn write(&self, at: SystemTime) -> StateResult<()>;
}

/// Cooldown record backed by a single text file.
#[derive(Debug, Clone)]
pub struct FileCooldownStore {
    path: PathBuf,
}

impl FileCooldownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CooldownStore for FileCooldownStore {
    fn read(&self) -> StateResult<Option<SystemTime>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "no cooldown record");
                return Ok(None);
            }
            Err(e) => return Err(StateError::Read(format!("{}: {e}", self.path.display()))),
        };

        let line = content.lines().next().unwrap_or_default().trim();
        if line.is_empty() {
            return Ok(None);
        }
        parse_timestamp(line).map(Some)
    }

    fn write(&self, at: SystemTime) -> StateResult<()> {
        let secs = at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StateError::Write(format!("timestamp before epoch: {e}")))?
            .as_secs_f64();

        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, secs.to_string())
            .map_err(|e| StateError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StateError::Write(format!("{}: {e}", self.path.display())))?;

        debug!(path = ?self.path, secs, "cooldown record written");
        Ok(())
    }
}

/// Parse seconds since the Unix epoch, as written by `FileCooldownStore`.
fn parse_timestamp(s: &str) -> StateResult<SystemTime> {
    let secs: f64 = s
        .parse()
        .map_err(|_| StateError::Corrupt(format!("not a number: '{s}'")))?;
    let offset = Duration::try_from_secs_f64(secs)
        .map_err(|_| StateError::Corrupt(format!("out of range: '{s}'")))?;
    UNIX_EPOCH
        .checked_add(offset)
        .ok_or_else(|| StateError::Corrupt(format!("out of range: '{s}'")))
}

/// In-memory cooldown record (lost on exit).
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    last: Mutex<Option<SystemTime>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a restart already on record.
    pub fn with_last_restart(at: SystemTime) -> Self {
        Self {
            last: Mutex::new(Some(at)),
        }
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn read(&self) -> StateResult<Option<SystemTime>> {
        let last = self
            .last
            .lock()
            .map_err(|e| StateError::Read(e.to_string()))?;
        Ok(*last)
    }

    fn write(&self, at: SystemTime) -> StateResult<()> {
        let mut last = self
            .last
            .lock()
            .map_err(|e| StateError::Write(e.to_string()))?;
        *last = Some(at);
        Ok(())
    }
}
