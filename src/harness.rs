use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fixture::SizeMode;

/// Bytes per MB for all throughput figures.
pub const MB: f64 = 1024.0 * 1024.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }

    pub fn iterations(&self) -> u64 {
        match self {
            Profile::Quick => 50,
            Profile::Full => 500,
        }
    }

    pub fn bulk_size(&self) -> usize {
        match self {
            Profile::Quick => 500,
            Profile::Full => 5_000,
        }
    }

    pub fn trials(&self) -> u32 {
        match self {
            Profile::Quick => 2,
            Profile::Full => 10,
        }
    }
}

/// Resolved run parameters. Built once from the command line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Single-record loop count (I).
    pub iterations: u64,
    /// Records in the bulk collection (N).
    pub bulk_size: usize,
    /// Full four-phase runs per codec.
    pub trials: u32,
    pub size_mode: SizeMode,
}

impl BenchConfig {
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            iterations: profile.iterations(),
            bulk_size: profile.bulk_size(),
            trials: profile.trials(),
            size_mode: SizeMode::Shallow,
        }
    }

    /// Every count must be non-zero; the driver runs exactly what is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Zero("iterations"));
        }
        if self.bulk_size == 0 {
            return Err(ConfigError::Zero("bulk_size"));
        }
        if self.trials == 0 {
            return Err(ConfigError::Zero("trials"));
        }
        Ok(())
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::from_profile(Profile::Full)
    }
}

/// Monotonic time source for phase timing.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Run `f` and return its output with the elapsed time on `clock`.
pub fn time_with<C: Clock + ?Sized, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let out = f();
    let elapsed = clock.now().saturating_sub(start);
    (out, elapsed)
}

/// `bytes / elapsed` in MB/s; `None` when the clock did not advance.
pub fn throughput_mb_s(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let value = (bytes as f64) / secs / MB;
    value.is_finite().then_some(value)
}
