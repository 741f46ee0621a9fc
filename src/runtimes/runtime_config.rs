//! Runtime tunables, resolvable from the environment.

use std::thread;
use tracing::warn;

const ENV_MAX_IN_FLIGHT: &str = "SUPERSTEP_MAX_IN_FLIGHT";

/// Knobs that shape how a run executes, independent of topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on concurrently executing tasks within one superstep.
    pub max_in_flight: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_in_flight: thread::available_parallelism().map_or(4, usize::from),
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Resolve from the environment (`SUPERSTEP_MAX_IN_FLIGHT`), falling back
    /// to the defaults. Loads `.env` if one is present.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_MAX_IN_FLIGHT) {
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 => config.max_in_flight = n,
                _ => warn!(value = %raw, "ignoring invalid {ENV_MAX_IN_FLIGHT}"),
            }
        }
        config
    }
}
