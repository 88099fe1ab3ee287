//! Timeout policy for supervised runs.
//!
//! The default bound depends on the execution mode (SGX runs carry more
//! per-invocation overhead). A caller may ask for a longer bound, never a
//! shorter one.

use std::time::Duration;

/// Default bound for direct (non-SGX) runs.
pub const DEFAULT_DIRECT_TIMEOUT_SECS: u64 = 10;

/// Default bound for SGX runs.
pub const DEFAULT_SGX_TIMEOUT_SECS: u64 = 20;

/// Resolves the effective timeout for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    default: Duration,
}

impl TimeoutPolicy {
    pub fn new(default: Duration) -> Self {
        Self { default }
    }

    /// Policy for the given execution mode.
    pub fn for_mode(sgx: bool, direct_secs: u64, sgx_secs: u64) -> Self {
        let secs = if sgx { sgx_secs } else { direct_secs };
        Self::new(Duration::from_secs(secs))
    }

    pub fn default_timeout(&self) -> Duration {
        self.default
    }

    /// `None` yields the default; an explicit request never lowers it.
    pub fn effective(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(requested) => self.default.max(requested),
            None => self.default,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::for_mode(false, DEFAULT_DIRECT_TIMEOUT_SECS, DEFAULT_SGX_TIMEOUT_SECS)
    }
}
