//! HarnessConfig struct definition and default implementation.

use super::types::ExecutionMode;
use crate::timeout::{DEFAULT_DIRECT_TIMEOUT_SECS, DEFAULT_SGX_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Library directory used when neither the config file nor the
/// environment names one.
pub const DEFAULT_PKGLIBDIR: &str = "/usr/local/lib/x86_64-linux-gnu/gramine";

/// Configuration for the regression harness.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    // =========================================================================
    // Execution mode
    // =========================================================================
    /// Which PAL to run against (`direct` or `sgx`).
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Installed library directory holding `direct/` and `sgx/` PAL trees.
    #[serde(default = "default_pkglibdir")]
    pub pkglibdir: PathBuf,

    // =========================================================================
    // Timeouts
    // =========================================================================
    /// Default per-run timeout in direct mode, in seconds.
    #[serde(default = "default_direct_timeout_secs")]
    pub direct_timeout_secs: u64,

    /// Default per-run timeout in SGX mode, in seconds.
    #[serde(default = "default_sgx_timeout_secs")]
    pub sgx_timeout_secs: u64,

    // =========================================================================
    // External tools
    // =========================================================================
    /// Debugger used by `run_gdb`.
    #[serde(default = "default_debugger")]
    pub debugger: String,

    /// Tool used to inspect libpal for debug info.
    #[serde(default = "default_objdump")]
    pub objdump: String,
}

// Default value functions for serde
fn default_pkglibdir() -> PathBuf {
    PathBuf::from(DEFAULT_PKGLIBDIR)
}
fn default_direct_timeout_secs() -> u64 {
    DEFAULT_DIRECT_TIMEOUT_SECS
}
fn default_sgx_timeout_secs() -> u64 {
    DEFAULT_SGX_TIMEOUT_SECS
}
fn default_debugger() -> String {
    "gdb".to_string()
}
fn default_objdump() -> String {
    "objdump".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            pkglibdir: default_pkglibdir(),
            direct_timeout_secs: default_direct_timeout_secs(),
            sgx_timeout_secs: default_sgx_timeout_secs(),
            debugger: default_debugger(),
            objdump: default_objdump(),
        }
    }
}
