//! Enum types used in harness configuration.

use serde::{Deserialize, Serialize};

/// Which PAL flavour the tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Plain Linux host PAL (default).
    #[default]
    Direct,
    /// SGX enclave PAL; slower to start, so it gets a larger timeout.
    Sgx,
}

impl ExecutionMode {
    /// Subdirectory of the library dir that holds this mode's PAL.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Sgx => "sgx",
        }
    }

    pub fn is_sgx(self) -> bool {
        self == Self::Sgx
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}
