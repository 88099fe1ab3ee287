//! Error types for the regression harness.
//!
//! Uses thiserror for derive macros. Every variant maps to a CLI exit code
//! through [`HarnessError::exit_code`].

use crate::capture::CapturedOutput;
use crate::exit_codes;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for harness operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Invalid configuration or invalid use of the harness API.
    ///
    /// Raised before any process is launched.
    #[error("{0}")]
    Config(String),

    /// A required artifact (loader, libpal) is missing on disk.
    #[error("{what} ({}) not found", .path.display())]
    MissingArtifact { what: &'static str, path: PathBuf },

    /// The OS refused to create the process.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or signalling a running child failed.
    #[error("failed to supervise process: {0}")]
    Supervise(String),

    /// The process did not finish in time and its group was killed.
    #[error("timeout ({} s) expired", display_secs(.timeout))]
    Timeout { timeout: Duration },

    /// The process ran to completion and returned a failing status.
    #[error("command '{command}' returned non-zero exit status {code}")]
    NonZeroExit {
        code: i32,
        command: String,
        output: CapturedOutput,
    },

    /// A test-level assertion about the run did not hold.
    #[error("{0}")]
    Assertion(String),
}

impl HarnessError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::Config(_) => exit_codes::USER_ERROR,
            HarnessError::MissingArtifact { .. } => exit_codes::USER_ERROR,
            HarnessError::Launch { .. } => exit_codes::LAUNCH_FAILURE,
            HarnessError::Supervise(_) => exit_codes::LAUNCH_FAILURE,
            HarnessError::Timeout { .. } => exit_codes::TIMEOUT,
            HarnessError::NonZeroExit { .. } => exit_codes::CHILD_FAILURE,
            HarnessError::Assertion(_) => exit_codes::CHILD_FAILURE,
        }
    }

    /// Exit code of the child, if this is a non-zero exit.
    pub fn returncode(&self) -> Option<i32> {
        match self {
            HarnessError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn display_secs(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        timeout.as_secs().to_string()
    } else {
        format!("{:.3}", timeout.as_secs_f64())
    }
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
