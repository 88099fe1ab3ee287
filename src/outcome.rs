//! Terminal classification of a supervised run.

use crate::capture::CapturedOutput;
use crate::error::{HarnessError, Result};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::time::Duration;

/// How a supervised invocation ended. Produced once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit code zero.
    Success(CapturedOutput),
    /// The process finished with a failing status.
    ///
    /// Death by a signal the harness did not send is reported as the
    /// negated signal number.
    NonZeroExit { code: i32, output: CapturedOutput },
    /// The bound expired and the process group was killed.
    Timeout { bound: Duration },
}

impl Outcome {
    /// Classify a finished process from its exit status.
    pub fn from_status(status: ExitStatus, output: CapturedOutput) -> Self {
        let code = match (status.code(), status.signal()) {
            (Some(code), _) => code,
            (None, Some(signal)) => -signal,
            (None, None) => -1,
        };

        if code == 0 {
            Outcome::Success(output)
        } else {
            Outcome::NonZeroExit { code, output }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Exit code of a finished run; `None` for a timeout.
    pub fn returncode(&self) -> Option<i32> {
        match self {
            Outcome::Success(_) => Some(0),
            Outcome::NonZeroExit { code, .. } => Some(*code),
            Outcome::Timeout { .. } => None,
        }
    }

    /// Captured output of a finished run; `None` for a timeout.
    pub fn output(&self) -> Option<&CapturedOutput> {
        match self {
            Outcome::Success(output) | Outcome::NonZeroExit { output, .. } => Some(output),
            Outcome::Timeout { .. } => None,
        }
    }

    /// Turn failing outcomes into errors.
    ///
    /// `command` names the invocation in the `NonZeroExit` error.
    pub fn into_result(self, command: impl Into<String>) -> Result<CapturedOutput> {
        match self {
            Outcome::Success(output) => Ok(output),
            Outcome::NonZeroExit { code, output } => Err(HarnessError::NonZeroExit {
                code,
                command: command.into(),
                output,
            }),
            Outcome::Timeout { bound } => Err(HarnessError::Timeout { timeout: bound }),
        }
    }
}
