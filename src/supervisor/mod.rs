//! Timeout-bounded supervision of a launched process.
//!
//! The supervisor launches a [`LaunchSpec`], drains both output pipes on
//! reader threads while polling for exit, and races that against the
//! effective timeout. A run is complete once the leader has exited and both
//! pipes have hit end-of-stream. If the deadline passes first, the whole
//! process group receives `SIGKILL` exactly once.

use crate::capture::Drainers;
use crate::error::{HarnessError, Result};
use crate::launch::{LaunchSpec, Launched};
use crate::outcome::Outcome;
use crate::timeout::TimeoutPolicy;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

#[cfg(test)]
mod tests;

/// Upper bound on how long one wait step sleeps.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs processes under a timeout policy.
///
/// Holds no per-run state; independent runs may share one supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor {
    policy: TimeoutPolicy,
}

enum WaitResult {
    Completed(ExitStatus),
    Expired { leader_exited: bool },
}

impl Supervisor {
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Launch `spec` and wait for it under the effective timeout.
    ///
    /// Launch failures are returned as errors. Non-zero exits and timeouts
    /// are outcomes; use [`Outcome::into_result`] to turn them into errors.
    /// On every path except a timeout, the captured output is forwarded to
    /// the harness's own stdout/stderr before returning.
    pub fn run(&self, spec: &LaunchSpec, timeout: Option<Duration>) -> Result<Outcome> {
        let bound = self.policy.effective(timeout);
        // A bound too large to represent as an instant never expires.
        let deadline = Instant::now().checked_add(bound);
        if deadline.is_none() {
            tracing::debug!(
                timeout = ?bound,
                "timeout beyond representable range, waiting without deadline"
            );
        }
        let launched = spec.launch()?;
        supervise(launched, bound, deadline)
    }
}

fn supervise(
    mut launched: Launched,
    bound: Duration,
    deadline: Option<Instant>,
) -> Result<Outcome> {
    let mut drainers = match start_drainers(&mut launched) {
        Ok(drainers) => drainers,
        Err(err) => {
            abandon(&mut launched);
            return Err(err);
        }
    };

    let waited = match wait_until(&mut launched, &mut drainers, deadline) {
        Ok(waited) => waited,
        Err(err) => {
            abandon(&mut launched);
            return Err(err);
        }
    };

    match waited {
        WaitResult::Completed(status) => {
            let output = drainers.into_output();
            output.forward();
            let outcome = Outcome::from_status(status, output);
            tracing::debug!(
                pid = launched.pid(),
                returncode = outcome.returncode(),
                "process finished"
            );
            Ok(outcome)
        }
        WaitResult::Expired { leader_exited } => {
            tracing::warn!(
                pid = launched.pid(),
                pgid = launched.pgid.as_raw(),
                timeout = ?bound,
                leader_exited,
                discarded_bytes = drainers.collected_bytes(),
                "timeout expired, killing process group"
            );
            terminate_expired(&mut launched, leader_exited, kill_group)?;
            Ok(Outcome::Timeout { bound })
        }
    }
}

/// Kill the group of an expired run and reap its leader.
///
/// The leader is reaped even when the group kill fails; in that case it is
/// killed on its own first and the kill error is returned afterwards.
fn terminate_expired<K>(launched: &mut Launched, leader_exited: bool, kill: K) -> Result<()>
where
    K: FnOnce(Pid) -> Result<()>,
{
    let killed = kill(launched.pgid);
    if let Err(err) = &killed {
        tracing::error!(
            pid = launched.pid(),
            pgid = launched.pgid.as_raw(),
            error = %err,
            "failed to kill process group, killing leader only"
        );
        if !leader_exited {
            let _ = launched.child.kill();
        }
    }

    if !leader_exited {
        launched.child.wait().map_err(|e| {
            HarnessError::Supervise(format!(
                "failed to reap process {} after kill: {}",
                launched.pid(),
                e
            ))
        })?;
    }

    killed
}

fn start_drainers(launched: &mut Launched) -> Result<Drainers> {
    let stdout = launched
        .child
        .stdout
        .take()
        .ok_or_else(|| HarnessError::Supervise("child stdout is not piped".to_string()))?;
    let stderr = launched
        .child
        .stderr
        .take()
        .ok_or_else(|| HarnessError::Supervise("child stderr is not piped".to_string()))?;

    Drainers::start(stdout, stderr)
        .map_err(|e| HarnessError::Supervise(format!("failed to start output readers: {}", e)))
}

/// Wait for exit plus end-of-stream on both pipes, or for the deadline.
///
/// Exit status and any already-reported end-of-stream are re-checked on
/// every step before the deadline test, so a process that finishes at the
/// boundary is reported as finished, not killed. Without a deadline this
/// waits until the run completes.
fn wait_until(
    launched: &mut Launched,
    drainers: &mut Drainers,
    deadline: Option<Instant>,
) -> Result<WaitResult> {
    let mut status = None;

    loop {
        let now = Instant::now();
        let expired = deadline.is_some_and(|deadline| now >= deadline);

        if status.is_none() {
            status = launched.child.try_wait().map_err(|e| {
                HarnessError::Supervise(format!(
                    "failed to check status of process {}: {}",
                    launched.pid(),
                    e
                ))
            })?;
        }

        if expired {
            drainers.collect_ready().map_err(read_error)?;
        }

        if let Some(status) = status
            && drainers.is_complete()
        {
            return Ok(WaitResult::Completed(status));
        }

        if expired {
            return Ok(WaitResult::Expired {
                leader_exited: status.is_some(),
            });
        }

        let step = match deadline {
            Some(deadline) => POLL_INTERVAL.min(deadline - now),
            None => POLL_INTERVAL,
        };
        drainers.poll(step).map_err(read_error)?;
    }
}

fn read_error(e: std::io::Error) -> HarnessError {
    HarnessError::Supervise(format!("failed to read child output: {}", e))
}

/// Send `SIGKILL` to every member of the group.
///
/// `ESRCH` means every member is already gone, which is fine.
fn kill_group(pgid: Pid) -> Result<()> {
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            tracing::debug!(pgid = pgid.as_raw(), "process group already gone");
            Ok(())
        }
        Err(e) => Err(HarnessError::Supervise(format!(
            "failed to kill process group {}: {}",
            pgid, e
        ))),
    }
}

/// Tear down a run that failed inside the supervisor itself.
fn abandon(launched: &mut Launched) {
    let _ = killpg(launched.pgid, Signal::SIGKILL);
    let _ = launched.child.wait();
}
