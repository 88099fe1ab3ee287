//! Command implementations for regress.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the config resolution they share.

mod check;
mod native;
mod run;

use crate::cli::{Command, ConfigArgs};
use regress_harness::config::{ExecutionMode, HarnessConfig};
use regress_harness::error::Result;
use regress_harness::expect::expect_returncode;
use regress_harness::harness::RegressionHarness;
use std::time::Duration;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Native(args) => native::cmd_native(args),
        Command::Check(args) => check::cmd_check(args),
    }
}

/// Resolve the effective config: file (or defaults), then environment,
/// then `--sgx`.
fn load_config(args: &ConfigArgs) -> Result<HarnessConfig> {
    resolve_config(args, |name| std::env::var(name).ok())
}

fn resolve_config<F>(args: &ConfigArgs, lookup: F) -> Result<HarnessConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    config.apply_env_with(lookup);
    if args.sgx {
        config.mode = ExecutionMode::Sgx;
    }
    config.validate()?;

    tracing::debug!(
        mode = %config.mode,
        pkglibdir = %config.pkglibdir.display(),
        "resolved config"
    );
    Ok(config)
}

fn harness(args: &ConfigArgs) -> Result<RegressionHarness> {
    RegressionHarness::new(load_config(args)?)
}

fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Run `body`, requiring a specific failure when `expected` is set.
fn run_expecting<T, F>(expected: Option<i32>, body: F) -> Result<()>
where
    F: FnOnce() -> Result<T>,
{
    match expected {
        Some(code) => expect_returncode(code, body),
        None => body().map(|_| ()),
    }
}
