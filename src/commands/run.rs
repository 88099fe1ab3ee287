//! `regress run`: a test binary through the PAL loader.

use super::{harness, run_expecting, timeout_from_secs};
use crate::cli::RunArgs;
use regress_harness::error::{HarnessError, Result};
use regress_harness::harness::RunOptions;
use std::ffi::OsString;

pub fn cmd_run(args: RunArgs) -> Result<()> {
    let harness = harness(&args.config)?;
    let options = RunOptions {
        timeout: timeout_from_secs(args.timeout),
        prefix: parse_prefix(args.prefix.as_deref())?,
        ..Default::default()
    };

    run_expecting(args.expect_returncode, || match &args.gdb {
        Some(script) => harness.run_gdb(&args.args, script, options),
        None => harness.run_binary(&args.args, options),
    })
}

/// Split a shell-quoted prefix into arguments.
fn parse_prefix(prefix: Option<&str>) -> Result<Vec<OsString>> {
    let Some(prefix) = prefix else {
        return Ok(Vec::new());
    };
    let words = shell_words::split(prefix)
        .map_err(|e| HarnessError::Config(format!("invalid --prefix '{}': {}", prefix, e)))?;
    Ok(words.into_iter().map(OsString::from).collect())
}
