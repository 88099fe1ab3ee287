//! `regress check`: report the resolved PAL and verify its artifacts.

use super::harness;
use crate::cli::CheckArgs;
use regress_harness::error::Result;

pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let harness = harness(&args.config)?;
    let layout = harness.layout();
    let policy = harness.supervisor().policy();

    println!("mode:     {}", layout.mode());
    println!("pal dir:  {}", layout.pal_dir().display());
    println!("loader:   {}", layout.loader_path().display());
    println!("libpal:   {}", layout.libpal_path().display());
    println!("timeout:  {} s", policy.default_timeout().as_secs());

    layout.check_artifacts()?;

    match harness.has_debug() {
        Ok(debug) => println!("debug:    {}", if debug { "yes" } else { "no" }),
        Err(err) => {
            tracing::warn!(error = %err, "could not inspect libpal for debug info");
            println!("debug:    unknown");
        }
    }

    Ok(())
}
