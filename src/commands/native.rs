//! `regress native`: a helper binary run directly.

use super::{harness, run_expecting, timeout_from_secs};
use crate::cli::NativeArgs;
use regress_harness::error::Result;
use regress_harness::harness::NativeOptions;

pub fn cmd_native(args: NativeArgs) -> Result<()> {
    let harness = harness(&args.config)?;
    let options = NativeOptions {
        timeout: timeout_from_secs(args.timeout),
        libpath: args.libpath,
        ..Default::default()
    };

    run_expecting(args.expect_returncode, || {
        harness.run_native_binary(&args.args, options)
    })
}
