//! Assertion helper for runs that are supposed to fail with a given code.

use crate::error::{HarnessError, Result};

/// Run `body` and require that it fails with exit code `expected`.
///
/// Only [`HarnessError::NonZeroExit`] is intercepted. A matching code is a
/// pass; a different code, or no failure at all, becomes an
/// [`HarnessError::Assertion`]. Timeouts, launch errors and every other
/// error are returned unchanged.
///
/// `expected` must be non-zero; zero is rejected before `body` runs.
///
/// ```no_run
/// use regress_harness::expect::expect_returncode;
/// use regress_harness::harness::{RegressionHarness, RunOptions};
///
/// let harness = RegressionHarness::from_env()?;
/// expect_returncode(113, || harness.run_binary(&["exit_group"], RunOptions::default()))?;
/// # Ok::<(), regress_harness::error::HarnessError>(())
/// ```
pub fn expect_returncode<T, F>(expected: i32, body: F) -> Result<()>
where
    F: FnOnce() -> Result<T>,
{
    if expected == 0 {
        return Err(HarnessError::Config(
            "expected returncode should be nonzero".to_string(),
        ));
    }

    match body() {
        Ok(_) => Err(HarnessError::Assertion(format!(
            "did not fail (expected {})",
            expected
        ))),
        Err(HarnessError::NonZeroExit { code, .. }) if code == expected => Ok(()),
        Err(HarnessError::NonZeroExit { code, .. }) => Err(HarnessError::Assertion(format!(
            "failed with returncode {} (expected {})",
            code, expected
        ))),
        Err(other) => Err(other),
    }
}
