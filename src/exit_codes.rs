//! Exit code constants for the `regress` CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, missing artifact)
//! - 2: Launch failure (the OS refused to start the process)
//! - 3: Child failure (non-zero exit, or an unmet exit-code expectation)
//! - 4: Timeout (the process group was killed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration or missing artifact.
pub const USER_ERROR: i32 = 1;

/// The child process could not be created.
pub const LAUNCH_FAILURE: i32 = 2;

/// The child ran to completion but failed, or failed with an unexpected code.
pub const CHILD_FAILURE: i32 = 3;

/// The child did not finish within the effective timeout.
pub const TIMEOUT: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, LAUNCH_FAILURE, CHILD_FAILURE, TIMEOUT];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_have_expected_values() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(LAUNCH_FAILURE, 2);
        assert_eq!(CHILD_FAILURE, 3);
        assert_eq!(TIMEOUT, 4);
    }
}
