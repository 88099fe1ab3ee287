//! Tests for the supervisor: real child processes driven through `sh`.

use super::*;
use crate::capture::CapturedOutput;
use std::path::Path;
use tempfile::TempDir;

fn quick_supervisor() -> Supervisor {
    Supervisor::new(TimeoutPolicy::new(Duration::from_millis(300)))
}

fn generous_supervisor() -> Supervisor {
    Supervisor::new(TimeoutPolicy::new(Duration::from_secs(10)))
}

fn sh(script: &str) -> LaunchSpec {
    LaunchSpec::new(["sh", "-c", script])
}

/// Linux: a pid counts as alive unless it is gone or a zombie.
fn process_alive(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => {
            // Format: "pid (comm) S ..."; comm may contain spaces.
            let state = stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next());
            state != Some("Z")
        }
        Err(_) => false,
    }
}

fn wait_for_exit(pid: i32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

fn read_pid(path: &Path) -> i32 {
    std::fs::read_to_string(path)
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

#[test]
fn test_hello_is_success_with_exact_output() {
    let outcome = generous_supervisor()
        .run(&sh("echo hello"), Some(Duration::from_secs(10)))
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Success(CapturedOutput::new(b"hello\n".to_vec(), Vec::new()))
    );
}

#[test]
fn test_both_streams_captured_separately() {
    let outcome = generous_supervisor()
        .run(&sh("printf out; printf err >&2"), None)
        .unwrap();
    let output = outcome.output().unwrap();
    assert_eq!(output.stdout, b"out");
    assert_eq!(output.stderr, b"err");
}

#[test]
fn test_non_zero_exit_code_is_reported_exactly() {
    let outcome = generous_supervisor().run(&sh("exit 7"), None).unwrap();
    assert_eq!(outcome.returncode(), Some(7));
    assert!(matches!(outcome, Outcome::NonZeroExit { code: 7, .. }));
}

#[test]
fn test_non_zero_exit_keeps_output() {
    let outcome = generous_supervisor()
        .run(&sh("echo diagnostics >&2; exit 3"), None)
        .unwrap();
    match outcome {
        Outcome::NonZeroExit { code, output } => {
            assert_eq!(code, 3);
            assert_eq!(output.stderr, b"diagnostics\n");
        }
        other => panic!("expected non-zero exit, got {other:?}"),
    }
}

#[test]
fn test_signal_death_is_non_zero_exit() {
    let outcome = generous_supervisor()
        .run(&sh("kill -TERM $$"), None)
        .unwrap();
    assert_eq!(outcome.returncode(), Some(-15));
}

#[test]
fn test_large_output_does_not_deadlock() {
    let outcome = generous_supervisor()
        .run(
            &sh("head -c 4194304 /dev/zero; head -c 2097152 /dev/zero >&2"),
            None,
        )
        .unwrap();
    let output = outcome.output().unwrap();
    assert_eq!(output.stdout.len(), 4_194_304);
    assert_eq!(output.stderr.len(), 2_097_152);
    assert!(outcome.is_success());
}

#[test]
fn test_timeout_reports_bound_used() {
    let started = Instant::now();
    let outcome = quick_supervisor().run(&sh("sleep 30"), None).unwrap();
    assert_eq!(
        outcome,
        Outcome::Timeout {
            bound: Duration::from_millis(300)
        }
    );
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_timeout_request_below_default_is_raised() {
    let outcome = quick_supervisor()
        .run(&sh("sleep 30"), Some(Duration::from_millis(10)))
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Timeout {
            bound: Duration::from_millis(300)
        }
    );
}

#[test]
fn test_timeout_kills_whole_process_group() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("grandchild.pid");
    let script = format!(
        "sleep 30 & echo $! > '{}'; wait",
        pid_file.display()
    );

    let outcome = quick_supervisor().run(&sh(&script), None).unwrap();
    assert!(matches!(outcome, Outcome::Timeout { .. }));

    let grandchild = read_pid(&pid_file);
    assert!(
        wait_for_exit(grandchild),
        "grandchild {} survived the timeout",
        grandchild
    );
}

#[test]
fn test_descendant_holding_pipe_open_times_out() {
    let temp_dir = TempDir::new().unwrap();
    let pid_file = temp_dir.path().join("straggler.pid");
    // The leader exits at once; the background sleep keeps stdout open.
    let script = format!("sleep 30 & echo $! > '{}'", pid_file.display());

    let outcome = quick_supervisor().run(&sh(&script), None).unwrap();
    assert!(matches!(outcome, Outcome::Timeout { .. }));

    let straggler = read_pid(&pid_file);
    assert!(wait_for_exit(straggler), "straggler {} survived", straggler);
}

#[test]
fn test_launch_error_propagates() {
    let err = generous_supervisor()
        .run(&LaunchSpec::new(["/nonexistent/regress-binary-xyz"]), None)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Launch { .. }));
}

#[test]
fn test_non_executable_file_is_launch_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("not-executable");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();

    let err = generous_supervisor()
        .run(&LaunchSpec::new([&path]), None)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Launch { .. }));
}

#[test]
fn test_env_overrides_reach_child() {
    let spec = sh("printf %s \"$REGRESS_MARKER\"").with_env("REGRESS_MARKER", "from-harness");
    let outcome = generous_supervisor().run(&spec, None).unwrap();
    assert_eq!(outcome.output().unwrap().stdout, b"from-harness");
}

#[test]
fn test_prefix_runs_before_target() {
    let spec = LaunchSpec::new(["echo", "target"])
        .with_prefix(["sh", "-c", "printf 'prefix '; exec \"$0\" \"$@\""]);
    let outcome = generous_supervisor().run(&spec, None).unwrap();
    assert_eq!(outcome.output().unwrap().stdout, b"prefix target\n");
}

#[test]
fn test_current_dir_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let spec = sh("pwd -P").with_current_dir(temp_dir.path());
    let outcome = generous_supervisor().run(&spec, None).unwrap();
    let expected = temp_dir.path().canonicalize().unwrap();
    assert_eq!(
        outcome.output().unwrap().stdout_lossy().trim_end(),
        expected.to_string_lossy()
    );
}

#[test]
fn test_classification_is_repeatable() {
    let supervisor = generous_supervisor();
    let spec = sh("echo same; exit 4");
    let first = supervisor.run(&spec, None).unwrap();
    let second = supervisor.run(&spec, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_runs_are_independent() {
    let supervisor = generous_supervisor();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let spec = sh(&format!("echo run-{i}; exit {i}"));
                supervisor.run(&spec, None).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.join().unwrap();
        assert_eq!(outcome.returncode(), Some(i as i32));
        assert_eq!(
            outcome.output().unwrap().stdout_lossy(),
            format!("run-{i}\n")
        );
    }
}

#[test]
fn test_unrepresentable_timeout_waits_without_deadline() {
    let outcome = generous_supervisor()
        .run(&sh("echo done"), Some(Duration::from_secs(u64::MAX)))
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Success(CapturedOutput::new(b"done\n".to_vec(), Vec::new()))
    );
}

#[test]
fn test_maximal_default_timeout_still_completes() {
    let supervisor = Supervisor::new(TimeoutPolicy::new(Duration::MAX));
    let outcome = supervisor.run(&sh("exit 5"), None).unwrap();
    assert_eq!(outcome.returncode(), Some(5));
}

#[test]
fn test_failed_group_kill_still_reaps_leader() {
    let mut launched = LaunchSpec::new(["sleep", "30"]).launch().unwrap();
    let pid = launched.pid() as i32;

    let err = terminate_expired(&mut launched, false, |_| {
        Err(HarnessError::Supervise(
            "failed to kill process group: EPERM".to_string(),
        ))
    })
    .unwrap_err();

    assert!(matches!(err, HarnessError::Supervise(_)));
    assert!(err.to_string().contains("EPERM"));
    // Killed on its own and reaped: no process and no zombie left.
    assert!(!process_alive(pid));
}

#[test]
fn test_terminate_expired_after_leader_exit_only_kills_group() {
    let mut launched = LaunchSpec::new(["true"]).launch().unwrap();
    launched.child.wait().unwrap();

    let mut killed = None;
    terminate_expired(&mut launched, true, |pgid| {
        killed = Some(pgid);
        Ok(())
    })
    .unwrap();
    assert_eq!(killed, Some(launched.pgid()));
}
