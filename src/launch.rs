//! Process launching.
//!
//! A [`LaunchSpec`] describes one invocation: the target argv, an optional
//! prefix (e.g. a debugger command line) and environment overrides. Every
//! launch puts the child into a fresh process group at spawn time, so the
//! child and anything it forks can be killed together.

use crate::error::{HarnessError, Result};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Description of a single process invocation.
///
/// Built once with the consuming builder methods and not mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    args: Vec<OsString>,
    prefix: Vec<OsString>,
    env: BTreeMap<OsString, OsString>,
    current_dir: Option<PathBuf>,
}

impl LaunchSpec {
    /// Create a spec for `args`; the first element is the binary to run.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
            ..Self::default()
        }
    }

    /// Arguments placed before the target binary (e.g. `gdb ... --args`).
    pub fn with_prefix<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.prefix = prefix.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        self
    }

    /// Override one environment variable. Later calls for the same key win.
    pub fn with_env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        self
    }

    /// Override several environment variables.
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        for (key, value) in vars {
            self = self.with_env(key, value);
        }
        self
    }

    pub fn with_current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn prefix(&self) -> &[OsString] {
        &self.prefix
    }

    pub fn env_overrides(&self) -> &BTreeMap<OsString, OsString> {
        &self.env
    }

    /// Full argument vector: `prefix ++ args`.
    pub fn argv(&self) -> Vec<OsString> {
        self.prefix.iter().chain(self.args.iter()).cloned().collect()
    }

    /// Shell-quoted rendering of the target args, for messages.
    pub fn display_args(&self) -> String {
        join_lossy(&self.args)
    }

    /// Spawn the process in a new process group with stdout/stderr piped.
    ///
    /// Nothing is read from the pipes here.
    pub fn launch(&self) -> Result<Launched> {
        if self.args.is_empty() {
            return Err(HarnessError::Config(
                "launch spec has no binary to run".to_string(),
            ));
        }

        let argv = self.argv();
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| HarnessError::Config("launch spec has no binary to run".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(rest)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);

        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| HarnessError::Launch {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;

        // The child leads its own group, so its pid is the group id.
        let pgid = Pid::from_raw(child.id() as i32);
        tracing::debug!(
            pid = child.id(),
            command = %join_lossy(&argv),
            "launched process in new process group"
        );

        Ok(Launched { child, pgid })
    }
}

/// A running child and the process group it leads.
#[derive(Debug)]
pub struct Launched {
    pub(crate) child: Child,
    pub(crate) pgid: Pid,
}

impl Launched {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }
}

fn join_lossy(args: &[OsString]) -> String {
    shell_words::join(args.iter().map(|a| a.to_string_lossy()))
}
