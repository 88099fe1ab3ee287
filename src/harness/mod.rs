//! High-level entry points used by regression tests.
//!
//! [`RegressionHarness`] ties the pieces together: it resolves the PAL
//! layout from the configuration, checks the artifacts, assembles the
//! loader (and optional gdb) command line, and runs it under the
//! [`Supervisor`]. Failing outcomes come back as errors so test bodies can
//! use `?`.

use crate::capture::CapturedOutput;
use crate::config::HarnessConfig;
use crate::debugger::{GdbInvocation, PRELOAD_ENV};
use crate::error::{HarnessError, Result};
use crate::launch::LaunchSpec;
use crate::pal::PalLayout;
use crate::supervisor::Supervisor;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;


/// Variable used to point a native binary at a library directory.
pub const LIBRARY_PATH_ENV: &str = "LD_LIBRARY_PATH";

/// Options for runs through the PAL loader.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Requested timeout; never lowers the mode default.
    pub timeout: Option<Duration>,
    /// Arguments placed before the loader command line.
    pub prefix: Vec<OsString>,
    /// Environment overrides.
    pub env: Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
}

/// Options for runs of native helper binaries.
#[derive(Debug, Clone, Default)]
pub struct NativeOptions {
    /// Requested timeout; never lowers the mode default.
    pub timeout: Option<Duration>,
    /// Value for `LD_LIBRARY_PATH`.
    pub libpath: Option<PathBuf>,
    /// Environment overrides.
    pub env: Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
}

/// Runs test binaries for one configured PAL.
#[derive(Debug, Clone)]
pub struct RegressionHarness {
    config: HarnessConfig,
    layout: PalLayout,
    supervisor: Supervisor,
}

impl RegressionHarness {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: PalLayout::from_config(&config),
            supervisor: Supervisor::new(config.timeout_policy()),
            config,
        })
    }

    /// Harness configured from defaults plus `SGX` / `GRAMINE_PKGLIBDIR`.
    pub fn from_env() -> Result<Self> {
        Self::new(HarnessConfig::from_env()?)
    }

    /// Replace the supervisor, e.g. to use a shorter timeout policy.
    pub fn with_supervisor(mut self, supervisor: Supervisor) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn layout(&self) -> &PalLayout {
        &self.layout
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Run `args` through the loader: `[prefix...] loader libpal init args...`.
    ///
    /// Fails with [`HarnessError::MissingArtifact`] before launching when
    /// the loader or libpal is missing.
    pub fn run_binary<I, S>(&self, args: I, options: RunOptions) -> Result<CapturedOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.layout.check_artifacts()?;

        let user_args = collect_args(args);
        let mut spec = LaunchSpec::new(self.layout.loader_argv(&user_args))
            .with_prefix(options.prefix)
            .with_envs(options.env);
        if let Some(dir) = options.current_dir {
            spec = spec.with_current_dir(dir);
        }

        self.supervise(&spec, &user_args, options.timeout)
    }

    /// Run an already-built native binary directly, bypassing the loader.
    pub fn run_native_binary<I, S>(&self, args: I, options: NativeOptions) -> Result<CapturedOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = collect_args(args);
        let mut spec = LaunchSpec::new(&args).with_envs(options.env);
        if let Some(libpath) = options.libpath {
            spec = spec.with_env(LIBRARY_PATH_ENV, libpath);
        }
        if let Some(dir) = options.current_dir {
            spec = spec.with_current_dir(dir);
        }

        self.supervise(&spec, &args, options.timeout)
    }

    /// Run `args` through the loader under batch-mode gdb with `script`.
    ///
    /// Any prefix in `options` ends up after gdb's `--args`.
    pub fn run_gdb<I, S>(
        &self,
        args: I,
        script: impl AsRef<Path>,
        mut options: RunOptions,
    ) -> Result<CapturedOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let gdb = GdbInvocation::new(&self.config.debugger, &self.layout, script);

        let existing_preload = options
            .env
            .iter()
            .rev()
            .find(|(key, _)| key == PRELOAD_ENV)
            .map(|(_, value)| value.clone())
            .or_else(|| std::env::var_os(PRELOAD_ENV));
        let preload = gdb.env_overrides(existing_preload.as_deref());
        options.env.extend(preload);

        let mut prefix = gdb.prefix();
        prefix.append(&mut options.prefix);
        options.prefix = prefix;

        self.run_binary(args, options)
    }

    /// Whether libpal carries debug info (checked with `objdump -x`).
    pub fn has_debug(&self) -> Result<bool> {
        self.layout.has_debug(&self.config.objdump)
    }

    fn supervise(
        &self,
        spec: &LaunchSpec,
        command_args: &[OsString],
        timeout: Option<Duration>,
    ) -> Result<CapturedOutput> {
        let outcome = self.supervisor.run(spec, timeout)?;
        outcome.into_result(shell_words::join(
            command_args.iter().map(|a| a.to_string_lossy()),
        ))
    }
}

/// Value of a required environment variable.
///
/// An unset (or non-UTF-8) variable is a configuration error naming it.
pub fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| HarnessError::Config(format!("environment variable {} not set", name)))
}

fn collect_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|a| a.as_ref().to_os_string()).collect()
}
