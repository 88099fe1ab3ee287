//! CLI argument parsing for `regress`.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Run PAL regression binaries under a timeout, capturing their output.
///
/// The exit code tells a shell-driven suite what happened:
/// 0 success, 1 configuration error, 2 launch failure,
/// 3 child failure, 4 timeout.
#[derive(Parser, Debug)]
#[command(name = "regress")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for regress.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a test binary through the PAL loader.
    ///
    /// Invokes `[prefix...] loader libpal.so init ARGS...`, optionally under gdb.
    Run(RunArgs),

    /// Run a native helper binary directly, bypassing the loader.
    Native(NativeArgs),

    /// Show the resolved PAL paths and verify the artifacts exist.
    Check(CheckArgs),
}

/// Configuration sources shared by all commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// YAML config file (defaults apply when omitted).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force SGX mode regardless of config and environment.
    #[arg(long)]
    pub sgx: bool,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Timeout in seconds; never lowers the mode default.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Run under gdb with this script in batch mode.
    #[arg(long, value_name = "SCRIPT", conflicts_with = "prefix")]
    pub gdb: Option<PathBuf>,

    /// Command line placed before the loader (shell-quoted).
    #[arg(long, value_name = "CMD")]
    pub prefix: Option<String>,

    /// Succeed only if the binary fails with this exit code.
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    pub expect_returncode: Option<i32>,

    /// Test binary and its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `native` command.
#[derive(Args, Debug)]
pub struct NativeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Timeout in seconds; never lowers the mode default.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Library directory exported as LD_LIBRARY_PATH.
    #[arg(long, value_name = "DIR")]
    pub libpath: Option<PathBuf>,

    /// Succeed only if the binary fails with this exit code.
    #[arg(long, value_name = "CODE", allow_negative_numbers = true)]
    pub expect_returncode: Option<i32>,

    /// Binary and its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
