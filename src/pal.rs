//! Installed PAL artifacts.
//!
//! A PAL tree lives at `<pkglibdir>/<direct|sgx>/` and contains the
//! `loader` executable, the `libpal.so` runtime it loads, and the gdb
//! integration scripts.

use crate::config::{ExecutionMode, HarnessConfig};
use crate::error::{HarnessError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Paths inside one PAL tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalLayout {
    pal_dir: PathBuf,
    mode: ExecutionMode,
}

impl PalLayout {
    pub fn new(pal_dir: impl Into<PathBuf>, mode: ExecutionMode) -> Self {
        Self {
            pal_dir: pal_dir.into(),
            mode,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.pal_dir(), config.mode)
    }

    pub fn pal_dir(&self) -> &Path {
        &self.pal_dir
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn loader_path(&self) -> PathBuf {
        self.pal_dir.join("loader")
    }

    pub fn libpal_path(&self) -> PathBuf {
        self.pal_dir.join("libpal.so")
    }

    /// gdb integration script matching the mode.
    pub fn gdb_script(&self) -> PathBuf {
        let script = match self.mode {
            ExecutionMode::Sgx => "gramine_sgx_gdb.py",
            ExecutionMode::Direct => "gramine_linux_gdb.py",
        };
        self.pal_dir.join("gdb_integration").join(script)
    }

    /// Library gdb needs preloaded to debug enclaves. SGX only.
    pub fn sgx_gdb_preload(&self) -> Option<PathBuf> {
        match self.mode {
            ExecutionMode::Sgx => Some(self.pal_dir.join("gdb_integration").join("sgx_gdb.so")),
            ExecutionMode::Direct => None,
        }
    }

    /// Fail unless both the loader and libpal exist.
    pub fn check_artifacts(&self) -> Result<()> {
        let loader = self.loader_path();
        if !loader.exists() {
            return Err(HarnessError::MissingArtifact {
                what: "loader",
                path: loader,
            });
        }

        let libpal = self.libpal_path();
        if !libpal.exists() {
            return Err(HarnessError::MissingArtifact {
                what: "libpal",
                path: libpal,
            });
        }

        Ok(())
    }

    /// `[loader, libpal, "init", user_args...]`.
    pub fn loader_argv<I, S>(&self, user_args: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut argv = vec![
            self.loader_path().into_os_string(),
            self.libpal_path().into_os_string(),
            OsString::from("init"),
        ];
        argv.extend(user_args.into_iter().map(|a| a.as_ref().to_os_string()));
        argv
    }

    /// Whether libpal was built with debug info.
    ///
    /// Runs `<objdump> -x libpal.so` and looks for a `.debug_info` section.
    pub fn has_debug(&self, objdump: &str) -> Result<bool> {
        let libpal = self.libpal_path();
        let output = Command::new(objdump)
            .arg("-x")
            .arg(&libpal)
            .output()
            .map_err(|source| HarnessError::Launch {
                program: objdump.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(HarnessError::Config(format!(
                "{} -x {} failed (exit code {}): {}",
                objdump,
                libpal.display(),
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let dump = String::from_utf8_lossy(&output.stdout);
        Ok(dump.contains(".debug_info"))
    }
}
