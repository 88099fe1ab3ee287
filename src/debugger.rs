//! gdb invocation for debugging a test binary under the PAL loader.

use crate::pal::PalLayout;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Variable gdb's SGX helper library is injected through.
pub const PRELOAD_ENV: &str = "LD_PRELOAD";

/// A batch-mode gdb run with the PAL integration script loaded.
#[derive(Debug, Clone)]
pub struct GdbInvocation {
    program: String,
    integration_script: PathBuf,
    preload: Option<PathBuf>,
    script: PathBuf,
}

impl GdbInvocation {
    /// `program` is the gdb binary, `script` the test's own gdb commands.
    pub fn new(program: impl Into<String>, layout: &PalLayout, script: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            integration_script: layout.gdb_script(),
            preload: layout.sgx_gdb_preload(),
            script: script.as_ref().to_path_buf(),
        }
    }

    /// Arguments placed before the loader command line.
    ///
    /// The controlling terminal is pointed at `/dev/null`: gdb hangs when
    /// it is started in a process group that does not own the terminal.
    pub fn prefix(&self) -> Vec<OsString> {
        vec![
            OsString::from(&self.program),
            OsString::from("-q"),
            OsString::from("-x"),
            self.integration_script.clone().into_os_string(),
            OsString::from("-x"),
            self.script.clone().into_os_string(),
            OsString::from("-batch"),
            OsString::from("-tty=/dev/null"),
            OsString::from("--args"),
        ]
    }

    /// Environment overrides for the run, given the current `LD_PRELOAD`.
    ///
    /// In SGX mode the helper library is prepended to the existing value.
    pub fn env_overrides(&self, existing_preload: Option<&OsStr>) -> Vec<(OsString, OsString)> {
        match &self.preload {
            Some(entry) => vec![(
                OsString::from(PRELOAD_ENV),
                prepend_preload(entry.as_os_str(), existing_preload),
            )],
            None => Vec::new(),
        }
    }
}

/// `entry:existing`, or just `entry` when nothing is preloaded yet.
pub fn prepend_preload(entry: &OsStr, existing: Option<&OsStr>) -> OsString {
    let mut value = entry.to_os_string();
    if let Some(existing) = existing
        && !existing.is_empty()
    {
        value.push(":");
        value.push(existing);
    }
    value
}
