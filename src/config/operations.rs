//! Config loading, environment overlay, and validation.

use super::model::HarnessConfig;
use super::types::ExecutionMode;
use crate::error::{HarnessError, Result};
use crate::timeout::TimeoutPolicy;
use std::path::{Path, PathBuf};

/// Environment variable that selects SGX mode when set to `1`.
pub const SGX_ENV: &str = "SGX";

/// Environment variable that overrides the library directory.
pub const PKGLIBDIR_ENV: &str = "GRAMINE_PKGLIBDIR";

impl HarnessConfig {
    /// Load config from a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML config file
    ///
    /// # Returns
    ///
    /// * `Ok(HarnessConfig)` - Successfully loaded and validated config
    /// * `Err(HarnessError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: HarnessConfig = serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            HarnessError::Config(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay `SGX` and `GRAMINE_PKGLIBDIR` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlay environment settings read through `lookup`.
    ///
    /// `SGX` switches the mode when set: `1` means SGX, anything else means
    /// direct. An unset variable leaves the configured value alone.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(sgx) = lookup(SGX_ENV) {
            self.mode = if sgx == "1" {
                ExecutionMode::Sgx
            } else {
                ExecutionMode::Direct
            };
        }

        if let Some(dir) = lookup(PKGLIBDIR_ENV)
            && !dir.is_empty()
        {
            self.pkglibdir = PathBuf::from(dir);
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - both timeouts must be positive
    /// - `pkglibdir` must be non-empty
    /// - `debugger` and `objdump` must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.direct_timeout_secs == 0 {
            return Err(HarnessError::Config(
                "config validation failed: direct_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sgx_timeout_secs == 0 {
            return Err(HarnessError::Config(
                "config validation failed: sgx_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pkglibdir.as_os_str().is_empty() {
            return Err(HarnessError::Config(
                "config validation failed: pkglibdir must not be empty".to_string(),
            ));
        }

        for (field, value) in [("debugger", &self.debugger), ("objdump", &self.objdump)] {
            if value.trim().is_empty() {
                return Err(HarnessError::Config(format!(
                    "config validation failed: {} must not be empty",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Timeout policy for the configured mode.
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::for_mode(
            self.mode.is_sgx(),
            self.direct_timeout_secs,
            self.sgx_timeout_secs,
        )
    }

    /// PAL directory for the configured mode: `<pkglibdir>/<direct|sgx>`.
    pub fn pal_dir(&self) -> PathBuf {
        self.pkglibdir.join(self.mode.dir_name())
    }
}
