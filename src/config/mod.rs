//! Configuration model for the regression harness.
//!
//! This module defines [`HarnessConfig`], loadable from a YAML file and
//! overlaid with the process environment. It supports forward-compatible
//! YAML parsing (unknown fields are ignored), defaults for every field,
//! and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::{DEFAULT_PKGLIBDIR, HarnessConfig};
pub use operations::{PKGLIBDIR_ENV, SGX_ENV};
pub use types::ExecutionMode;
