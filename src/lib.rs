//! Supervised process runner for PAL regression test suites.
//!
//! Test binaries are launched in their own process group, their output is
//! drained concurrently while a bounded wait runs, and the whole group is
//! killed when the deadline passes. Each run ends in an
//! [`Outcome`](outcome::Outcome): success, a non-zero exit, or a timeout.
//!
//! Most callers go through [`RegressionHarness`](harness::RegressionHarness),
//! which resolves the loader and libpal from a [`HarnessConfig`](config::HarnessConfig).

pub mod capture;
pub mod config;
pub mod debugger;
pub mod error;
pub mod exit_codes;
pub mod expect;
pub mod harness;
pub mod launch;
pub mod outcome;
pub mod pal;
pub mod supervisor;
pub mod timeout;
