// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rerun only the previously failing tests of a JUnit-reporting suite.
//!
//! `rerun-failed` wraps a test-runner invocation. The first run executes
//! the full suite and leaves the runner's JUnit logfile behind; while that
//! logfile records failures, subsequent runs re-execute only the failing
//! tests. Once everything passes, the logfile is deleted and the cycle
//! starts over.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod filter;
mod orchestrate;
mod output;
mod runner_cli;
#[cfg(all(test, unix))]
mod tests_integration;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use filter::FilterExpression;
#[doc(hidden)]
pub use orchestrate::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
