// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit reports in Rust.
//!
//! This crate models a JUnit/XUnit XML document the way PHPUnit and similar
//! runners write it, and extracts the list of failed tests from it. It is the
//! read-side counterpart of crates that only generate JUnit XML.

mod errors;
mod parse;
mod report;

pub use errors::*;
pub use report::*;
