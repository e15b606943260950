// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test-runner CLI support.

use crate::filter::FilterExpression;
use camino::{Utf8Path, Utf8PathBuf};
use std::{borrow::Cow, path::PathBuf};

/// A command-line builder for one test-runner invocation.
///
/// The runner is an external collaborator: it discovers and executes the
/// tests, computes the verdicts, and writes the JUnit logfile. This builder
/// only assembles its argument list.
#[derive(Clone, Debug)]
pub(crate) struct RunnerCli<'a> {
    runner_path: Utf8PathBuf,
    args: Vec<Cow<'a, str>>,
}

impl<'a> RunnerCli<'a> {
    /// Creates a new `RunnerCli` writing the JUnit report to `logfile`.
    pub(crate) fn new(runner_path: Option<&Utf8Path>, logfile: &'a Utf8Path) -> Self {
        let runner_path = runner_path
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(default_runner_path);
        let mut ret = Self {
            runner_path,
            args: Vec::new(),
        };
        ret.add_args(["--log-junit", logfile.as_str()]);
        ret
    }

    /// Passes the runner's configuration file, e.g. `phpunit.xml`.
    pub(crate) fn add_configuration(&mut self, configuration: &'a Utf8Path) -> &mut Self {
        self.add_args(["--configuration", configuration.as_str()])
    }

    /// Restricts the run to the tests selected by `filter`.
    pub(crate) fn add_filter(&mut self, filter: &FilterExpression) -> &mut Self {
        self.args.push(Cow::Borrowed("--filter"));
        self.args.push(Cow::Owned(filter.as_str().to_owned()));
        self
    }

    pub(crate) fn add_args(&mut self, args: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.args.extend(args.into_iter().map(Cow::Borrowed));
        self
    }

    pub(crate) fn all_args(&self) -> Vec<&str> {
        let mut all_args = vec![self.runner_path.as_str()];
        all_args.extend(self.args.iter().map(|s| &**s));
        all_args
    }

    pub(crate) fn to_expression(&self) -> duct::Expression {
        duct::cmd(
            // Call as_str rather than as_std_path so the runner gets picked
            // up from PATH if necessary.
            self.runner_path.as_str(),
            self.args.iter().map(|s| s.as_ref()),
        )
    }
}

fn default_runner_path() -> Utf8PathBuf {
    match std::env::var_os("PHPUNIT") {
        Some(runner_path) => PathBuf::from(runner_path)
            .try_into()
            .expect("PHPUNIT env var is not valid UTF-8"),
        None => Utf8PathBuf::from("phpunit"),
    }
}
