// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::Result,
    orchestrate::{RerunOrchestrator, RerunOutcome},
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::Utf8PathBuf;
use clap::Parser;

/// Rerun only the previously failing tests of a test suite.
///
/// Without a logfile the full suite is run and its JUnit report kept at the
/// logfile path. While that report records failures, this command reruns
/// just those tests; once everything passes, the logfile is deleted and the
/// next invocation starts over with the full suite.
#[derive(Debug, Parser)]
#[command(version)]
pub struct RerunApp {
    /// Path to the JUnit logfile left behind by the previous run
    #[arg(long, value_name = "PATH", default_value = "junit.xml")]
    logfile: Utf8PathBuf,

    /// Configuration file to pass to the test runner
    #[arg(long, short = 'c', value_name = "PATH")]
    configuration: Option<Utf8PathBuf>,

    /// Test runner to invoke [default: $PHPUNIT, or `phpunit` on PATH]
    #[arg(long, value_name = "PATH")]
    runner: Option<Utf8PathBuf>,

    #[command(flatten)]
    output: OutputOpts,
}

impl RerunApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(&self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<()> {
        self.exec_with_outcome(output, output_writer).map(|_| ())
    }

    pub(crate) fn exec_with_outcome(
        &self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<RerunOutcome> {
        let orchestrator = RerunOrchestrator::new(
            &self.logfile,
            self.configuration.as_deref(),
            self.runner.as_deref(),
            output.verbose,
        );
        orchestrator.execute(output_writer)
    }
}
