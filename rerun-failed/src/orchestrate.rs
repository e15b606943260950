// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rerun state machine.
//!
//! The only state persisted between invocations is whether the JUnit
//! logfile exists at its well-known path. Absent means "run the full
//! suite"; present means "rerun the failures it records, or clean it up if
//! it records none". A filtered rerun that comes back clean cleans up too,
//! in the same invocation.

use crate::{
    errors::{ExpectedError, Result},
    filter::FilterExpression,
    output::{OutputWriter, StdoutWriter},
    runner_cli::RunnerCli,
};
use camino::Utf8Path;
use rerun_report::{Report, TestId};
use std::io::Write;
use tracing::{debug, warn};

/// Runs one invocation of the rerun workflow.
///
/// The logfile path is threaded in explicitly rather than hardcoded so the
/// orchestrator can be pointed at a temporary directory under test.
#[derive(Clone, Debug)]
pub struct RerunOrchestrator<'a> {
    logfile: &'a Utf8Path,
    configuration: Option<&'a Utf8Path>,
    runner_path: Option<&'a Utf8Path>,
    verbose: bool,
}

/// What one invocation of the orchestrator did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RerunOutcome {
    /// No logfile existed; the full suite was run.
    FullRun {
        /// Whether the runner left a report behind. False means the runner
        /// never got far enough to write one.
        report_written: bool,
    },

    /// The logfile recorded no failures and was deleted. No tests were run.
    CleanedUp,

    /// The logfile recorded failures and a filtered rerun was executed. A
    /// rerun whose new report records no failures deletes the logfile in
    /// the same invocation, ending the cycle.
    Reran {
        /// How many previously failing tests the filter selected.
        selected: usize,

        /// How many tests the rerun's new report records as failing, if the
        /// new report was readable. `Some(0)` means the logfile was
        /// deleted.
        still_failing: Option<usize>,
    },
}

impl<'a> RerunOrchestrator<'a> {
    /// Creates a new orchestrator for the given logfile path.
    pub fn new(
        logfile: &'a Utf8Path,
        configuration: Option<&'a Utf8Path>,
        runner_path: Option<&'a Utf8Path>,
        verbose: bool,
    ) -> Self {
        Self {
            logfile,
            configuration,
            runner_path,
            verbose,
        }
    }

    /// Executes one invocation of the state machine.
    ///
    /// The suite's own verdict never surfaces as an error here: a rerun
    /// whose tests still fail is a successful orchestration. Errors are
    /// reserved for faults in the orchestration itself -- an unreadable or
    /// malformed logfile, a runner that could not be spawned, or a logfile
    /// that could not be deleted.
    pub fn execute(&self, output_writer: &mut OutputWriter) -> Result<RerunOutcome> {
        let mut writer = output_writer.stdout_writer();
        if self.logfile.exists() {
            self.rerun_from_logfile(&mut writer)
        } else {
            self.run_full_suite(&mut writer)
        }
    }

    fn run_full_suite(&self, writer: &mut StdoutWriter<'_>) -> Result<RerunOutcome> {
        say(writer, "Logfile not found")?;
        say(writer, "Running the test suite")?;

        self.invoke_runner(writer, None)?;

        Ok(RerunOutcome::FullRun {
            report_written: self.logfile.exists(),
        })
    }

    fn rerun_from_logfile(&self, writer: &mut StdoutWriter<'_>) -> Result<RerunOutcome> {
        say(writer, "Logfile found")?;
        say(writer, "Searching for previously failing tests")?;

        let failed = self.read_failed_tests()?;
        if failed.is_empty() {
            say(writer, "No failed tests. Great job!")?;
            fs_err::remove_file(self.logfile)
                .map_err(|err| ExpectedError::logfile_delete_error(self.logfile, err))?;
            return Ok(RerunOutcome::CleanedUp);
        }

        say(
            writer,
            &format!("Found {} previously failing tests, filtering", failed.len()),
        )?;

        let filter = FilterExpression::from_failed(&failed);
        debug!("filter expression: {filter}");
        self.invoke_runner(writer, Some(&filter))?;

        let still_failing = self.revalidate_rerun(&failed);
        if still_failing == Some(0) {
            say(writer, "No failed tests. Great job!")?;
            fs_err::remove_file(self.logfile)
                .map_err(|err| ExpectedError::logfile_delete_error(self.logfile, err))?;
        }
        Ok(RerunOutcome::Reran {
            selected: failed.len(),
            still_failing,
        })
    }

    /// Reads and parses the logfile, returning the failed-test list.
    ///
    /// A missing or malformed logfile is fatal for this invocation: it must
    /// never be mistaken for "no failures", since that would delete the
    /// logfile and lose the rerun state.
    fn read_failed_tests(&self) -> Result<Vec<TestId>> {
        let contents = fs_err::read_to_string(self.logfile)
            .map_err(|err| ExpectedError::logfile_read_error(self.logfile, err))?;
        let report = Report::parse(&contents)
            .map_err(|err| ExpectedError::logfile_parse_error(self.logfile, err))?;
        Ok(report.failed_tests())
    }

    fn invoke_runner(
        &self,
        writer: &mut StdoutWriter<'_>,
        filter: Option<&FilterExpression>,
    ) -> Result<()> {
        let mut cli = RunnerCli::new(self.runner_path, self.logfile);
        if let Some(configuration) = self.configuration {
            cli.add_configuration(configuration);
        }
        if let Some(filter) = filter {
            cli.add_filter(filter);
        }

        if self.verbose {
            say(
                writer,
                &format!("Running `{}`", shell_words::join(cli.all_args())),
            )?;
        }
        writer
            .flush()
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        // The runner's exit code reflects the suite's verdict, which is
        // deliberately not propagated: unchecked() keeps a failing suite
        // from surfacing as an orchestration error.
        let expression = cli.to_expression().unchecked();
        let output = expression
            .run()
            .map_err(|err| ExpectedError::runner_exec_failed(cli.all_args(), err))?;
        debug!("test runner exited with {}", output.status);

        Ok(())
    }

    /// Reads the rerun's new report and checks it against the set the
    /// filter selected.
    ///
    /// The returned count decides whether the cycle ends: zero failures
    /// means the caller deletes the logfile right away. A report that
    /// cannot be re-read returns `None` and only warns, keeping the
    /// logfile in place rather than deleting on uncertain evidence.
    ///
    /// The filter is built to select exactly the previously failing tests,
    /// but the runner applies it as a regex, so a report that disagrees
    /// with the selection indicates an over-matching filter. That also
    /// never fails the invocation; it only warns.
    fn revalidate_rerun(&self, selected: &[TestId]) -> Option<usize> {
        let contents = match fs_err::read_to_string(self.logfile) {
            Ok(contents) => contents,
            Err(err) => {
                warn!("could not re-read logfile after rerun: {err}");
                return None;
            }
        };
        let report = match Report::parse(&contents) {
            Ok(report) => report,
            Err(err) => {
                warn!("could not parse logfile after rerun: {err}");
                return None;
            }
        };

        let still_failing = report.failed_tests();
        for test_id in &still_failing {
            if !selected.contains(test_id) {
                warn!("test `{test_id}` failed in the rerun but was not selected by the filter");
            }
        }
        Some(still_failing.len())
    }
}

fn say(writer: &mut StdoutWriter<'_>, message: &str) -> Result<()> {
    writeln!(writer, "{message}").map_err(|err| ExpectedError::WriteOutputError { err })
}
