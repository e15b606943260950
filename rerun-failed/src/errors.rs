// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Process exit codes for `rerun-failed`.
///
/// The suite's own pass/fail verdict never shows up here: a run that still
/// has failing tests exits with [`OK`](Self::OK). Non-zero codes are
/// reserved for orchestration-level faults.
pub enum RerunExitCode {}

impl RerunExitCode {
    /// The orchestration completed, regardless of the suite's verdict.
    pub const OK: i32 = 0;

    /// The test runner could not be invoked.
    pub const SETUP_ERROR: i32 = 96;

    /// The logfile exists but could not be read or parsed.
    pub const LOGFILE_ERROR: i32 = 102;

    /// The logfile could not be deleted after a fully passing run.
    ///
    /// A stale logfile would corrupt the next invocation's decision, so this
    /// is surfaced rather than ignored.
    pub const CLEANUP_FAILED: i32 = 103;
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error in the rerun orchestration itself, not a failing test.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to read logfile")]
    LogfileReadError {
        logfile: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse logfile")]
    LogfileParseError {
        logfile: Utf8PathBuf,
        #[source]
        err: rerun_report::ParseError,
    },
    #[error("failed to delete logfile")]
    LogfileDeleteError {
        logfile: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to execute test runner")]
    RunnerExecFailed {
        command: String,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to write status output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn logfile_read_error(logfile: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::LogfileReadError {
            logfile: logfile.into(),
            err,
        }
    }

    pub(crate) fn logfile_parse_error(
        logfile: impl Into<Utf8PathBuf>,
        err: rerun_report::ParseError,
    ) -> Self {
        Self::LogfileParseError {
            logfile: logfile.into(),
            err,
        }
    }

    pub(crate) fn logfile_delete_error(
        logfile: impl Into<Utf8PathBuf>,
        err: std::io::Error,
    ) -> Self {
        Self::LogfileDeleteError {
            logfile: logfile.into(),
            err,
        }
    }

    pub(crate) fn runner_exec_failed(
        command: impl IntoIterator<Item = impl AsRef<str>>,
        err: std::io::Error,
    ) -> Self {
        Self::RunnerExecFailed {
            command: shell_words::join(command),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::LogfileReadError { .. } | Self::LogfileParseError { .. } => {
                RerunExitCode::LOGFILE_ERROR
            }
            Self::LogfileDeleteError { .. } => RerunExitCode::CLEANUP_FAILED,
            Self::RunnerExecFailed { .. } | Self::WriteOutputError { .. } => {
                RerunExitCode::SETUP_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::LogfileReadError { logfile, err } => {
                error!(
                    "failed to read logfile `{}`",
                    logfile.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::LogfileParseError { logfile, err } => {
                error!(
                    "failed to parse logfile `{}` as a JUnit report",
                    logfile.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::LogfileDeleteError { logfile, err } => {
                error!(
                    "failed to delete logfile `{}` after a passing run",
                    logfile.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::RunnerExecFailed { command, err } => {
                error!("failed to execute `{}`", command.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write status output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: "rerun_failed::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
