// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the rerun state machine, driven through the CLI
//! surface with a fake test runner.
//!
//! The fake runner is a shell script that records its argument list and
//! copies a canned JUnit fixture to the logfile path, standing in for a
//! real suite execution.

use crate::{
    dispatch::RerunApp,
    errors::{ExpectedError, RerunExitCode},
    orchestrate::RerunOutcome,
    output::OutputWriter,
};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use clap::Parser;
use indoc::indoc;
use std::os::unix::fs::PermissionsExt;

static FAILING_REPORT: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <testsuites>
      <testsuite name="Fixtures" tests="3" failures="2" errors="0">
        <testcase name="test_passing" classname="Tests\PassingTest"/>
        <testcase name="test_fail_one" classname="Tests\FailingTest">
          <failure type="PHPUnit\Framework\ExpectationFailedException">Failed</failure>
        </testcase>
        <testcase name="test_fail_two" classname="Tests\AnotherTest">
          <failure type="PHPUnit\Framework\ExpectationFailedException">Failed</failure>
        </testcase>
      </testsuite>
    </testsuites>
"#};

static PASSING_REPORT: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <testsuites>
      <testsuite name="Fixtures" tests="3" failures="0" errors="0">
        <testcase name="test_passing" classname="Tests\PassingTest"/>
        <testcase name="test_fail_one" classname="Tests\FailingTest"/>
        <testcase name="test_fail_two" classname="Tests\AnotherTest"/>
      </testsuite>
    </testsuites>
"#};

struct TestWorkspace {
    dir: Utf8TempDir,
    logfile: Utf8PathBuf,
    args_file: Utf8PathBuf,
}

impl TestWorkspace {
    fn new() -> Self {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let logfile = dir.path().join("junit.xml");
        let args_file = dir.path().join("runner-args.txt");
        Self {
            dir,
            logfile,
            args_file,
        }
    }

    /// Writes a fake runner that records its args and copies `fixture` to
    /// the logfile path.
    fn fake_runner(&self, fixture: &str) -> Utf8PathBuf {
        let fixture_path = self.dir.path().join("fixture.xml");
        fs_err::write(&fixture_path, fixture).expect("wrote fixture");
        self.fake_runner_script(&format!(
            "cp \"{}\" \"{}\"\n",
            fixture_path, self.logfile
        ))
    }

    /// Writes a fake runner that records its args and exits without ever
    /// writing a report.
    fn fake_runner_writing_nothing(&self) -> Utf8PathBuf {
        self.fake_runner_script("")
    }

    fn fake_runner_script(&self, body: &str) -> Utf8PathBuf {
        let script = self.dir.path().join("fake-runner.sh");
        let contents = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\n{}",
            self.args_file, body
        );
        fs_err::write(&script, contents).expect("wrote fake runner");

        let mut perms = fs_err::metadata(&script)
            .expect("read fake runner metadata")
            .permissions();
        perms.set_mode(0o755);
        fs_err::set_permissions(&script, perms).expect("made fake runner executable");
        script
    }

    fn invoke(&self, runner: &Utf8Path) -> (Result<RerunOutcome, ExpectedError>, String) {
        let app = RerunApp::try_parse_from([
            "rerun-failed",
            "--logfile",
            self.logfile.as_str(),
            "--runner",
            runner.as_str(),
        ])
        .expect("CLI args parse");

        let output = app.init_output();
        let mut output_writer = OutputWriter::Test { stdout: Vec::new() };
        let result = app.exec_with_outcome(output, &mut output_writer);
        let stdout = String::from_utf8_lossy(output_writer.stdout()).into_owned();
        (result, stdout)
    }

    fn runner_args(&self) -> Vec<String> {
        fs_err::read_to_string(&self.args_file)
            .expect("fake runner recorded its args")
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

#[test]
fn full_suite_runs_when_logfile_is_absent() {
    let workspace = TestWorkspace::new();
    let runner = workspace.fake_runner(FAILING_REPORT);

    let (result, stdout) = workspace.invoke(&runner);

    assert_eq!(
        result.expect("orchestration succeeds"),
        RerunOutcome::FullRun {
            report_written: true
        },
    );
    assert!(stdout.contains("Logfile not found"), "stdout: {stdout}");
    assert!(stdout.contains("Running the test suite"), "stdout: {stdout}");
    assert!(workspace.logfile.exists(), "logfile persists after failures");

    // The full run is unfiltered.
    let args = workspace.runner_args();
    assert!(!args.contains(&"--filter".to_owned()), "args: {args:?}");
    assert_eq!(
        args,
        vec!["--log-junit".to_owned(), workspace.logfile.to_string()],
    );
}

#[test]
fn logfile_with_no_failures_is_cleaned_up_without_a_rerun() {
    let workspace = TestWorkspace::new();
    fs_err::write(&workspace.logfile, PASSING_REPORT).expect("wrote logfile");
    let runner = workspace.fake_runner(FAILING_REPORT);

    let (result, stdout) = workspace.invoke(&runner);

    assert_eq!(result.expect("orchestration succeeds"), RerunOutcome::CleanedUp);
    assert!(stdout.contains("Logfile found"), "stdout: {stdout}");
    assert!(stdout.contains("No failed tests"), "stdout: {stdout}");
    assert!(stdout.contains("Great job"), "stdout: {stdout}");
    assert!(!workspace.logfile.exists(), "logfile deleted after cleanup");
    assert!(
        !workspace.args_file.exists(),
        "the runner must not be invoked on the cleanup path"
    );
}

#[test]
fn failing_logfile_triggers_filtered_rerun() {
    let workspace = TestWorkspace::new();
    fs_err::write(&workspace.logfile, FAILING_REPORT).expect("wrote logfile");
    let runner = workspace.fake_runner(FAILING_REPORT);

    let (result, stdout) = workspace.invoke(&runner);

    assert_eq!(
        result.expect("orchestration succeeds"),
        RerunOutcome::Reran {
            selected: 2,
            still_failing: Some(2),
        },
    );
    assert!(stdout.contains("Logfile found"), "stdout: {stdout}");
    assert!(
        stdout.contains("Searching for previously failing tests"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("Found 2 previously failing tests, filtering"),
        "stdout: {stdout}"
    );
    assert!(workspace.logfile.exists(), "logfile persists while failing");

    let args = workspace.runner_args();
    let filter_pos = args
        .iter()
        .position(|arg| arg == "--filter")
        .expect("rerun passes a filter");
    assert_eq!(
        args[filter_pos + 1],
        r"Tests\\FailingTest::test_fail_one$|Tests\\AnotherTest::test_fail_two$",
    );
}

#[test]
fn full_cycle_ends_with_logfile_absent() {
    let workspace = TestWorkspace::new();
    let failing_runner = workspace.fake_runner(FAILING_REPORT);

    // Phase 1: no logfile, full run fails.
    let (result, stdout) = workspace.invoke(&failing_runner);
    assert!(matches!(
        result.expect("phase 1 succeeds"),
        RerunOutcome::FullRun {
            report_written: true
        },
    ));
    assert!(stdout.contains("Logfile not found"), "stdout: {stdout}");
    assert!(workspace.logfile.exists());

    // Phase 2: rerun, still failing.
    let (result, stdout) = workspace.invoke(&failing_runner);
    assert!(matches!(
        result.expect("phase 2 succeeds"),
        RerunOutcome::Reran {
            selected: 2,
            still_failing: Some(2),
        },
    ));
    assert!(
        stdout.contains("previously failing tests, filtering"),
        "stdout: {stdout}"
    );
    assert!(workspace.logfile.exists());

    // Phase 3: the fixture is "fixed"; the filtered rerun passes and the
    // cycle ends right here.
    let passing_runner = workspace.fake_runner(PASSING_REPORT);
    let (result, stdout) = workspace.invoke(&passing_runner);
    assert!(matches!(
        result.expect("phase 3 succeeds"),
        RerunOutcome::Reran {
            selected: 2,
            still_failing: Some(0),
        },
    ));
    assert!(stdout.contains("No failed tests"), "stdout: {stdout}");
    assert!(!workspace.logfile.exists(), "cycle ends with no logfile");

    // Phase 4: the next invocation starts over with a full run.
    let (result, stdout) = workspace.invoke(&passing_runner);
    assert!(matches!(
        result.expect("phase 4 succeeds"),
        RerunOutcome::FullRun {
            report_written: true
        },
    ));
    assert!(stdout.contains("Logfile not found"), "stdout: {stdout}");
}

#[test]
fn filtered_rerun_that_passes_cleans_up_in_the_same_invocation() {
    let workspace = TestWorkspace::new();
    fs_err::write(&workspace.logfile, FAILING_REPORT).expect("wrote logfile");
    let runner = workspace.fake_runner(PASSING_REPORT);

    let (result, stdout) = workspace.invoke(&runner);

    assert_eq!(
        result.expect("orchestration succeeds"),
        RerunOutcome::Reran {
            selected: 2,
            still_failing: Some(0),
        },
    );
    assert!(
        stdout.contains("Found 2 previously failing tests, filtering"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("No failed tests"), "stdout: {stdout}");
    assert!(stdout.contains("Great job"), "stdout: {stdout}");
    assert!(
        !workspace.logfile.exists(),
        "logfile deleted when the filtered rerun passes"
    );

    // The rerun itself was filtered.
    let args = workspace.runner_args();
    assert!(args.contains(&"--filter".to_owned()), "args: {args:?}");
}

#[test]
fn repeated_cleanup_is_idempotent() {
    let workspace = TestWorkspace::new();
    let runner = workspace.fake_runner(PASSING_REPORT);

    // With no logfile, every invocation behaves like the first.
    for _ in 0..2 {
        let (result, stdout) = workspace.invoke(&runner);
        assert!(matches!(
            result.expect("orchestration succeeds"),
            RerunOutcome::FullRun {
                report_written: true
            },
        ));
        assert!(stdout.contains("Logfile not found"), "stdout: {stdout}");

        // Next invocation cleans up the passing report.
        let (result, _) = workspace.invoke(&runner);
        assert_eq!(result.expect("cleanup succeeds"), RerunOutcome::CleanedUp);
        assert!(!workspace.logfile.exists());
    }
}

#[test]
fn runner_that_writes_no_report_leaves_state_absent() {
    let workspace = TestWorkspace::new();
    let runner = workspace.fake_runner_writing_nothing();

    let (result, _) = workspace.invoke(&runner);

    assert_eq!(
        result.expect("orchestration succeeds"),
        RerunOutcome::FullRun {
            report_written: false
        },
    );
    assert!(!workspace.logfile.exists());
}

#[test]
fn malformed_logfile_is_a_fatal_orchestration_error() {
    let workspace = TestWorkspace::new();
    fs_err::write(&workspace.logfile, "<testsuites><testsuite").expect("wrote logfile");
    let runner = workspace.fake_runner(PASSING_REPORT);

    let (result, _) = workspace.invoke(&runner);

    let err = result.expect_err("malformed logfile must not be treated as no failures");
    assert!(
        matches!(err, ExpectedError::LogfileParseError { .. }),
        "{err:?}"
    );
    assert_eq!(err.process_exit_code(), RerunExitCode::LOGFILE_ERROR);
    assert!(
        workspace.logfile.exists(),
        "a malformed logfile is never deleted"
    );
    assert!(!workspace.args_file.exists(), "no rerun is attempted");
}

#[test]
fn unreadable_logfile_is_a_fatal_orchestration_error() {
    let workspace = TestWorkspace::new();
    // A directory at the logfile path is "present" but unreadable as a file.
    fs_err::create_dir(&workspace.logfile).expect("created dir at logfile path");
    let runner = workspace.fake_runner(PASSING_REPORT);

    let (result, _) = workspace.invoke(&runner);

    let err = result.expect_err("unreadable logfile must surface");
    assert!(
        matches!(err, ExpectedError::LogfileReadError { .. }),
        "{err:?}"
    );
    assert_eq!(err.process_exit_code(), RerunExitCode::LOGFILE_ERROR);
}

#[test]
fn missing_runner_binary_surfaces_as_setup_error() {
    let workspace = TestWorkspace::new();
    let missing = workspace.dir.path().join("no-such-runner");

    let (result, _) = workspace.invoke(&missing);

    let err = result.expect_err("missing runner must surface");
    assert!(
        matches!(err, ExpectedError::RunnerExecFailed { .. }),
        "{err:?}"
    );
    assert_eq!(err.process_exit_code(), RerunExitCode::SETUP_ERROR);
}

#[test]
fn configuration_file_is_passed_through() {
    let workspace = TestWorkspace::new();
    let runner = workspace.fake_runner(FAILING_REPORT);
    let config = workspace.dir.path().join("phpunit.xml");

    let app = RerunApp::try_parse_from([
        "rerun-failed",
        "--logfile",
        workspace.logfile.as_str(),
        "--runner",
        runner.as_str(),
        "--configuration",
        config.as_str(),
    ])
    .expect("CLI args parse");

    let output = app.init_output();
    let mut output_writer = OutputWriter::Test { stdout: Vec::new() };
    app.exec_with_outcome(output, &mut output_writer)
        .expect("orchestration succeeds");

    let args = workspace.runner_args();
    let config_pos = args
        .iter()
        .position(|arg| arg == "--configuration")
        .expect("configuration is passed through");
    assert_eq!(args[config_pos + 1], config.to_string());
}
