// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::ParseError, parse::parse_report};
use std::fmt;

/// The root element of a parsed JUnit report.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// The test suites contained in this report.
    pub testsuites: Vec<Testsuite>,
}

impl Report {
    /// Parses a report from a string containing a JUnit XML document.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_report(input)
    }

    /// Returns the qualified identifiers of all failed tests, in document
    /// order.
    ///
    /// A test counts as failed if it carries a `failure` or an `error`
    /// marker. The two kinds are not distinguished: selecting tests for a
    /// rerun treats an unexpected error exactly like an assertion failure.
    /// Skipped and passing tests are excluded. The list is not de-duplicated
    /// or sorted.
    pub fn failed_tests(&self) -> Vec<TestId> {
        let mut failed = Vec::new();
        for testsuite in &self.testsuites {
            testsuite.collect_failed(&mut failed);
        }
        failed
    }

    /// Returns the number of failed tests in this report.
    ///
    /// Zero means every test in the report passed (or was skipped).
    pub fn failed_count(&self) -> usize {
        self.failed_tests().len()
    }
}

/// Represents a single testsuite.
///
/// PHPUnit nests one `testsuite` element per source file or data provider
/// inside outer suites, and interleaves nested suites with plain testcases
/// within a class suite. Children are kept as one list in document order.
#[derive(Clone, Debug, Default)]
pub struct Testsuite {
    /// The name of this testsuite.
    pub name: String,

    /// The direct children of this testsuite, in document order.
    pub children: Vec<TestsuiteChild>,
}

impl Testsuite {
    /// Creates a new `Testsuite` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Iterates over the testcases directly contained in this testsuite.
    pub fn testcases(&self) -> impl Iterator<Item = &Testcase> {
        self.children.iter().filter_map(|child| match child {
            TestsuiteChild::Testcase(testcase) => Some(testcase),
            TestsuiteChild::Testsuite(_) => None,
        })
    }

    /// Iterates over the child testsuites, in document order.
    pub fn testsuites(&self) -> impl Iterator<Item = &Testsuite> {
        self.children.iter().filter_map(|child| match child {
            TestsuiteChild::Testsuite(testsuite) => Some(testsuite),
            TestsuiteChild::Testcase(_) => None,
        })
    }

    fn collect_failed(&self, failed: &mut Vec<TestId>) {
        for child in &self.children {
            match child {
                TestsuiteChild::Testsuite(testsuite) => testsuite.collect_failed(failed),
                TestsuiteChild::Testcase(testcase) => {
                    if testcase.is_failed() {
                        failed.push(testcase.id());
                    }
                }
            }
        }
    }
}

/// A direct child of a [`Testsuite`]: a nested suite or a testcase.
#[derive(Clone, Debug)]
pub enum TestsuiteChild {
    /// A nested testsuite.
    Testsuite(Testsuite),

    /// A testcase.
    Testcase(Testcase),
}

/// Represents a single testcase.
#[derive(Clone, Debug)]
pub struct Testcase {
    /// The name of the testcase, i.e. the test method.
    pub name: String,

    /// The "classname" of the testcase.
    ///
    /// For PHPUnit this is the fully qualified class, e.g.
    /// `Tests\FailingTest`. `classname` + `name` together uniquely identify
    /// a test.
    pub classname: Option<String>,

    /// The status of this test.
    pub status: TestcaseStatus,
}

impl Testcase {
    /// Creates a new testcase.
    pub fn new(name: impl Into<String>, status: TestcaseStatus) -> Self {
        Self {
            name: name.into(),
            classname: None,
            status,
        }
    }

    /// Returns true if this testcase carries a failure or error marker.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TestcaseStatus::NonSuccess { .. })
    }

    /// Returns the qualified identifier for this testcase.
    pub fn id(&self) -> TestId {
        TestId {
            classname: self.classname.clone(),
            name: self.name.clone(),
        }
    }
}

/// Represents the success or failure of a testcase.
#[derive(Clone, Debug)]
pub enum TestcaseStatus {
    /// This testcase passed: it has no failure, error or skipped marker.
    Success,

    /// This testcase did not pass.
    NonSuccess {
        /// Whether this testcase failed in an expected way (failure) or an
        /// unexpected way (error).
        kind: NonSuccessKind,

        /// The failure message attribute, if present.
        message: Option<String>,

        /// The "type" of failure that occurred, e.g. the exception class.
        ty: Option<String>,

        /// The description of the failure, read from the element's text
        /// node.
        description: Option<String>,
    },

    /// This testcase was not run.
    Skipped,
}

/// Whether a non-passing testcase failed in an expected or unexpected way.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NonSuccessKind {
    /// An expected failure, usually an assertion. Read from a `failure`
    /// element.
    Failure,

    /// An unexpected error, usually an exception. Read from an `error`
    /// element.
    Error,
}

/// A qualified test identifier: classname plus method name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TestId {
    /// The fully qualified class containing the test, if the report recorded
    /// one.
    pub classname: Option<String>,

    /// The test method name.
    pub name: String,
}

impl TestId {
    /// Creates a new `TestId`.
    pub fn new(classname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            classname: Some(classname.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classname {
            Some(classname) => write!(f, "{}::{}", classname, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
