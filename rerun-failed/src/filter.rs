// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build a `--filter` expression selecting a set of previously failing
//! tests.

use rerun_report::TestId;
use std::fmt;

/// A test-selection expression for the runner's `--filter` option.
///
/// The runner treats the filter as a regular expression matched against each
/// test's qualified name. The expression built here selects exactly the
/// tests it was built from: every identifier is escaped so it matches
/// literally, and anchored so that `FooTest::testBar` is never selected by a
/// filter built for `FooTest::testBarBaz`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterExpression {
    expression: String,
}

impl FilterExpression {
    /// Builds a filter expression from a non-empty list of failed tests.
    ///
    /// Identifiers are joined with `|` in list order. The caller branches to
    /// logfile cleanup when the list is empty, so an empty list here is a
    /// bug.
    pub fn from_failed(failed: &[TestId]) -> Self {
        debug_assert!(
            !failed.is_empty(),
            "an empty failed-test list goes to cleanup, not to a filtered rerun"
        );

        let expression = failed
            .iter()
            .map(|id| {
                let mut alternative = escape_literal(&id.to_string());
                alternative.push('$');
                alternative
            })
            .collect::<Vec<_>>()
            .join("|");
        Self { expression }
    }

    /// Returns the expression string to pass to the runner.
    pub fn as_str(&self) -> &str {
        &self.expression
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Escapes a qualified test name so it matches literally inside the filter
/// regex.
///
/// The namespace separator `\` is also the regex escape character, so it is
/// doubled -- exactly once. The remaining metacharacters are escaped the
/// same way; method names from data providers can legally contain `"` and
/// spaces but those need no escaping.
fn escape_literal(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
