// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse a `Report` from JUnit XML.

use crate::{
    errors::ParseError,
    report::{NonSuccessKind, Report, Testcase, TestcaseStatus, Testsuite, TestsuiteChild},
};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

static TESTCASE_TAG: &str = "testcase";

pub(crate) fn parse_report(input: &str) -> Result<Report, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut report = Report::default();
    // Open testsuite elements, innermost last.
    let mut suite_stack: Vec<Testsuite> = Vec::new();
    let mut current_case: Option<Testcase> = None;
    // Set while inside a failure/error/skipped element so that its text node
    // is captured as the description.
    let mut in_marker = false;

    loop {
        match reader.read_event()? {
            Event::Start(tag) => match tag.name().as_ref() {
                b"testsuites" => {}
                b"testsuite" => {
                    suite_stack.push(read_testsuite(&tag)?);
                }
                b"testcase" => {
                    if suite_stack.is_empty() {
                        return Err(ParseError::unexpected_element(TESTCASE_TAG));
                    }
                    if current_case.is_some() {
                        // JUnit does not nest testcases.
                        return Err(ParseError::unexpected_element(TESTCASE_TAG));
                    }
                    current_case = Some(read_testcase(&tag)?);
                }
                b"failure" => {
                    apply_marker(&mut current_case, &tag, Some(NonSuccessKind::Failure))?;
                    in_marker = true;
                }
                b"error" => {
                    apply_marker(&mut current_case, &tag, Some(NonSuccessKind::Error))?;
                    in_marker = true;
                }
                b"skipped" => {
                    apply_marker(&mut current_case, &tag, None)?;
                    in_marker = true;
                }
                // Unknown elements (properties, system-out, ...) are ignored.
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"testsuite" => {
                    // A self-closing suite has no children; attach it
                    // directly.
                    attach_testsuite(read_testsuite(&tag)?, &mut suite_stack, &mut report);
                }
                b"testcase" => {
                    if suite_stack.is_empty() {
                        return Err(ParseError::unexpected_element(TESTCASE_TAG));
                    }
                    let testcase = read_testcase(&tag)?;
                    suite_stack
                        .last_mut()
                        .expect("just checked to be non-empty")
                        .children
                        .push(TestsuiteChild::Testcase(testcase));
                }
                b"failure" => {
                    apply_marker(&mut current_case, &tag, Some(NonSuccessKind::Failure))?;
                }
                b"error" => {
                    apply_marker(&mut current_case, &tag, Some(NonSuccessKind::Error))?;
                }
                b"skipped" => {
                    apply_marker(&mut current_case, &tag, None)?;
                }
                _ => {}
            },
            Event::End(tag) => match tag.name().as_ref() {
                b"testsuites" => {}
                b"testsuite" => {
                    let testsuite = suite_stack
                        .pop()
                        .expect("quick-xml rejects mismatched end tags");
                    attach_testsuite(testsuite, &mut suite_stack, &mut report);
                }
                b"testcase" => {
                    let testcase = current_case
                        .take()
                        .expect("quick-xml rejects mismatched end tags");
                    suite_stack
                        .last_mut()
                        .expect("testcase start was only accepted inside a testsuite")
                        .children
                        .push(TestsuiteChild::Testcase(testcase));
                }
                b"failure" | b"error" | b"skipped" => {
                    in_marker = false;
                }
                _ => {}
            },
            Event::Text(text) => {
                if in_marker {
                    let description = text.unescape()?.into_owned();
                    set_description(&mut current_case, description);
                }
            }
            Event::CData(data) => {
                if in_marker {
                    let description = String::from_utf8_lossy(&data).into_owned();
                    set_description(&mut current_case, description);
                }
            }
            Event::Eof => {
                // quick-xml reports mismatched end tags but not documents
                // that are truncated with elements still open.
                if !suite_stack.is_empty() || current_case.is_some() {
                    return Err(ParseError::UnexpectedEof);
                }
                break;
            }
            _ => {}
        }
    }

    Ok(report)
}

fn read_testsuite(tag: &BytesStart<'_>) -> Result<Testsuite, ParseError> {
    let mut testsuite = Testsuite::default();
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"name" {
            testsuite.name = attr.unescape_value()?.into_owned();
        }
    }
    Ok(testsuite)
}

fn read_testcase(tag: &BytesStart<'_>) -> Result<Testcase, ParseError> {
    let mut name = None;
    let mut classname = None;
    for attr in tag.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"name" => name = Some(attr.unescape_value()?.into_owned()),
            b"classname" | b"class" => classname = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    let name = name.ok_or(ParseError::MissingAttribute {
        element: TESTCASE_TAG,
        attribute: "name",
    })?;
    let mut testcase = Testcase::new(name, TestcaseStatus::Success);
    testcase.classname = classname;
    Ok(testcase)
}

fn attach_testsuite(testsuite: Testsuite, suite_stack: &mut Vec<Testsuite>, report: &mut Report) {
    match suite_stack.last_mut() {
        Some(parent) => parent.children.push(TestsuiteChild::Testsuite(testsuite)),
        None => report.testsuites.push(testsuite),
    }
}

/// Applies a failure/error/skipped marker to the open testcase.
///
/// `kind` is `None` for skipped markers. A marker never downgrades an
/// already-recorded non-success: the first failure or error wins. Markers
/// outside a testcase (some dialects attach errors at the suite level) are
/// ignored for selection purposes.
fn apply_marker(
    current_case: &mut Option<Testcase>,
    tag: &BytesStart<'_>,
    kind: Option<NonSuccessKind>,
) -> Result<(), ParseError> {
    let Some(testcase) = current_case.as_mut() else {
        return Ok(());
    };
    if !matches!(testcase.status, TestcaseStatus::Success) {
        return Ok(());
    }

    testcase.status = match kind {
        Some(kind) => {
            let mut message = None;
            let mut ty = None;
            for attr in tag.attributes() {
                let attr = attr?;
                match attr.key.as_ref() {
                    b"message" => message = Some(attr.unescape_value()?.into_owned()),
                    b"type" => ty = Some(attr.unescape_value()?.into_owned()),
                    _ => {}
                }
            }
            TestcaseStatus::NonSuccess {
                kind,
                message,
                ty,
                description: None,
            }
        }
        None => TestcaseStatus::Skipped,
    };
    Ok(())
}

fn set_description(current_case: &mut Option<Testcase>, text: String) {
    if let Some(Testcase {
        status: TestcaseStatus::NonSuccess { description, .. },
        ..
    }) = current_case.as_mut()
    {
        *description = Some(text);
    }
}
