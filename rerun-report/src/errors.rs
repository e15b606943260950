// Copyright (c) The rerun-failed Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// An error that occurs while parsing a [`Report`](crate::Report).
///
/// Returned by [`Report::parse`](crate::Report::parse). A malformed document
/// is always rejected: it never parses to an empty report, since "could not
/// read the report" must stay distinguishable from "no failed tests".
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("error reading JUnit XML")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be read.
    #[error("error reading attribute in JUnit XML")]
    Attr(#[from] AttrError),

    /// A required attribute is missing.
    #[error("`{element}` element is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// The element the attribute was expected on.
        element: &'static str,
        /// The name of the missing attribute.
        attribute: &'static str,
    },

    /// An element appeared somewhere the JUnit schema does not allow it.
    #[error("unexpected `{element}` element")]
    UnexpectedElement {
        /// The name of the offending element.
        element: String,
    },

    /// The document ended with elements still open.
    #[error("unexpected end of JUnit XML document")]
    UnexpectedEof,
}

impl ParseError {
    pub(crate) fn unexpected_element(element: impl Into<String>) -> Self {
        Self::UnexpectedElement {
            element: element.into(),
        }
    }
}
