// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io;
use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
#[error("error serializing JUnit report")]
pub struct SerializeError {
    #[from]
    inner: quick_xml::Error,
}

impl From<io::Error> for SerializeError {
    fn from(error: io::Error) -> Self {
        Self {
            inner: error.into(),
        }
    }
}

/// An encoding label was not recognized, or names an encoding that can't be written.
///
/// Returned by [`XmlEncoding::for_label`](crate::XmlEncoding::for_label).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown or unwritable XML encoding `{label}`")]
pub struct UnknownEncodingError {
    label: String,
}

impl UnknownEncodingError {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the label that couldn't be parsed.
    pub fn label(&self) -> &str {
        &self.label
    }
}
