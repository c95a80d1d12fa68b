// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build and serialize single-suite JUnit XML reports.
//!
//! A [`Report`] is rendered as a `testsuite` root element holding an optional `properties`
//! block followed by `testcase` elements, in the shape consumed by CI systems that read
//! JUnit-style results.

mod encoding;
mod errors;
mod report;
mod serialize;

pub use encoding::XmlEncoding;
pub use errors::*;
pub use report::*;
pub use serialize::{SerializeOptions, TIMESTAMP_FORMAT};
