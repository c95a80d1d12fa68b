// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    SerializeError,
    serialize::{SerializeOptions, serialize_report},
};
use chrono::{DateTime, FixedOffset};
use std::{io, time::Duration};

/// The root `testsuite` element of a JUnit report.
///
/// A report describes exactly one run of one test class. Attributes that are only known once a
/// run is over live in [`RunSummary`], so a report that is serialized mid-run carries the test
/// count and nothing else.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    /// The number of tests announced at the start of the run.
    ///
    /// This is what the runner planned to execute, not what actually completed.
    pub tests: Option<usize>,

    /// Aggregate results, set when the run finishes.
    pub summary: Option<RunSummary>,

    /// Custom properties, e.g. environment variables.
    pub properties: Option<Properties>,

    /// The test cases in execution order.
    pub test_cases: Vec<TestCase>,
}

impl Report {
    /// Creates a new, empty `Report`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of tests announced for this run.
    pub fn set_tests(&mut self, tests: usize) -> &mut Self {
        self.tests = Some(tests);
        self
    }

    /// Sets the aggregate results for this run.
    pub fn set_summary(&mut self, summary: RunSummary) -> &mut Self {
        self.summary = Some(summary);
        self
    }

    /// Returns the properties block, creating an empty one if there isn't one yet.
    pub fn properties_mut(&mut self) -> &mut Properties {
        self.properties.get_or_insert_with(Properties::new)
    }

    /// Adds a property, creating the properties block if necessary.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties_mut().push(property);
        self
    }

    /// Appends a test case and returns its index.
    pub fn add_test_case(&mut self, test_case: TestCase) -> usize {
        self.test_cases.push(test_case);
        self.test_cases.len() - 1
    }

    /// Counts the test cases whose outcome matches `kind`.
    pub fn count_outcomes(&self, kind: OutcomeKind) -> usize {
        self.test_cases
            .iter()
            .filter(|test_case| test_case.outcome_kind() == kind)
            .count()
    }

    /// Serialize this report to the given writer, using default options.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        self.serialize_with(writer, &SerializeOptions::default())
    }

    /// Serialize this report to the given writer.
    pub fn serialize_with(
        &self,
        writer: impl io::Write,
        options: &SerializeOptions,
    ) -> Result<(), SerializeError> {
        serialize_report(self, writer, options)
    }

    /// Serialize this report to a string, using default options.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        String::from_utf8(buf).map_err(|utf8_err| {
            quick_xml::Error::NonDecodable(Some(utf8_err.utf8_error())).into()
        })
    }
}

/// Aggregate results for a finished run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunSummary {
    /// The overall time taken by the run, serialized as seconds.
    pub time: Duration,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The number of tests that failed in an unexpected way (an exception was thrown).
    pub errors: usize,

    /// The number of tests that failed an assertion.
    pub failures: usize,

    /// The time at which the run finished.
    ///
    /// This is written out with a 12-hour clock and no AM/PM marker, so an afternoon run
    /// cannot be told apart from a morning one. Downstream tools already consume the format as
    /// is, so it is left alone.
    pub timestamp: DateTime<FixedOffset>,
}

/// The `properties` block of a report.
///
/// Entries keep insertion order and are never deduplicated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Properties {
    entries: Vec<Property>,
}

impl Properties {
    /// Creates an empty properties block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property.
    pub fn push(&mut self, property: impl Into<Property>) -> &mut Self {
        self.entries.push(property.into());
        self
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: Into<Property>> FromIterator<P> for Properties {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single `property` entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    /// The name of the property.
    pub name: String,

    /// The value of the property. `None` if it couldn't be resolved, in which case the `value`
    /// attribute is omitted.
    pub value: Option<String>,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl<K, V> From<(K, V)> for Property
where
    K: Into<String>,
    V: Into<String>,
{
    fn from((k, v): (K, V)) -> Self {
        Property::new(k, Some(v.into()))
    }
}

/// Represents a single `testcase` element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    /// The test method name.
    pub name: String,

    /// The name of the class declaring the test method.
    pub classname: String,

    /// The time it took to execute this test case. `None` while the test is still running.
    pub time: Option<CaseTime>,

    /// The outcome of this test. `None` is an implicit pass.
    pub outcome: Option<Outcome>,
}

impl TestCase {
    /// Creates a new test case with no time and no outcome.
    pub fn new(name: impl Into<String>, classname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: classname.into(),
            time: None,
            outcome: None,
        }
    }

    /// Creates a test case for a skipped test: time `0` and a `skipped` outcome.
    pub fn skipped(name: impl Into<String>, classname: impl Into<String>) -> Self {
        let mut test_case = Self::new(name, classname);
        test_case.time = Some(CaseTime::NotRun);
        test_case.outcome = Some(Outcome::Skipped);
        test_case
    }

    /// Sets the measured time for this test case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(CaseTime::Measured(time));
        self
    }

    /// Attaches an outcome, unless one is already attached.
    ///
    /// Returns the rejected outcome if the test case already had one.
    pub fn attach_outcome(&mut self, outcome: Outcome) -> Result<(), Outcome> {
        match self.outcome {
            Some(_) => Err(outcome),
            None => {
                self.outcome = Some(outcome);
                Ok(())
            }
        }
    }

    /// Returns the kind of outcome of this test case.
    pub fn outcome_kind(&self) -> OutcomeKind {
        match &self.outcome {
            None => OutcomeKind::Pass,
            Some(outcome) => outcome.kind(),
        }
    }
}

/// The time attribute of a test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseTime {
    /// The test ran for this long. Serialized as seconds with three decimals.
    Measured(Duration),

    /// The test never ran. Serialized as a literal `0`.
    NotRun,
}

/// The child element of a test case that did not pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The test was not run. Serialized as `skipped`.
    Skipped,

    /// The test failed an assertion. Serialized as `failure`.
    Failure(FailureDetails),

    /// The test threw something other than an assertion error. Serialized as `error`.
    Error(FailureDetails),
}

impl Outcome {
    /// Creates a `failure` outcome.
    pub fn failure(message: Option<String>, trace: impl Into<String>) -> Self {
        Outcome::Failure(FailureDetails::new(message, trace))
    }

    /// Creates an `error` outcome.
    pub fn error(message: Option<String>, trace: impl Into<String>) -> Self {
        Outcome::Error(FailureDetails::new(message, trace))
    }

    /// Returns the kind of this outcome.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Skipped => OutcomeKind::Skipped,
            Outcome::Failure(_) => OutcomeKind::Failure,
            Outcome::Error(_) => OutcomeKind::Error,
        }
    }
}

/// The message and trace carried by a `failure` or `error` element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureDetails {
    /// The failure message. Serialized as the `message` attribute, which is omitted if `None`.
    pub message: Option<String>,

    /// The stack trace. Serialized as the text node of the element.
    pub trace: String,
}

impl FailureDetails {
    /// Creates new failure details.
    pub fn new(message: Option<String>, trace: impl Into<String>) -> Self {
        Self {
            message,
            trace: trace.into(),
        }
    }
}

/// The kind of outcome of a test case, including the implicit pass.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OutcomeKind {
    /// No outcome element.
    Pass,
    /// `skipped`.
    Skipped,
    /// `failure`.
    Failure,
    /// `error`.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn attach_outcome_keeps_first() {
        let mut test_case = TestCase::new("a", "T");
        assert_eq!(test_case.outcome_kind(), OutcomeKind::Pass);

        test_case
            .attach_outcome(Outcome::failure(Some("first".to_owned()), "trace"))
            .expect("no outcome yet");
        let rejected = test_case
            .attach_outcome(Outcome::error(None, "second"))
            .expect_err("outcome already attached");

        assert_eq!(rejected.kind(), OutcomeKind::Error);
        assert_eq!(
            test_case.outcome,
            Some(Outcome::failure(Some("first".to_owned()), "trace"))
        );
    }

    #[test]
    fn skipped_case_is_sealed() {
        let test_case = TestCase::skipped("c", "T");
        assert_eq!(test_case.time, Some(CaseTime::NotRun));
        assert_eq!(test_case.outcome_kind(), OutcomeKind::Skipped);
    }

    #[test]
    fn count_outcomes() {
        let mut report = Report::new();
        report.add_test_case(TestCase::new("a", "T"));
        report.add_test_case(TestCase::skipped("b", "T"));
        let mut failed = TestCase::new("c", "T");
        failed
            .attach_outcome(Outcome::failure(None, ""))
            .expect("no outcome yet");
        report.add_test_case(failed);

        assert_eq!(report.count_outcomes(OutcomeKind::Pass), 1);
        assert_eq!(report.count_outcomes(OutcomeKind::Skipped), 1);
        assert_eq!(report.count_outcomes(OutcomeKind::Failure), 1);
        assert_eq!(report.count_outcomes(OutcomeKind::Error), 0);
    }

    #[test]
    fn properties_keep_duplicates() {
        let mut report = Report::new();
        report
            .add_property(("user.dir", "/a"))
            .add_property(("user.dir", "/b"))
            .add_property(Property::new("missing", None));

        let properties = report.properties.expect("properties block created");
        let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["user.dir", "user.dir", "missing"]);
        assert_eq!(properties.len(), 3);
    }
}
