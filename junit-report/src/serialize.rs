// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report`.

use crate::{
    CaseTime, FailureDetails, Outcome, Properties, Property, Report, RunSummary, SerializeError,
    TestCase, XmlEncoding, encoding::escape,
};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::{io, time::Duration};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static PROPERTIES_TAG: &str = "properties";
static PROPERTY_TAG: &str = "property";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";

/// `yyyy-MM-dd hh:mm:ss`, with a 12-hour hour field and no AM/PM marker.
pub static TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S";

/// Options controlling how a [`Report`] is written out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SerializeOptions {
    /// If true, every element starts on a new line. Elements are not indented.
    pub insert_line_breaks: bool,

    /// The character encoding of the output.
    pub encoding: XmlEncoding,
}

impl SerializeOptions {
    /// Creates the default options: compact output, UTF-8.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to insert line breaks between elements.
    pub fn set_insert_line_breaks(&mut self, insert_line_breaks: bool) -> &mut Self {
        self.insert_line_breaks = insert_line_breaks;
        self
    }

    /// Sets the output encoding.
    pub fn set_encoding(&mut self, encoding: XmlEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }
}

pub(crate) fn serialize_report(
    report: &Report,
    mut out: impl io::Write,
    options: &SerializeOptions,
) -> Result<(), SerializeError> {
    // The document is built as UTF-8 and transcoded once at the end.
    let mut writer = if options.insert_line_breaks {
        Writer::new_with_indent(Vec::new(), b' ', 0)
    } else {
        Writer::new(Vec::new())
    };
    let encoding = options.encoding;

    let decl = BytesDecl::new("1.0", Some(encoding.label()), None);
    writer.write_event(Event::Decl(decl))?;
    if !options.insert_line_breaks {
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    }

    serialize_report_impl(report, &mut writer)?;

    // Add a trailing newline.
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;

    let buf = writer.into_inner();
    let text = String::from_utf8(buf)
        .map_err(|utf8_err| quick_xml::Error::NonDecodable(Some(utf8_err.utf8_error())))?;
    out.write_all(&encoding.encode(&text))?;
    out.flush()?;
    Ok(())
}

fn serialize_report_impl(
    report: &Report,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        tests,
        summary,
        properties,
        test_cases,
    } = report;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    if let Some(tests) = tests {
        push_attribute(&mut testsuite_tag, "tests", &tests.to_string());
    }
    if let Some(summary) = summary {
        let RunSummary {
            time,
            skipped,
            errors,
            failures,
            timestamp,
        } = summary;
        push_attribute(&mut testsuite_tag, "time", &serialize_time(time));
        push_attribute(&mut testsuite_tag, "skipped", &skipped.to_string());
        push_attribute(&mut testsuite_tag, "errors", &errors.to_string());
        push_attribute(&mut testsuite_tag, "failures", &failures.to_string());
        push_attribute(
            &mut testsuite_tag,
            "timestamp",
            &timestamp.format(TIMESTAMP_FORMAT).to_string(),
        );
    }

    if properties.is_none() && test_cases.is_empty() {
        return writer.write_event(Event::Empty(testsuite_tag));
    }
    writer.write_event(Event::Start(testsuite_tag))?;

    if let Some(properties) = properties {
        serialize_properties(properties, writer)?;
    }

    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }

    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_properties(
    properties: &Properties,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    if properties.is_empty() {
        return writer.write_event(Event::Empty(BytesStart::new(PROPERTIES_TAG)));
    }

    writer.write_event(Event::Start(BytesStart::new(PROPERTIES_TAG)))?;
    for property in properties {
        serialize_property(property, writer)?;
    }
    serialize_end_tag(PROPERTIES_TAG, writer)
}

fn serialize_property(
    property: &Property,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut property_tag = BytesStart::new(PROPERTY_TAG);
    push_attribute(&mut property_tag, "name", &property.name);
    if let Some(value) = &property.value {
        push_attribute(&mut property_tag, "value", value);
    }

    writer.write_event(Event::Empty(property_tag))
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let TestCase {
        name,
        classname,
        time,
        outcome,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    push_attribute(&mut testcase_tag, "name", name);
    push_attribute(&mut testcase_tag, "classname", classname);
    match time {
        Some(CaseTime::Measured(time)) => {
            push_attribute(&mut testcase_tag, "time", &serialize_time(time));
        }
        Some(CaseTime::NotRun) => push_attribute(&mut testcase_tag, "time", "0"),
        None => {}
    }

    let Some(outcome) = outcome else {
        return writer.write_event(Event::Empty(testcase_tag));
    };

    writer.write_event(Event::Start(testcase_tag))?;
    match outcome {
        Outcome::Skipped => {
            writer.write_event(Event::Empty(BytesStart::new(SKIPPED_TAG)))?;
        }
        Outcome::Failure(details) => {
            serialize_failure(details, FAILURE_TAG, writer)?;
        }
        Outcome::Error(details) => {
            serialize_failure(details, ERROR_TAG, writer)?;
        }
    }
    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_failure(
    details: &FailureDetails,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut tag = BytesStart::new(tag_name);
    if let Some(message) = &details.message {
        push_attribute(&mut tag, "message", message);
    }

    if details.trace.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    let text = BytesText::from_escaped(escape(&details.trace));
    writer.write_event(Event::Text(text))?;
    serialize_end_tag(tag_name, writer)
}

fn push_attribute(tag: &mut BytesStart<'_>, key: &str, value: &str) {
    // Escaped here rather than by quick-xml so that forbidden characters are dropped.
    let value = escape(value);
    tag.push_attribute((key.as_bytes(), value.as_bytes()));
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

// Serialize time as seconds with 3 decimal points.
fn serialize_time(time: &Duration) -> String {
    format!("{:.3}", time.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn to_string_with(report: &Report, options: &SerializeOptions) -> String {
        let mut buf = Vec::new();
        report
            .serialize_with(&mut buf, options)
            .expect("serializing to a Vec succeeds");
        String::from_utf8(buf).expect("output is UTF-8")
    }

    fn finished_report() -> Report {
        let timestamp = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2021, 3, 4, 15, 6, 7)
            .unwrap();
        let mut report = Report::new();
        report.set_tests(2).set_summary(RunSummary {
            time: Duration::from_millis(1500),
            skipped: 0,
            errors: 1,
            failures: 0,
            timestamp,
        });
        report.properties_mut();

        let mut passed = TestCase::new("a", "T");
        passed.set_time(Duration::from_millis(12));
        report.add_test_case(passed);

        let mut errored = TestCase::new("b", "T");
        errored.set_time(Duration::from_millis(3));
        errored
            .attach_outcome(Outcome::error(Some("boom".to_owned()), "at T.b"))
            .unwrap();
        report.add_test_case(errored);
        report
    }

    #[test_case(Duration::ZERO, "0.000"; "zero")]
    #[test_case(Duration::from_millis(1500), "1.500"; "millis")]
    #[test_case(Duration::from_nanos(421_580), "0.000"; "sub millisecond")]
    #[test_case(Duration::new(42, 234_567_890), "42.235"; "rounds")]
    fn time_has_three_decimals(time: Duration, expected: &str) {
        assert_eq!(serialize_time(&time), expected);
    }

    #[test]
    fn empty_report() {
        assert_eq!(
            Report::new().to_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite/>\n"
        );
    }

    #[test]
    fn compact_by_default() {
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<testsuite tests=\"2\" time=\"1.500\" skipped=\"0\" errors=\"1\" failures=\"0\" ",
            "timestamp=\"2021-03-04 03:06:07\">",
            "<properties/>",
            "<testcase name=\"a\" classname=\"T\" time=\"0.012\"/>",
            "<testcase name=\"b\" classname=\"T\" time=\"0.003\">",
            "<error message=\"boom\">at T.b</error>",
            "</testcase>",
            "</testsuite>\n",
        );
        assert_eq!(finished_report().to_string().unwrap(), expected);
    }

    #[test]
    fn line_breaks() {
        let mut options = SerializeOptions::new();
        options.set_insert_line_breaks(true);

        let expected = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuite tests="2" time="1.500" skipped="0" errors="1" failures="0" timestamp="2021-03-04 03:06:07">
            <properties/>
            <testcase name="a" classname="T" time="0.012"/>
            <testcase name="b" classname="T" time="0.003">
            <error message="boom">at T.b</error>
            </testcase>
            </testsuite>
        "#};
        assert_eq!(to_string_with(&finished_report(), &options), expected);
    }

    #[test]
    fn partial_report_has_only_test_count() {
        let mut report = Report::new();
        report.set_tests(3);
        report.add_test_case(TestCase::new("a", "T"));

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<testsuite tests=\"3\"><testcase name=\"a\" classname=\"T\"/></testsuite>\n",
        );
        assert_eq!(report.to_string().unwrap(), expected);
    }

    #[test]
    fn escapes_markup_and_omits_missing_values() {
        let mut report = Report::new();
        report
            .add_property(("quote", "say \"hi\" & <bye>"))
            .add_property(Property::new("missing", None));
        let mut failed = TestCase::new("a", "T");
        failed
            .attach_outcome(Outcome::failure(None, "expected <1> & got <2>"))
            .unwrap();
        report.add_test_case(failed);

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<testsuite><properties>",
            "<property name=\"quote\" value=\"say &quot;hi&quot; &amp; &lt;bye&gt;\"/>",
            "<property name=\"missing\"/>",
            "</properties>",
            "<testcase name=\"a\" classname=\"T\">",
            "<failure>expected &lt;1&gt; &amp; got &lt;2&gt;</failure>",
            "</testcase></testsuite>\n",
        );
        assert_eq!(report.to_string().unwrap(), expected);
    }

    #[test]
    fn latin1_output() {
        let mut report = Report::new();
        report.add_property(("name", "Zoë ✓"));
        let mut options = SerializeOptions::new();
        options.set_encoding("latin1".parse().unwrap());

        let mut buf = Vec::new();
        report.serialize_with(&mut buf, &options).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"windows-1252\"?>\n");
        expected.extend_from_slice(b"<testsuite><properties>");
        expected.extend_from_slice(b"<property name=\"name\" value=\"Zo\xeb &#10003;\"/>");
        expected.extend_from_slice(b"</properties></testsuite>\n");
        assert_eq!(buf, expected);
    }

    #[test]
    fn skipped_and_empty_trace() {
        let mut report = Report::new();
        report.add_test_case(TestCase::skipped("c", "T"));
        let mut failed = TestCase::new("d", "T");
        failed
            .attach_outcome(Outcome::failure(Some("no trace".to_owned()), ""))
            .unwrap();
        report.add_test_case(failed);

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<testsuite>",
            "<testcase name=\"c\" classname=\"T\" time=\"0\"><skipped/></testcase>",
            "<testcase name=\"d\" classname=\"T\"><failure message=\"no trace\"/></testcase>",
            "</testsuite>\n",
        );
        assert_eq!(report.to_string().unwrap(), expected);
    }
}
