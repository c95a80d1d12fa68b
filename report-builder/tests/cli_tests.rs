// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use clap::Parser;
use indoc::indoc;
use report_builder::ReplayApp;

static PARTIAL_LOG: &str = indoc! {r#"
    {"event": "run-started", "test-count": 2, "at": "2021-06-01T14:30:00Z"}
    {"event": "test-started", "class": "my.Test", "method": "a", "at": "2021-06-01T14:30:00Z"}
    {"event": "test-finished", "class": "my.Test", "method": "a", "at": "2021-06-01T14:30:00.250Z"}
"#};

static FULL_LOG: &str = indoc! {r#"
    {"event": "run-started", "test-count": 1, "at": "2021-06-01T14:30:00Z"}
    {"event": "test-started", "class": "my.Test", "method": "a", "at": "2021-06-01T14:30:00Z"}
    {"event": "test-finished", "class": "my.Test", "method": "a", "at": "2021-06-01T14:30:00.250Z"}
    {"event": "run-finished", "run-time-ms": 250, "ignore-count": 0, "failure-count": 0, "at": "2021-06-01T14:30:00.250Z"}
"#};

fn write_log(dir: &Utf8Path, contents: &str) -> String {
    let path = dir.join("events.jsonl");
    std::fs::write(&path, contents).expect("writing event log succeeds");
    path.into_string()
}

fn run(args: &[&str]) -> String {
    let app = ReplayApp::try_parse_from(std::iter::once("junit-replay").chain(args.iter().copied()))
        .expect("arguments are valid");
    let mut stdout = Vec::new();
    app.exec(&mut stdout).expect("replay succeeds");
    String::from_utf8(stdout).expect("stdout is UTF-8")
}

/// Returns the `<testsuite ...>` start tag of a report.
fn suite_tag(xml: &str) -> &str {
    let start = xml.find("<testsuite").expect("report has a testsuite");
    let end = start + xml[start..].find('>').expect("start tag is closed");
    &xml[start..=end]
}

#[test]
fn truncated_log_writes_partial_file() {
    let dir = Utf8TempDir::new().unwrap();
    let log = write_log(dir.path(), PARTIAL_LOG);
    let output = dir.path().join("r.xml");

    let stdout = run(&[&log, "-o", output.as_str()]);
    assert_eq!(stdout, "", "nothing is written to stdout with --output");

    let xml = std::fs::read_to_string(&output).expect("partial report was written");
    assert_eq!(suite_tag(&xml), r#"<testsuite tests="2">"#);
    assert!(xml.contains(r#"<testcase name="a" classname="my.Test" time="0.250"/>"#));
    assert!(xml.ends_with("</testsuite>\n"));
}

#[test]
fn truncated_log_writes_partial_stdout() {
    let dir = Utf8TempDir::new().unwrap();
    let log = write_log(dir.path(), PARTIAL_LOG);

    let xml = run(&[&log]);
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert_eq!(suite_tag(&xml), r#"<testsuite tests="2">"#);
    assert!(!xml.contains("failures="));
}

#[test]
fn finished_log_is_auto_saved() {
    let dir = Utf8TempDir::new().unwrap();
    let log = write_log(dir.path(), FULL_LOG);
    let output = dir.path().join("nested").join("r.xml");

    let stdout = run(&[&log, "--output", output.as_str()]);
    assert_eq!(stdout, "");

    let xml = std::fs::read_to_string(&output).expect("report was saved on run finish");
    let tag = suite_tag(&xml);
    assert!(tag.starts_with(r#"<testsuite tests="1" time="0.250" skipped="0" errors="0" failures="0" "#));
    assert!(tag.contains("timestamp="));
}

#[test]
fn flags_and_config_file_are_applied() {
    let dir = Utf8TempDir::new().unwrap();
    let log = write_log(dir.path(), FULL_LOG);
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "newlines = true\nencoding = \"UTF-8\"\n").unwrap();

    let xml = run(&[
        &log,
        "--config",
        config.as_str(),
        "--encoding",
        "windows-1252",
        "-p",
        "os.name",
    ]);
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="windows-1252"?>"#));
    assert!(
        xml.contains(&format!(
            "\n<properties>\n<property name=\"os.name\" value=\"{}\"/>\n</properties>",
            std::env::consts::OS
        )),
        "config file turns on line breaks and -p adds a property: {xml}"
    );
}
