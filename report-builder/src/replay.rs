// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replaying recorded lifecycle events.
//!
//! An event log is a JSON-lines file, one event per line, tagged by `"event"`:
//!
//! ```text
//! {"event": "run-started", "test-count": 2, "at": "2021-06-01T14:30:00Z"}
//! {"event": "test-started", "class": "my.Test", "method": "a"}
//! {"event": "test-failure", "class": "my.Test", "method": "a", "message": "boom", "trace": "...", "assertion": false}
//! {"event": "test-finished", "class": "my.Test", "method": "a", "at": "2021-06-01T14:30:01.5Z"}
//! {"event": "test-ignored", "class": "my.Test", "method": "b"}
//! {"event": "run-finished", "run-time-ms": 1500, "ignore-count": 1, "failure-count": 1}
//! ```
//!
//! An event's optional `at` timestamp sets the replay clock before the event is delivered, so
//! case times and the report timestamp come out the same on every replay. Blank lines are
//! skipped.

use crate::{
    errors::{ReplayError, RunListenerError},
    listener::{Description, Failure, FailureKind, RunResult},
    notifier::RunNotifier,
    time::ManualClock,
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::{io::BufRead, time::Duration};
use tracing::debug;

/// A single line of an event log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RecordedEvent {
    /// When the event happened.
    #[serde(default)]
    pub at: Option<DateTime<FixedOffset>>,

    /// The event itself.
    #[serde(flatten)]
    pub kind: RecordedEventKind,
}

/// The kinds of events that can appear in a log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum RecordedEventKind {
    RunStarted {
        test_count: usize,
    },
    TestStarted {
        class: String,
        method: String,
    },
    TestIgnored {
        class: String,
        method: String,
    },
    TestAssumptionFailure {
        class: String,
        method: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        trace: String,
    },
    TestFailure {
        class: String,
        method: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        trace: String,
        /// Whether the failure was an assertion. Anything else is reported as an error.
        #[serde(default)]
        assertion: bool,
    },
    TestFinished {
        class: String,
        method: String,
    },
    RunFinished {
        run_time_ms: u64,
        ignore_count: usize,
        failure_count: usize,
    },
}

impl RecordedEventKind {
    /// Delivers this event to every listener registered with `notifier`.
    pub fn fire(&self, notifier: &mut RunNotifier) -> Result<(), RunListenerError> {
        match self {
            Self::RunStarted { test_count } => {
                notifier.fire_test_run_started(&Description::suite(*test_count))
            }
            Self::TestStarted { class, method } => {
                notifier.fire_test_started(&Description::test(class, method))
            }
            Self::TestIgnored { class, method } => {
                notifier.fire_test_ignored(&Description::test(class, method))
            }
            Self::TestAssumptionFailure {
                class,
                method,
                message,
                trace,
            } => notifier.fire_test_assumption_failed(&Failure::new(
                Description::test(class, method),
                message.clone(),
                trace.as_str(),
                FailureKind::Assertion,
            )),
            Self::TestFailure {
                class,
                method,
                message,
                trace,
                assertion,
            } => {
                let kind = if *assertion {
                    FailureKind::Assertion
                } else {
                    FailureKind::Exception
                };
                notifier.fire_test_failure(&Failure::new(
                    Description::test(class, method),
                    message.clone(),
                    trace.as_str(),
                    kind,
                ))
            }
            Self::TestFinished { class, method } => {
                notifier.fire_test_finished(&Description::test(class, method))
            }
            Self::RunFinished {
                run_time_ms,
                ignore_count,
                failure_count,
            } => notifier.fire_test_run_finished(&RunResult {
                run_time: Duration::from_millis(*run_time_ms),
                ignore_count: *ignore_count,
                failure_count: *failure_count,
            }),
        }
    }
}

/// Feeds an event log through a notifier.
#[derive(Debug)]
pub struct EventReplayer<'a> {
    notifier: &'a mut RunNotifier,
    clock: ManualClock,
}

impl<'a> EventReplayer<'a> {
    /// Creates a replayer. `clock` should be the clock the notifier's listeners measure with.
    pub fn new(notifier: &'a mut RunNotifier, clock: ManualClock) -> Self {
        Self { notifier, clock }
    }

    /// Replays every event in `reader`, returning the number of events delivered.
    ///
    /// `path` is only used in errors. Replay stops at the first line that can't be parsed or
    /// that a listener fails on.
    pub fn replay(&mut self, reader: impl BufRead, path: &Utf8Path) -> Result<usize, ReplayError> {
        let mut count = 0;
        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line.map_err(|error| ReplayError::Read {
                path: path.to_owned(),
                error,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let event: RecordedEvent =
                serde_json::from_str(&line).map_err(|error| ReplayError::Parse {
                    path: path.to_owned(),
                    line: line_number,
                    error,
                })?;
            if let Some(at) = event.at {
                self.clock.set(at);
            }
            debug!("{path}:{line_number}: replaying {:?}", event.kind);
            event
                .kind
                .fire(self.notifier)
                .map_err(|error| ReplayError::Listener {
                    path: path.to_owned(),
                    line: line_number,
                    error,
                })?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_events() {
        let event: RecordedEvent = serde_json::from_str(
            r#"{"event": "test-failure", "class": "T", "method": "b", "message": "x failed", "trace": "t", "assertion": true, "at": "2021-06-01T14:30:00+02:00"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            RecordedEvent {
                at: Some(
                    FixedOffset::east_opt(2 * 3600)
                        .unwrap()
                        .with_ymd_and_hms(2021, 6, 1, 14, 30, 0)
                        .unwrap()
                ),
                kind: RecordedEventKind::TestFailure {
                    class: "T".to_owned(),
                    method: "b".to_owned(),
                    message: Some("x failed".to_owned()),
                    trace: "t".to_owned(),
                    assertion: true,
                },
            }
        );

        let event: RecordedEvent = serde_json::from_str(
            r#"{"event": "run-finished", "run-time-ms": 1500, "ignore-count": 1, "failure-count": 0}"#,
        )
        .unwrap();
        assert_eq!(event.at, None);
        assert_eq!(
            event.kind,
            RecordedEventKind::RunFinished {
                run_time_ms: 1500,
                ignore_count: 1,
                failure_count: 0,
            }
        );
    }

    #[test]
    fn parse_error_has_line_number() {
        let mut notifier = RunNotifier::new();
        let clock = ManualClock::new(chrono::Local::now().fixed_offset());
        let log = indoc! {r#"
            {"event": "run-started", "test-count": 1}

            {"event": "test-exploded"}
        "#};

        let error = EventReplayer::new(&mut notifier, clock)
            .replay(log.as_bytes(), Utf8Path::new("events.jsonl"))
            .unwrap_err();
        match error {
            ReplayError::Parse { path, line, .. } => {
                assert_eq!(path.as_str(), "events.jsonl");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
