// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The callbacks a test runner invokes over the course of a run.

use crate::errors::RunListenerError;
use std::time::Duration;

/// Receives lifecycle notifications from a test runner.
///
/// Runners deliver events sequentially and in order: `test_run_started` first, each
/// `test_started` paired with a `test_finished` before the next test starts, and
/// `test_run_finished` last. Failure callbacks arrive between the start and finish of the test
/// they belong to.
///
/// Every method has a no-op default, so implementors only override what they care about.
pub trait RunListener {
    /// Called before any tests have been run.
    fn test_run_started(&mut self, _description: &Description) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when an atomic test is about to be started.
    fn test_started(&mut self, _description: &Description) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when a test will not be run, generally because it is marked as ignored.
    ///
    /// Ignored tests are not preceded by `test_started` or followed by `test_finished`.
    fn test_ignored(&mut self, _description: &Description) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when an atomic test flags that it assumes a condition that is false.
    fn test_assumption_failure(&mut self, _failure: &Failure) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when an atomic test fails.
    fn test_failure(&mut self, _failure: &Failure) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when an atomic test has finished, whether the test succeeds or fails.
    fn test_finished(&mut self, _description: &Description) -> Result<(), RunListenerError> {
        Ok(())
    }

    /// Called when all tests have finished.
    fn test_run_finished(&mut self, _result: &RunResult) -> Result<(), RunListenerError> {
        Ok(())
    }
}

/// Describes either a whole run or a single test.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Description {
    /// The class that declares the test, if this describes a single test.
    pub class_name: Option<String>,

    /// The test method, if this describes a single test.
    pub method_name: Option<String>,

    /// The number of tests this description covers.
    pub test_count: usize,
}

impl Description {
    /// Describes a run of `test_count` tests.
    pub fn suite(test_count: usize) -> Self {
        Self {
            class_name: None,
            method_name: None,
            test_count,
        }
    }

    /// Describes a single test method.
    pub fn test(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            method_name: Some(method_name.into()),
            test_count: 1,
        }
    }

    /// Returns the class name, or an empty string if there is none.
    pub fn class_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or_default()
    }

    /// Returns the method name, or an empty string if there is none.
    pub fn method_name(&self) -> &str {
        self.method_name.as_deref().unwrap_or_default()
    }
}

/// Whether a failure came from an assertion or from something else going wrong.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// An assertion did not hold.
    Assertion,

    /// Any other error or panic.
    Exception,
}

/// A test failure, as reported by the runner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    /// The test that failed.
    pub description: Description,

    /// The failure message, if the failure carried one.
    pub message: Option<String>,

    /// The stack trace, rendered as text.
    pub trace: String,

    /// What kind of failure this was.
    pub kind: FailureKind,
}

impl Failure {
    /// Creates a new failure.
    pub fn new(
        description: Description,
        message: Option<String>,
        trace: impl Into<String>,
        kind: FailureKind,
    ) -> Self {
        Self {
            description,
            message,
            trace: trace.into(),
            kind,
        }
    }

    /// Returns true if this failure was caused by an assertion.
    pub fn is_assertion(&self) -> bool {
        self.kind == FailureKind::Assertion
    }
}

/// Aggregate statistics for a finished run, as counted by the runner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunResult {
    /// Total wall-clock time of the run.
    pub run_time: Duration,

    /// The number of ignored tests.
    pub ignore_count: usize,

    /// The number of tests that failed, for any reason.
    pub failure_count: usize,
}
