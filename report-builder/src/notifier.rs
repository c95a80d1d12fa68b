// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The point where listeners are registered with a runner.

use crate::{
    errors::RunListenerError,
    listener::{Description, Failure, RunListener, RunResult},
};
use std::fmt;

/// Something that accepts [`RunListener`]s.
pub trait ListenerRegistry {
    /// Registers a listener. Listeners are notified in registration order.
    fn add_listener(&mut self, listener: Box<dyn RunListener>);
}

/// Fans lifecycle events out to every registered listener.
///
/// Dispatch stops at the first listener that returns an error, and that error is returned to
/// the caller.
#[derive(Default)]
pub struct RunNotifier {
    listeners: Vec<Box<dyn RunListener>>,
}

impl fmt::Debug for RunNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl RunNotifier {
    /// Creates a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notifies listeners that the run is about to start.
    pub fn fire_test_run_started(
        &mut self,
        description: &Description,
    ) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_run_started(description))
    }

    /// Notifies listeners that an atomic test is about to start.
    pub fn fire_test_started(&mut self, description: &Description) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_started(description))
    }

    /// Notifies listeners that a test will not be run.
    pub fn fire_test_ignored(&mut self, description: &Description) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_ignored(description))
    }

    /// Notifies listeners that a test assumed a condition that is false.
    pub fn fire_test_assumption_failed(
        &mut self,
        failure: &Failure,
    ) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_assumption_failure(failure))
    }

    /// Notifies listeners that an atomic test failed.
    pub fn fire_test_failure(&mut self, failure: &Failure) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_failure(failure))
    }

    /// Notifies listeners that an atomic test finished, whether it succeeded or failed.
    pub fn fire_test_finished(&mut self, description: &Description) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_finished(description))
    }

    /// Notifies listeners that all tests have finished.
    pub fn fire_test_run_finished(&mut self, result: &RunResult) -> Result<(), RunListenerError> {
        self.dispatch(|listener| listener.test_run_finished(result))
    }

    fn dispatch(
        &mut self,
        mut f: impl FnMut(&mut dyn RunListener) -> Result<(), RunListenerError>,
    ) -> Result<(), RunListenerError> {
        for listener in &mut self.listeners {
            f(listener.as_mut())?;
        }
        Ok(())
    }
}

impl ListenerRegistry for RunNotifier {
    fn add_listener(&mut self, listener: Box<dyn RunListener>) {
        self.listeners.push(listener);
    }
}
