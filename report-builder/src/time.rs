// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock time for per-test timing and report timestamps.
//!
//! Runners don't report how long an individual test took, so the builder measures it itself as
//! the wall-clock delta between the start and finish notifications. That includes whatever the
//! runner does between the two callbacks, so per-test times are an approximation.

use chrono::{DateTime, FixedOffset, Local};
use std::{cell::Cell, rc::Rc, time::Duration};

/// A source of the current time.
pub trait Clock {
    /// Returns the current wall-clock time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The local system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test (or a log replay) can hold one handle and give
/// another to the builder.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<FixedOffset>>>,
}

impl ManualClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now);
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let now = self.now.get();
        self.now.set(now.checked_add_signed(delta).unwrap_or(now));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}

/// The start of a single test's measurement.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CaseTimer {
    start_time: DateTime<FixedOffset>,
}

impl CaseTimer {
    pub(crate) fn start(clock: &dyn Clock) -> Self {
        Self {
            start_time: clock.now(),
        }
    }

    pub(crate) fn start_time(&self) -> DateTime<FixedOffset> {
        self.start_time
    }

    /// Returns the time since the start. A clock that went backwards reads as zero.
    pub(crate) fn elapsed(&self, clock: &dyn Clock) -> Duration {
        (clock.now() - self.start_time)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
