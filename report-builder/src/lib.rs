// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build JUnit XML reports from test runner lifecycle events.
//!
//! An [`XmlReportBuilder`] registers a [`RunListener`](listener::RunListener) with a runner
//! through [`ListenerRegistry`](notifier::ListenerRegistry). As the runner reports tests
//! starting, failing, being ignored and finishing, the listener assembles a
//! [`junit_report::Report`], which can be serialized once the run is over.
//!
//! # Examples
//!
//! ```
//! use report_builder::{
//!     XmlReportBuilder,
//!     listener::{Description, RunResult},
//!     notifier::RunNotifier,
//! };
//! use std::time::Duration;
//!
//! let mut notifier = RunNotifier::new();
//! let builder = XmlReportBuilder::new(&mut notifier);
//!
//! let test = Description::test("my.package.MyTest", "passes");
//! notifier.fire_test_run_started(&Description::suite(1))?;
//! notifier.fire_test_started(&test)?;
//! notifier.fire_test_finished(&test)?;
//! notifier.fire_test_run_finished(&RunResult {
//!     run_time: Duration::from_millis(5),
//!     ignore_count: 0,
//!     failure_count: 0,
//! })?;
//!
//! let xml = builder.to_xml_string()?;
//! assert!(xml.contains(r#"<testcase name="passes" classname="my.package.MyTest""#));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
pub mod config;
mod dispatch;
pub mod errors;
pub mod listener;
pub mod notifier;
mod output;
pub mod properties;
pub mod replay;
pub mod time;

pub use builder::{ReportBuilderOptions, XmlReportBuilder};
pub use dispatch::ReplayApp;
pub use output::LOG_ENV;
