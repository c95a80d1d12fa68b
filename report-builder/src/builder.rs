// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds a JUnit report from the lifecycle events of a single test run.

use crate::{
    config::BuilderConfig,
    errors::{RunListenerError, SaveReportError},
    listener::{Description, Failure, RunListener, RunResult},
    notifier::ListenerRegistry,
    properties::{ProcessLookup, PropertyLookup},
    time::{CaseTimer, Clock, SystemClock},
};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use junit_report::{
    Outcome, Properties, Property, Report, RunSummary, SerializeError, SerializeOptions,
    TestCase,
};
use std::{
    cell::RefCell,
    fs::{self, File},
    io::{self, BufWriter},
    rc::Rc,
};
use tracing::{debug, info, warn};

/// Builds a JUnit XML report for one test run.
///
/// Constructing a builder registers a listener with the runner. From then on the runner's
/// callbacks are the only thing that changes test cases and counts; the builder itself is used
/// to add properties and to write the report out once the run is over.
///
/// # Misuse
///
/// Serializing before the run has finished is allowed, but produces a partial report: only the
/// test count and the test cases seen so far are written. A builder serves one run at a time;
/// the listener's bookkeeping is not synchronized, and the builder is deliberately `!Send`.
#[derive(Debug)]
pub struct XmlReportBuilder {
    shared: Rc<RefCell<SharedReport>>,
    lookup: DebugIgnore<Box<dyn PropertyLookup>>,
}

impl XmlReportBuilder {
    /// Creates a builder with no properties and registers its listener with `registry`.
    pub fn new(registry: &mut dyn ListenerRegistry) -> Self {
        Self::builder().build(registry)
    }

    /// Creates a builder that adds a property for each of `keys`, resolved from the process
    /// environment, and registers its listener with `registry`.
    pub fn with_properties<I, S>(registry: &mut dyn ListenerRegistry, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().property_keys(keys).build(registry)
    }

    /// Creates a builder set up from `config` and registers its listener with `registry`.
    ///
    /// If the config names an output file, the report is written there when the run finishes.
    pub fn from_config(registry: &mut dyn ListenerRegistry, config: &BuilderConfig) -> Self {
        let mut builder = Self::builder().apply_config(config).build(registry);
        if let Some(output) = &config.output {
            builder.set_auto_save(output.clone());
        }
        builder
    }

    /// Returns options for a builder with an injected property lookup or clock.
    pub fn builder() -> ReportBuilderOptions {
        ReportBuilderOptions::new()
    }

    /// Adds a property whose value is looked up now, not when the report is written.
    ///
    /// If the lookup has no value for `key`, the property is written without one.
    pub fn add_property(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = self.lookup.lookup(&key);
        self.push_property(Property::new(key, value))
    }

    /// Adds a property with an explicit value.
    pub fn add_property_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_property(Property::new(key, Some(value.into())))
    }

    fn push_property(&mut self, property: Property) -> &mut Self {
        self.shared.borrow_mut().report.add_property(property);
        self
    }

    /// Writes the report to this path as soon as the run finishes.
    ///
    /// A failure to write is fatal to the run-finished callback.
    pub(crate) fn set_auto_save(&mut self, path: impl Into<Utf8PathBuf>) -> &mut Self {
        self.shared.borrow_mut().auto_save = Some(path.into());
        self
    }

    /// Returns a copy of the report as it currently stands.
    pub fn report(&self) -> Report {
        self.shared.borrow().report.clone()
    }

    /// Writes the report to `writer` as UTF-8 without line breaks.
    ///
    /// Call this after the run has finished; see [the type docs](Self#misuse).
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        self.shared.borrow().report.serialize(writer)
    }

    /// Writes the report to `writer` with the given options.
    pub fn serialize_with(
        &self,
        writer: impl io::Write,
        options: &SerializeOptions,
    ) -> Result<(), SerializeError> {
        self.shared.borrow().report.serialize_with(writer, options)
    }

    /// Writes the report to a file, using the options the builder was configured with.
    pub fn write_to_file(&self, path: impl AsRef<Utf8Path>) -> Result<(), SaveReportError> {
        self.shared.borrow().save(path.as_ref())
    }

    /// Returns the report as an XML string.
    ///
    /// Calling this twice without any events in between returns identical output.
    pub fn to_xml_string(&self) -> Result<String, SerializeError> {
        self.shared.borrow().report.to_string()
    }
}

/// Options for constructing an [`XmlReportBuilder`].
#[derive(Debug)]
#[must_use]
pub struct ReportBuilderOptions {
    property_keys: Vec<String>,
    lookup: DebugIgnore<Box<dyn PropertyLookup>>,
    clock: DebugIgnore<Box<dyn Clock>>,
    serialize_options: SerializeOptions,
}

impl ReportBuilderOptions {
    fn new() -> Self {
        Self {
            property_keys: Vec::new(),
            lookup: DebugIgnore(Box::new(ProcessLookup)),
            clock: DebugIgnore(Box::new(SystemClock)),
            serialize_options: SerializeOptions::default(),
        }
    }

    /// Adds properties for these keys when the builder is constructed.
    pub fn property_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.property_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Resolves property values with `lookup` instead of the process environment.
    pub fn lookup(mut self, lookup: impl PropertyLookup + 'static) -> Self {
        self.lookup = DebugIgnore(Box::new(lookup));
        self
    }

    /// Measures test times and stamps the report with `clock` instead of the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = DebugIgnore(Box::new(clock));
        self
    }

    /// Sets the options used by [`XmlReportBuilder::write_to_file`] and by saves at the end of
    /// a run.
    pub fn serialize_options(mut self, serialize_options: SerializeOptions) -> Self {
        self.serialize_options = serialize_options;
        self
    }

    /// Adds the config's properties and takes its serialize options.
    ///
    /// The output file is not applied here; see [`XmlReportBuilder::from_config`].
    pub(crate) fn apply_config(self, config: &BuilderConfig) -> Self {
        self.property_keys(config.properties.iter().cloned())
            .serialize_options(config.serialize_options)
    }

    /// Creates the builder and registers its listener with `registry`.
    pub fn build(self, registry: &mut dyn ListenerRegistry) -> XmlReportBuilder {
        let ReportBuilderOptions {
            property_keys,
            lookup,
            clock,
            serialize_options,
        } = self;

        let mut report = Report::new();
        report.properties = Some(Properties::new());
        let shared = Rc::new(RefCell::new(SharedReport {
            report,
            serialize_options,
            auto_save: None,
        }));

        registry.add_listener(Box::new(ReportListener {
            shared: shared.clone(),
            clock,
            current_case: None,
            failure_count: 0,
        }));

        let mut builder = XmlReportBuilder { shared, lookup };
        for key in property_keys {
            builder.add_property(key);
        }
        builder
    }
}

/// State shared between the builder and its listener.
#[derive(Debug)]
struct SharedReport {
    report: Report,
    serialize_options: SerializeOptions,
    auto_save: Option<Utf8PathBuf>,
}

impl SharedReport {
    fn save(&self, path: &Utf8Path) -> Result<(), SaveReportError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|error| SaveReportError::Create {
                path: dir.to_owned(),
                error,
            })?;
        }

        let f = File::create(path).map_err(|error| SaveReportError::Create {
            path: path.to_owned(),
            error,
        })?;
        self.report
            .serialize_with(BufWriter::new(f), &self.serialize_options)
            .map_err(|error| SaveReportError::Serialize {
                path: path.to_owned(),
                error,
            })
    }
}

/// The test that is currently running.
#[derive(Clone, Copy, Debug)]
struct CurrentCase {
    /// Index into the report's test cases.
    index: usize,
    timer: CaseTimer,
}

/// The listener registered with the runner. It owns the per-run bookkeeping.
#[derive(Debug)]
struct ReportListener {
    shared: Rc<RefCell<SharedReport>>,
    clock: DebugIgnore<Box<dyn Clock>>,
    /// Set between `test_started` and `test_finished` only, so a late failure can't land on the
    /// next test.
    current_case: Option<CurrentCase>,
    /// Failures attributed to assertions during this run. Everything else the runner counts as
    /// failed is an error.
    failure_count: usize,
}

impl ReportListener {
    /// Attaches `outcome` to the running test. Returns false if it was dropped.
    fn attach_outcome(&mut self, failure: &Failure, outcome: Outcome) -> bool {
        let Some(current) = self.current_case else {
            warn!(
                "dropping failure for {}.{}: no test is running",
                failure.description.class_name(),
                failure.description.method_name(),
            );
            return false;
        };

        let mut shared = self.shared.borrow_mut();
        let test_case = &mut shared.report.test_cases[current.index];
        match test_case.attach_outcome(outcome) {
            Ok(()) => true,
            Err(rejected) => {
                warn!(
                    "dropping {:?} for {}.{}: test already has an outcome",
                    rejected.kind(),
                    test_case.classname,
                    test_case.name,
                );
                false
            }
        }
    }
}

impl RunListener for ReportListener {
    fn test_run_started(&mut self, description: &Description) -> Result<(), RunListenerError> {
        debug!("run started with {} tests", description.test_count);
        if let Some(current) = self.current_case.take() {
            warn!(
                "run started while test #{} was still running; it will have no time",
                current.index
            );
        }
        self.failure_count = 0;
        self.shared
            .borrow_mut()
            .report
            .set_tests(description.test_count);
        Ok(())
    }

    fn test_started(&mut self, description: &Description) -> Result<(), RunListenerError> {
        if let Some(current) = self.current_case {
            warn!(
                "{}.{} started before test #{} finished",
                description.class_name(),
                description.method_name(),
                current.index,
            );
        }

        let index = self.shared.borrow_mut().report.add_test_case(TestCase::new(
            description.method_name(),
            description.class_name(),
        ));
        let timer = CaseTimer::start(&**self.clock);
        debug!(
            "started {}.{} at {}",
            description.class_name(),
            description.method_name(),
            timer.start_time(),
        );
        self.current_case = Some(CurrentCase { index, timer });
        Ok(())
    }

    fn test_ignored(&mut self, description: &Description) -> Result<(), RunListenerError> {
        debug!(
            "ignored {}.{}",
            description.class_name(),
            description.method_name()
        );
        self.shared
            .borrow_mut()
            .report
            .add_test_case(TestCase::skipped(
                description.method_name(),
                description.class_name(),
            ));
        Ok(())
    }

    fn test_assumption_failure(&mut self, failure: &Failure) -> Result<(), RunListenerError> {
        let outcome = Outcome::failure(failure.message.clone(), failure.trace.as_str());
        if self.attach_outcome(failure, outcome) {
            self.failure_count += 1;
        }
        Ok(())
    }

    fn test_failure(&mut self, failure: &Failure) -> Result<(), RunListenerError> {
        if failure.is_assertion() {
            return self.test_assumption_failure(failure);
        }

        let outcome = Outcome::error(failure.message.clone(), failure.trace.as_str());
        self.attach_outcome(failure, outcome);
        Ok(())
    }

    fn test_finished(&mut self, description: &Description) -> Result<(), RunListenerError> {
        let Some(current) = self.current_case.take() else {
            warn!(
                "ignoring finish of {}.{}: no test is running",
                description.class_name(),
                description.method_name(),
            );
            return Ok(());
        };

        let elapsed = current.timer.elapsed(&**self.clock);
        debug!(
            "finished {}.{} in {:?}",
            description.class_name(),
            description.method_name(),
            elapsed,
        );
        self.shared.borrow_mut().report.test_cases[current.index].set_time(elapsed);
        Ok(())
    }

    fn test_run_finished(&mut self, result: &RunResult) -> Result<(), RunListenerError> {
        let failures = self.failure_count;
        let summary = RunSummary {
            time: result.run_time,
            skipped: result.ignore_count,
            errors: result.failure_count.saturating_sub(failures),
            failures,
            timestamp: self.clock.now(),
        };
        debug!(
            "run finished: {} skipped, {} errors, {} failures",
            summary.skipped, summary.errors, summary.failures
        );

        let mut shared = self.shared.borrow_mut();
        shared.report.set_summary(summary);
        if let Some(path) = &shared.auto_save {
            info!("writing JUnit report to {path}");
            shared.save(path).map_err(RunListenerError::SaveReport)?;
        }

        self.failure_count = 0;
        Ok(())
    }
}
