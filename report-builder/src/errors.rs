// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the report builder.

use camino::Utf8PathBuf;
use junit_report::{SerializeError, UnknownEncodingError};
use std::io;
use thiserror::Error;

/// An error returned by a [`RunListener`](crate::listener::RunListener) callback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunListenerError {
    /// The report could not be saved at the end of the run.
    #[error("report builder failed to save report")]
    SaveReport(#[source] SaveReportError),
}

/// An error that occurred while writing a report to a file.
#[derive(Debug, Error)]
pub enum SaveReportError {
    /// The report file (or its parent directory) could not be created.
    #[error("error creating report file {path}")]
    Create {
        /// The report file.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// The report could not be written out.
    #[error("error writing JUnit report to {path}")]
    Serialize {
        /// The report file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: SerializeError,
    },
}

impl SaveReportError {
    /// Returns the path that couldn't be written.
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            SaveReportError::Create { path, .. } | SaveReportError::Serialize { path, .. } => path,
        }
    }
}

/// An error that occurred while loading [`BuilderConfig`](crate::config::BuilderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be merged.
    #[error("failed to read report builder config{}", display_source(.config_file.as_ref()))]
    Build {
        /// The user config file, if one was supplied.
        config_file: Option<Utf8PathBuf>,

        /// The underlying error.
        #[source]
        error: config::ConfigError,
    },

    /// The merged configuration did not have the expected shape.
    #[error(
        "invalid report builder config at `{}`{}",
        .error.path(),
        display_source(.config_file.as_ref())
    )]
    Deserialize {
        /// The user config file, if one was supplied.
        config_file: Option<Utf8PathBuf>,

        /// The underlying error, with the path of the offending key.
        #[source]
        error: serde_path_to_error::Error<config::ConfigError>,
    },

    /// The configured encoding isn't supported.
    #[error("invalid `encoding` in report builder config")]
    Encoding(#[source] UnknownEncodingError),
}

fn display_source(config_file: Option<&Utf8PathBuf>) -> String {
    match config_file {
        Some(config_file) => format!(" (from {config_file})"),
        None => String::new(),
    }
}

/// An error that occurred while replaying a recorded event log.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The event log could not be read.
    #[error("error reading event log {path}")]
    Read {
        /// The event log, or `-` for standard input.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// A line of the event log was not a valid event.
    #[error("invalid event at {path}:{line}")]
    Parse {
        /// The event log, or `-` for standard input.
        path: Utf8PathBuf,

        /// The 1-based line number.
        line: usize,

        /// The underlying JSON error.
        #[source]
        error: serde_json::Error,
    },

    /// A listener rejected an event.
    #[error("error handling event at {path}:{line}")]
    Listener {
        /// The event log, or `-` for standard input.
        path: Utf8PathBuf,

        /// The 1-based line number.
        line: usize,

        /// The underlying error.
        #[source]
        error: RunListenerError,
    },
}
