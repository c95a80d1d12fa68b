// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{ArgAction, Args};
use color_eyre::eyre::{Result, WrapErr};
use std::sync::Once;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// The environment variable that sets log filters, in `tracing-subscriber` target syntax.
pub const LOG_ENV: &str = "JUNIT_REPORT_LOG";

static INIT_LOGGER: Once = Once::new();

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Verbose output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
}

impl OutputOpts {
    /// Installs the stderr log subscriber. Only the first call in a process has any effect.
    ///
    /// `JUNIT_REPORT_LOG` wins if it is set; otherwise the level is `info`, or `debug` with
    /// `-v`.
    pub(crate) fn init(self) -> Result<()> {
        let level_str = std::env::var(LOG_ENV).unwrap_or_default();

        let targets = if level_str.is_empty() {
            let level = if self.verbose > 0 {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            Targets::new().with_default(level)
        } else {
            level_str
                .parse()
                .wrap_err_with(|| format!("unable to parse {LOG_ENV}"))?
        };

        INIT_LOGGER.call_once(|| {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(targets);

            // A subscriber set up by an embedding process takes precedence.
            let _ = tracing_subscriber::registry().with(layer).try_init();
        });
        Ok(())
    }
}
