// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    builder::XmlReportBuilder, config::BuilderConfig, notifier::RunNotifier,
    output::OutputOpts, replay::EventReplayer, time::ManualClock,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use junit_report::XmlEncoding;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
};
use tracing::{info, warn};

/// Replays a recorded test run and writes its JUnit XML report.
///
/// EVENTS is a JSON-lines file with one lifecycle event per line, or `-` to read standard
/// input. Configuration is read from the optional config file and from `JUNIT_REPORT_*`
/// environment variables; flags override both.
#[derive(Debug, Parser)]
#[command(version, name = "junit-replay")]
pub struct ReplayApp {
    /// Recorded events (JSON lines), or `-` for standard input
    #[arg(value_name = "EVENTS")]
    events: Utf8PathBuf,

    /// Config file
    #[arg(long, value_name = "PATH", env = "JUNIT_REPORT_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Write the report to this file instead of standard output
    #[arg(long, short, value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    /// Start every element on a new line
    #[arg(long)]
    line_breaks: bool,

    /// Character encoding of the report [default: UTF-8]
    #[arg(long, value_name = "ENC")]
    encoding: Option<XmlEncoding>,

    /// Add a property resolved from the environment (may be repeated)
    #[arg(long = "property", short = 'p', value_name = "KEY")]
    properties: Vec<String>,

    #[command(flatten)]
    output_opts: OutputOpts,
}

impl ReplayApp {
    /// Executes the app. Without `--output`, the report is written to `stdout`.
    pub fn exec(self, stdout: impl Write) -> Result<()> {
        self.output_opts.init()?;

        let config = self.make_config()?;
        let clock = ManualClock::new(chrono::Local::now().fixed_offset());
        let mut notifier = RunNotifier::new();
        let mut builder = XmlReportBuilder::builder()
            .clock(clock.clone())
            .apply_config(&config)
            .build(&mut notifier);
        if let Some(output) = &config.output {
            builder.set_auto_save(output.clone());
        }

        let events = read_events(&self.events)?;
        let count = EventReplayer::new(&mut notifier, clock)
            .replay(events, &self.events)
            .wrap_err("failed to replay events")?;
        info!("replayed {count} events from {}", self.events);

        let run_finished = builder.report().summary.is_some();
        match &config.output {
            // The report was written when the run finished.
            Some(_) if run_finished => {}
            Some(output) => {
                warn!("event log ended before the run finished; writing a partial report");
                builder
                    .write_to_file(output)
                    .wrap_err("failed to write report")?;
            }
            None => {
                if !run_finished {
                    warn!("event log ended before the run finished; writing a partial report");
                }
                builder
                    .serialize_with(stdout, &config.serialize_options)
                    .wrap_err("failed to write report to standard output")?;
            }
        }
        Ok(())
    }

    fn make_config(&self) -> Result<BuilderConfig> {
        let mut config =
            BuilderConfig::load(self.config.as_deref()).wrap_err("failed to load config")?;

        config.properties.extend(self.properties.iter().cloned());
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if self.line_breaks {
            config.serialize_options.set_insert_line_breaks(true);
        }
        if let Some(encoding) = self.encoding {
            config.serialize_options.set_encoding(encoding);
        }
        Ok(config)
    }
}

fn read_events(path: &Utf8Path) -> Result<Box<dyn BufRead>> {
    if path.as_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let f = File::open(path).wrap_err_with(|| format!("failed to open event log {path}"))?;
    Ok(Box::new(BufReader::new(f)))
}
