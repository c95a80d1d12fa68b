// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use report_builder::ReplayApp;

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = ReplayApp::parse();
    app.exec(std::io::stdout().lock())
}
