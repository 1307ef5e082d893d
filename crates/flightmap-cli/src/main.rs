// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::Parser;
use flightmap_core::config::MapConfig;
use flightmap_core::FlightMap;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the built-in map configuration, such as
    /// `data/map.json`. Built-in paths resolve against the working directory
    #[arg(short, long, env = "FLIGHTMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Pre-covid route table (semicolon separated)
    #[arg(long)]
    pre_covid: Option<PathBuf>,

    /// Current route table (semicolon separated)
    #[arg(long)]
    current: Option<PathBuf>,

    /// Airport table (comma separated)
    #[arg(long)]
    airports: Option<PathBuf>,

    /// Output PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip writing the joined CSV files
    #[arg(long)]
    no_export: bool,

    /// Open the rendered map in the system image viewer
    #[arg(long)]
    open: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    fn map_config(&self) -> Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => MapConfig::default(),
        };

        let sources = &mut config.sources;
        if let Some(path) = &self.pre_covid {
            sources.pre_covid = path.clone();
        }
        if let Some(path) = &self.current {
            sources.current = path.clone();
        }
        if let Some(path) = &self.airports {
            sources.airports = path.clone();
        }
        if let Some(path) = &self.output {
            sources.output = path.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    TermLogger::init(
        cli.log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialise logging")?;

    let config = cli.map_config()?;
    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let map = FlightMap::new(config);
    let report = map.run(!cli.no_export).context("Map generation failed")?;

    for summary in &report.datasets {
        print!(
            "{:<10} {:>4} routes, {:>4} plotted, {:>4} without airport",
            summary.dataset.name(),
            summary.loaded,
            summary.joined,
            summary.dropped
        );
        match &summary.longest {
            Some((code, km)) => println!(", longest {} ({:.0} km)", code, km),
            None => println!(),
        }
    }
    for path in &report.exports {
        println!("Exported {}", path.display());
    }
    println!("Map saved to {}", report.image.display());

    if cli.open {
        open::that(&report.image)
            .with_context(|| format!("Failed to open {:?}", report.image))?;
    }

    Ok(())
}
