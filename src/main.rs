use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bnf_cropland::{pipeline, BnfError, Config};

/// Estimate biological nitrogen fixation on cropland from FAOSTAT production data.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the FAOSTAT and reference CSV files.
    #[arg(long)]
    indata_dir: Option<PathBuf>,

    /// Directory to create for the results. Must not exist yet.
    #[arg(long)]
    outdata_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = cli.indata_dir {
        config.indata_dir = dir;
    }
    if let Some(dir) = cli.outdata_dir {
        config.outdata_dir = dir;
    }

    match pipeline::run(&config) {
        Ok(summary) => {
            info!(files = summary.written.len(), "Done");
            Ok(())
        }
        Err(e @ BnfError::OutputConflict(_)) => {
            error!("{e}");
            std::process::exit(1);
        }
        Err(e) => Err(e).context("estimation failed"),
    }
}
