use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dupscan::cli::Cli;
use dupscan::config::Config;
use dupscan::{find_duplicates, report, ScanOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;
    let opts = ScanOptions::from_args_and_config(&cli.scan, &config)?;

    let dirs: Vec<PathBuf> = if cli.scan.dirs.is_empty() {
        vec![std::env::current_dir().context("resolving current directory")?]
    } else {
        cli.scan.dirs.clone()
    };

    eprintln!("Searching for duplicate files in {:?}", dirs);
    let report = find_duplicates(&dirs, &opts)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        report::write_json(&mut out, &report).context("writing JSON report")?;
    } else {
        report::write_text(&mut out, &report).context("writing report")?;
    }
    eprintln!("{}", report::summary(&report));

    Ok(())
}

/// RUST_LOG wins; otherwise -q/-v pick the level.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dupscan={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
