//! Command-line driver for the genotype bitmap encoder.
//!
//! Loads variant and file metadata documents, encodes the per-file sample
//! documents of the selected variants and writes both the unencoded and the
//! encoded documents together with a per-chromosome report.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{run_cli, Cli};
use log::{error, info};

fn main() -> Result<()> {
    // Initialize logging (level via RUST_LOG)
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting with arguments: {:?}", cli);

    if let Err(e) = run_cli(cli) {
        error!("{:#}", e);
        return Err(e);
    }

    info!("Finished successfully.");
    Ok(())
}
