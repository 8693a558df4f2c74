//! memfile CLI — smoke-test harness for the paged swap-file subsystem.

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    env_logger::init();
    let cli = cli::Cli::parse();
    cli::run(cli)
}
