//! `tagfeed` command-line entry point.
//!
//! # Responsibility
//! - Give an external scheduler (cron, systemd timer) one command per
//!   ingestion cycle.
//! - Offer small admin and inspection commands over the same database.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::run(cli.command)
}
