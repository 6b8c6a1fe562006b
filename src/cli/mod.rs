//! CLI interface for ticker-dash
//!
//! Provides subcommands for:
//! - `run`: Stream tickers and print dashboard snapshots
//! - `symbols`: List the tracked symbol catalog
//! - `currencies`: List display currencies and their rates
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ticker-dash")]
#[command(about = "Real-time crypto ticker aggregator with fiat conversion")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream tickers and print dashboard snapshots
    Run(RunArgs),
    /// List tracked symbols
    Symbols,
    /// List display currencies and rates
    Currencies,
    /// Show effective configuration
    Config,
}
