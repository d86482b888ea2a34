//! Command line entry points
//!
//! - `serve`: run the HTTP API (default)
//! - `migrate`: apply pending database migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// SayItRight - email refinement API
#[derive(Parser)]
#[command(name = "sayitright-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending PostgreSQL migrations
    Migrate,
}
