//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// tokenlink - token-owned short links
#[derive(Parser, Debug)]
#[command(name = "tokenlink")]
#[command(version)]
#[command(about = "A small URL shortener with token-owned links", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration file, or write it to a path
    GenerateConfig {
        /// Output file path (default: stdout)
        output: Option<String>,
    },
}
