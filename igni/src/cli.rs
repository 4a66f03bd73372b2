//! Command-line surface, in the spirit of `av1an-cli`'s `CliOpts`: a derive
//! struct with doc-comment-derived `--help` text and sensible defaults,
//! updated to `clap`'s 4.x attribute syntax.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "igni", version, about = "Declarative video service", long_about = None)]
pub struct CliOpts {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server.
    Server {
        /// Path to a TOML configuration file. Missing fields fall back to
        /// built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides `Configuration::address`.
        #[arg(long)]
        address: Option<String>,

        /// Overrides `Configuration::port`.
        #[arg(long)]
        port: Option<u16>,

        /// Console log verbosity.
        #[arg(long, default_value = "info")]
        log_level: LevelFilter,

        /// Rolling log file path.
        #[arg(long, default_value = "igni.log")]
        log_file: PathBuf,
    },
}
