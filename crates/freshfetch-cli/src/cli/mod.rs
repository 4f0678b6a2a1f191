//! CLI for the freshfetch conditional file updater.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use freshfetch_core::config;
use std::path::PathBuf;

use commands::{run_check, run_hash, run_status, run_sync};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "freshfetch")]
#[command(about = "Keep local files in sync with remote copies, downloading only when they change", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/freshfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check one file against its URL and download it if the remote is newer.
    Check {
        /// Local path of the file.
        path: PathBuf,
        /// Direct HTTP/HTTPS URL of the remote copy.
        url: String,
        /// Skip the check if the last one was more recent than this (e.g. "1 day", "12h", "1mo").
        #[arg(long, default_value = "", value_name = "DURATION")]
        max_age: String,
    },

    /// Check every file listed in the config, one after another.
    Sync,

    /// Show sidecar metadata and age-gate state for configured files.
    Status,

    /// Compute SHA-256 of a file.
    Hash {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Check { path, url, max_age } => run_check(&cfg, &path, &url, &max_age)?,
            CliCommand::Sync => run_sync(&cfg)?,
            CliCommand::Status => run_status(&cfg)?,
            CliCommand::Hash { path } => run_hash(&path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
