//! Tests for sync, status, hash and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_sync() {
    let cli = parse(&["freshfetch", "sync"]);
    assert!(matches!(cli.command, CliCommand::Sync));
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = parse(&["freshfetch", "sync", "--config", "/etc/freshfetch.toml"]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/freshfetch.toml")));
}

#[test]
fn cli_parse_status() {
    assert!(matches!(parse(&["freshfetch", "status"]).command, CliCommand::Status));
}

#[test]
fn cli_parse_hash() {
    match parse(&["freshfetch", "hash", "/tmp/file.iso"]).command {
        CliCommand::Hash { path } => assert_eq!(path, Path::new("/tmp/file.iso")),
        _ => panic!("expected Hash"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["freshfetch", "download"]).is_err());
}
