//! Tests for the check subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_check() {
    match parse(&["freshfetch", "check", "/www/tz.json.gz", "https://example.com/tz.json.gz"]).command {
        CliCommand::Check { path, url, max_age } => {
            assert_eq!(path, Path::new("/www/tz.json.gz"));
            assert_eq!(url, "https://example.com/tz.json.gz");
            assert_eq!(max_age, "");
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_check_max_age() {
    match parse(&[
        "freshfetch",
        "check",
        "a.bin",
        "http://example.com/a.bin",
        "--max-age",
        "1 day",
    ])
    .command
    {
        CliCommand::Check { max_age, .. } => assert_eq!(max_age, "1 day"),
        _ => panic!("expected Check with --max-age"),
    }
}

#[test]
fn cli_parse_check_requires_url() {
    assert!(Cli::try_parse_from(["freshfetch", "check", "a.bin"]).is_err());
}
