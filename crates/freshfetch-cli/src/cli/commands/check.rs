//! `freshfetch check` – update a single file.

use anyhow::Result;
use freshfetch_core::config::{self, FreshfetchConfig};
use std::path::Path;

use super::build_updater;

pub fn run_check(cfg: &FreshfetchConfig, path: &Path, url: &str, max_age: &str) -> Result<()> {
    config::validate_url(url)?;
    let mut updater = build_updater(cfg);
    let status = updater.check_and_update(path, url, max_age);
    println!("{}  {}", status, path.display());
    if status.is_error() {
        match updater.last_error() {
            Some(reason) => anyhow::bail!("{}: {}", status, reason),
            None => anyhow::bail!("{}", status),
        }
    }
    Ok(())
}
