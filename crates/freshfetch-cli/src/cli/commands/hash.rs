//! `freshfetch hash` – compute SHA-256 of a file.

use anyhow::Result;
use freshfetch_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file.
pub fn run_hash(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
