//! `freshfetch status` – show what the sidecars say about configured files.

use anyhow::Result;
use freshfetch_core::config::FreshfetchConfig;
use freshfetch_core::max_age::{self, MaxAge};
use freshfetch_core::meta;
use freshfetch_core::{Clock, DiskStorage, Storage, SystemClock};

pub fn run_status(cfg: &FreshfetchConfig) -> Result<()> {
    if cfg.files.is_empty() {
        println!("No files configured.");
        return Ok(());
    }

    let now = SystemClock.now();
    println!(
        "{:<8} {:<6} {:<32} {:<16} {}",
        "PRESENT", "GATED", "VALIDATOR", "HASH", "PATH"
    );
    for f in &cfg.files {
        let record = meta::read(&DiskStorage, &f.path);
        let gated = max_age::should_skip(
            record.recorded_time(),
            MaxAge::parse(&f.max_age).ok().flatten(),
            now,
        );
        let validator = if record.validator.is_empty() {
            "-"
        } else {
            record.validator.as_str()
        };
        let hash = if record.hash.is_empty() {
            "-"
        } else {
            record.hash.get(..16).unwrap_or(&record.hash)
        };
        println!(
            "{:<8} {:<6} {:<32} {:<16} {}",
            if DiskStorage.exists(&f.path) { "yes" } else { "no" },
            if gated { "yes" } else { "no" },
            validator,
            hash,
            f.path.display()
        );
    }
    Ok(())
}
