//! `freshfetch sync` – update every configured file, sequentially.

use anyhow::Result;
use freshfetch_core::config::FreshfetchConfig;

use super::build_updater;

pub fn run_sync(cfg: &FreshfetchConfig) -> Result<()> {
    if cfg.files.is_empty() {
        println!("No files configured.");
        return Ok(());
    }

    let mut updater = build_updater(cfg);
    let mut failed = 0usize;
    println!("{:<20} {}", "RESULT", "PATH");
    for f in &cfg.files {
        let status = updater.check_and_update(&f.path, &f.url, &f.max_age);
        println!("{:<20} {}", status, f.path.display());
        if status.is_error() {
            failed += 1;
            if let Some(reason) = updater.last_error() {
                eprintln!("  {}", reason);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, cfg.files.len());
    }
    Ok(())
}
