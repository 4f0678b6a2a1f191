//! CLI command handlers, one per file.

mod check;
mod hash;
mod status;
mod sync;

pub use check::run_check;
pub use hash::run_hash;
pub use status::run_status;
pub use sync::run_sync;

use freshfetch_core::config::FreshfetchConfig;
use freshfetch_core::{CurlTransport, DiskStorage, SystemClock, Updater};

/// Updater wired to libcurl and the real filesystem, tuned from config.
pub(crate) fn build_updater(cfg: &FreshfetchConfig) -> Updater<CurlTransport, DiskStorage, SystemClock> {
    Updater::with_system_clock(CurlTransport::new(cfg.transport_options()), DiskStorage)
        .with_options(cfg.updater_options())
}
