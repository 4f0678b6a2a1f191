//! Top-level `check_and_update`: age gate, HEAD probe, freshness decision,
//! atomic download and sidecar refresh.
//!
//! Calls are blocking and run to completion. Nothing is locked: callers must
//! not run two updates for the same local path at the same time.

pub mod download;

use std::path::Path;

use crate::checksum::DEFAULT_STREAM_CAP;
use crate::clock::{Clock, SystemClock};
use crate::max_age::{self, MaxAge};
use crate::meta::{self, SidecarRecord};
use crate::resolver::{self, ResolveInput};
use crate::status::UpdateStatus;
use crate::storage::Storage;
use crate::transport::Transport;

pub use download::{DownloadError, Downloaded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdaterOptions {
    /// How much of a remote body is hashed when the server sends no `Last-Modified`.
    pub hash_cap_bytes: u64,
}

impl Default for UpdaterOptions {
    fn default() -> Self {
        Self {
            hash_cap_bytes: DEFAULT_STREAM_CAP,
        }
    }
}

/// Keeps one tracked file in sync with its remote copy.
///
/// Transport, storage and clock are injected; the updater holds no state
/// between calls other than the last error message.
pub struct Updater<T, S, C = SystemClock> {
    transport: T,
    storage: S,
    clock: C,
    options: UpdaterOptions,
    last_error: Option<String>,
}

impl<T: Transport, S: Storage> Updater<T, S, SystemClock> {
    pub fn with_system_clock(transport: T, storage: S) -> Self {
        Self::new(transport, storage, SystemClock)
    }
}

impl<T: Transport, S: Storage, C: Clock> Updater<T, S, C> {
    pub fn new(transport: T, storage: S, clock: C) -> Self {
        Self {
            transport,
            storage,
            clock,
            options: UpdaterOptions::default(),
            last_error: None,
        }
    }

    pub fn with_options(mut self, options: UpdaterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Description of what went wrong in the last call, if anything did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bring `local_path` up to date with `remote_url`.
    ///
    /// `max_age` (e.g. `"1 day"`, `"12h"`) skips the check entirely while the
    /// sidecar is younger than that; an empty string always checks.
    pub fn check_and_update(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_url: &str,
        max_age: &str,
    ) -> UpdateStatus {
        let local_path = local_path.as_ref();
        self.last_error = None;
        let max_age = parse_max_age(max_age);
        let status = self.run(local_path, remote_url, max_age);
        tracing::info!(path = %local_path.display(), url = remote_url, %status, "check finished");
        status
    }

    fn run(&mut self, local_path: &Path, url: &str, max_age: Option<MaxAge>) -> UpdateStatus {
        let stored = meta::read(&self.storage, local_path);

        if let Some(age) = max_age {
            let now = self.clock.now();
            let recorded = stored.recorded_time();
            if max_age::should_skip(recorded, Some(age), now) {
                tracing::info!(path = %local_path.display(), max_age = %age, "max age not reached, skipping");
                return UpdateStatus::MaxAgeNotReached;
            }
            tracing::debug!(now, sidecar_time = ?recorded, max_age = %age, "max age elapsed");
        }

        tracing::info!(path = %local_path.display(), url, "checking remote");
        let head = match self.transport.head(url) {
            Ok(r) if r.status > 0 => r,
            Ok(r) => return self.fail(UpdateStatus::ServerError, format!("HEAD {}: no status ({})", url, r.status)),
            Err(e) => return self.fail(UpdateStatus::ServerError, format!("HEAD {}: {}", url, e)),
        };
        if head.is_not_found() {
            return self.fail(UpdateStatus::FileNotFound, format!("HEAD {}: HTTP 404", url));
        }

        let input = ResolveInput {
            local_path,
            remote_url: url,
            local_exists: self.storage.exists(local_path),
            stored_validator: &stored.validator,
            remote_last_modified: head.last_modified.as_deref(),
        };
        let resolution = resolver::resolve(
            &mut self.transport,
            &self.storage,
            &self.clock,
            &input,
            self.options.hash_cap_bytes,
        );
        if resolution.status != UpdateStatus::Updated {
            if let Some(e) = resolution.error {
                return self.fail(resolution.status, e);
            }
            return resolution.status;
        }

        tracing::info!(path = %local_path.display(), "remote is newer, downloading");
        let downloaded = match download::fetch_and_replace(&mut self.transport, &self.storage, local_path, url) {
            Ok(d) => d,
            Err(e) => return self.fail(e.status(), format!("download {}: {}", url, e)),
        };
        if let Some(prefix) = &resolution.remote_hash {
            tracing::debug!(prefix_hash = %prefix, full_hash = %downloaded.sha256, "downloaded content hashed");
        }

        let validator = resolution
            .new_validator
            .unwrap_or_else(|| self.clock.now().to_string());
        let record = SidecarRecord::new(validator, downloaded.sha256);
        if let Err(e) = meta::write(&self.storage, local_path, &record) {
            // Content is already live; report but keep the outcome.
            tracing::warn!(path = %local_path.display(), "sidecar write failed: {}", e);
            self.last_error = Some(format!("sidecar write for {}: {}", local_path.display(), e));
        }
        tracing::info!(path = %local_path.display(), bytes = downloaded.bytes, "update complete");
        UpdateStatus::Updated
    }

    fn fail(&mut self, status: UpdateStatus, message: String) -> UpdateStatus {
        tracing::warn!(%status, "{}", message);
        self.last_error = Some(message);
        status
    }
}

/// Parse once at the boundary; anything unusable disables the gate.
fn parse_max_age(input: &str) -> Option<MaxAge> {
    match MaxAge::parse(input) {
        Ok(age) => age,
        Err(e) => {
            tracing::warn!("{}; checking on every call", e);
            None
        }
    }
}
