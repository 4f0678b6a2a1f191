//! Freshness decision: is the remote copy newer than the local one?
//!
//! Priority order:
//! 1. no local file: update;
//! 2. no `Last-Modified` from the server: GET the body, hash it (capped) and
//!    compare with the full local hash. A match refreshes the sidecar with the
//!    current time so the age gate can rate-limit the next check;
//! 3. `Last-Modified` differs from the stored validator: update;
//! 4. otherwise: not modified.

use std::io;
use std::path::Path;

use crate::checksum::{self, StreamHasher};
use crate::clock::Clock;
use crate::meta::{self, SidecarRecord};
use crate::status::UpdateStatus;
use crate::storage::Storage;
use crate::transport::{BodySink, Flow, Response, Transport};

/// What the resolver knows about one tracked file.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub local_path: &'a Path,
    pub remote_url: &'a str,
    pub local_exists: bool,
    /// Validator from the sidecar (empty if none).
    pub stored_validator: &'a str,
    /// `Last-Modified` from the HEAD response.
    pub remote_last_modified: Option<&'a str>,
}

/// Decision plus whatever the caller needs to persist after a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: UpdateStatus,
    /// Validator to record once the download has succeeded.
    pub new_validator: Option<String>,
    /// Capped hash of the remote body, when the hash fallback ran.
    pub remote_hash: Option<String>,
    /// Why the decision failed, for `ServerError`.
    pub error: Option<String>,
}

impl Resolution {
    fn new(status: UpdateStatus) -> Self {
        Self {
            status,
            new_validator: None,
            remote_hash: None,
            error: None,
        }
    }

    fn updated(new_validator: Option<String>) -> Self {
        Self {
            new_validator,
            ..Self::new(UpdateStatus::Updated)
        }
    }

    fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(UpdateStatus::ServerError)
        }
    }
}

/// Decide whether `input.local_path` needs to be downloaded again.
pub fn resolve<T, S, C>(
    transport: &mut T,
    storage: &S,
    clock: &C,
    input: &ResolveInput<'_>,
    hash_cap: u64,
) -> Resolution
where
    T: Transport + ?Sized,
    S: Storage + ?Sized,
    C: Clock + ?Sized,
{
    let remote_lm = input.remote_last_modified.filter(|v| !v.is_empty());

    if !input.local_exists {
        tracing::info!(path = %input.local_path.display(), "local file missing, will download");
        return Resolution::updated(remote_lm.map(str::to_string));
    }

    let Some(remote_lm) = remote_lm else {
        return compare_hashes(transport, storage, clock, input, hash_cap);
    };

    if remote_lm != input.stored_validator {
        tracing::info!(
            path = %input.local_path.display(),
            stored = %input.stored_validator,
            remote = %remote_lm,
            "Last-Modified changed"
        );
        return Resolution::updated(Some(remote_lm.to_string()));
    }

    Resolution::new(UpdateStatus::NotModified)
}

/// Fallback when the server offers no validator.
fn compare_hashes<T, S, C>(
    transport: &mut T,
    storage: &S,
    clock: &C,
    input: &ResolveInput<'_>,
    hash_cap: u64,
) -> Resolution
where
    T: Transport + ?Sized,
    S: Storage + ?Sized,
    C: Clock + ?Sized,
{
    tracing::info!(
        path = %input.local_path.display(),
        "no Last-Modified header, comparing content hashes"
    );

    let mut sink = HashSink {
        hasher: StreamHasher::with_limit(hash_cap),
    };
    let response = match transport.get(input.remote_url, &mut sink) {
        Ok(r) => r,
        Err(e) => return Resolution::failed(format!("GET {} for hashing: {}", input.remote_url, e)),
    };
    if !response.is_ok() {
        return Resolution::failed(format!(
            "GET {} for hashing returned HTTP {}",
            input.remote_url, response.status
        ));
    }
    let remote_hash = sink.hasher.finish();

    let local_hash = match checksum::sha256_file(storage, input.local_path) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(path = %input.local_path.display(), "cannot hash local file: {}", e);
            return Resolution {
                remote_hash: Some(remote_hash),
                ..Resolution::updated(None)
            };
        }
    };

    tracing::debug!(local = %local_hash, remote = %remote_hash, "SHA-256 comparison");

    if local_hash != remote_hash {
        return Resolution {
            remote_hash: Some(remote_hash),
            ..Resolution::updated(None)
        };
    }

    let record = SidecarRecord::new(clock.now().to_string(), local_hash);
    match meta::write(storage, input.local_path, &record) {
        Ok(()) => tracing::info!(
            path = %input.local_path.display(),
            "hashes match, sidecar time refreshed"
        ),
        Err(e) => tracing::warn!(
            path = %input.local_path.display(),
            "hashes match but sidecar write failed: {}",
            e
        ),
    }
    Resolution {
        remote_hash: Some(remote_hash),
        ..Resolution::new(UpdateStatus::NotModified)
    }
}

/// Feeds a 200 body into a capped hasher and stops once the cap is hit.
struct HashSink {
    hasher: StreamHasher,
}

impl BodySink for HashSink {
    fn begin(&mut self, response: &Response) -> io::Result<bool> {
        Ok(response.is_ok())
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<Flow> {
        Ok(if self.hasher.update(chunk) {
            Flow::Continue
        } else {
            Flow::Stop
        })
    }
}
