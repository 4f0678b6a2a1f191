//! Download into `<file>.tmp`, then swap it over the tracked file.
//!
//! The tracked path is only touched by the final remove + rename, so an
//! interrupted or failed transfer leaves the previous content in place.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::checksum::StreamHasher;
use crate::status::UpdateStatus;
use crate::storage::{self, FileWrite, Storage};
use crate::transport::{BodySink, Flow, Response, Transport, TransportError};

/// A completed, swapped-in download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub bytes: u64,
    /// SHA-256 of the full body as written.
    pub sha256: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("GET returned HTTP {0}")]
    Http(u32),
    #[error("transfer failed: {0}")]
    Transport(#[source] TransportError),
    #[error("transfer ended early: got {received} of {expected} bytes")]
    Truncated { expected: u64, received: u64 },
    #[error("{op} {}: {source}", .path.display())]
    Storage {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    fn storage(op: &'static str, path: &Path, source: io::Error) -> Self {
        DownloadError::Storage {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// The outcome this failure maps to.
    pub fn status(&self) -> UpdateStatus {
        match self {
            DownloadError::Storage { .. } => UpdateStatus::StorageError,
            DownloadError::Http(_) | DownloadError::Transport(_) | DownloadError::Truncated { .. } => {
                UpdateStatus::ServerError
            }
        }
    }
}

/// Streams a 200 body into the temp file. The temp file is only created once
/// the status is known to be 200.
struct TempFileSink<'a, S: Storage + ?Sized> {
    storage: &'a S,
    local_path: &'a Path,
    temp_path: &'a Path,
    file: Option<Box<dyn FileWrite + 'a>>,
    hasher: StreamHasher,
    written: u64,
    error: Option<DownloadError>,
}

impl<'a, S: Storage + ?Sized> TempFileSink<'a, S> {
    fn fail(&mut self, op: &'static str, path: &Path, e: io::Error) -> io::Error {
        let kind = e.kind();
        let msg = format!("{} {}: {}", op, path.display(), e);
        self.error = Some(DownloadError::storage(op, path, e));
        io::Error::new(kind, msg)
    }
}

impl<'a, S: Storage + ?Sized> BodySink for TempFileSink<'a, S> {
    fn begin(&mut self, response: &Response) -> io::Result<bool> {
        if !response.is_ok() {
            return Ok(false);
        }
        if let Err(e) = storage::ensure_parent_dir(self.storage, self.local_path) {
            let dir = self.local_path.parent().unwrap_or(self.local_path);
            return Err(self.fail("create directory", dir, e));
        }
        match self.storage.create(self.temp_path) {
            Ok(file) => {
                self.file = Some(file);
                Ok(true)
            }
            Err(e) => Err(self.fail("create", self.temp_path, e)),
        }
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<Flow> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Flow::Stop);
        };
        if let Err(e) = file.write_all(chunk) {
            return Err(self.fail("write", self.temp_path, e));
        }
        self.hasher.update(chunk);
        self.written += chunk.len() as u64;
        Ok(Flow::Continue)
    }
}

/// Remove a leftover temp file, logging instead of failing.
fn discard_temp<S: Storage + ?Sized>(storage: &S, temp_path: &Path) {
    if let Err(e) = storage::remove_if_exists(storage, temp_path) {
        tracing::warn!(path = %temp_path.display(), "failed to remove temp file: {}", e);
    }
}

/// GET `url` into `<local_path>.tmp` and, only if the whole body arrived,
/// swap it into place.
pub fn fetch_and_replace<T, S>(
    transport: &mut T,
    storage: &S,
    local_path: &Path,
    url: &str,
) -> Result<Downloaded, DownloadError>
where
    T: Transport + ?Sized,
    S: Storage + ?Sized,
{
    let temp_path = storage::temp_path(local_path);
    let mut sink = TempFileSink {
        storage,
        local_path,
        temp_path: &temp_path,
        file: None,
        hasher: StreamHasher::new(),
        written: 0,
        error: None,
    };

    let result = transport.get(url, &mut sink);
    let TempFileSink {
        file,
        hasher,
        written,
        error,
        ..
    } = sink;

    let response = match (error, result) {
        (Some(e), _) => {
            drop(file);
            discard_temp(storage, &temp_path);
            return Err(e);
        }
        (None, Err(e)) => {
            drop(file);
            discard_temp(storage, &temp_path);
            return Err(DownloadError::Transport(e));
        }
        (None, Ok(response)) => response,
    };

    if !response.is_ok() {
        drop(file);
        discard_temp(storage, &temp_path);
        return Err(DownloadError::Http(response.status));
    }

    let Some(mut file) = file else {
        // begin() accepted a 200 without creating the file; cannot happen with TempFileSink.
        return Err(DownloadError::storage(
            "create",
            &temp_path,
            io::Error::new(io::ErrorKind::Other, "temp file was never opened"),
        ));
    };
    if let Err(e) = file.flush().and_then(|()| file.sync()) {
        drop(file);
        discard_temp(storage, &temp_path);
        return Err(DownloadError::storage("sync", &temp_path, e));
    }
    drop(file);

    if let Some(expected) = response.content_length {
        if expected != written {
            discard_temp(storage, &temp_path);
            return Err(DownloadError::Truncated {
                expected,
                received: written,
            });
        }
    }

    if let Err(e) = storage::remove_if_exists(storage, local_path) {
        tracing::warn!(path = %local_path.display(), "could not remove old file before swap: {}", e);
    }
    if let Err(e) = storage.rename(&temp_path, local_path) {
        discard_temp(storage, &temp_path);
        return Err(DownloadError::storage("rename", &temp_path, e));
    }

    tracing::debug!(path = %local_path.display(), bytes = written, "temp file swapped into place");
    Ok(Downloaded {
        bytes: written,
        sha256: hasher.finish(),
    })
}
