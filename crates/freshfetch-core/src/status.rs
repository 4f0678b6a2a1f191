//! Outcome of one `check_and_update` call.

use std::fmt;

/// Exactly one of these is returned per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    /// New content was downloaded and swapped into place.
    Updated,
    /// The sidecar is younger than the requested max age; nothing was checked.
    MaxAgeNotReached,
    /// The remote copy is the same as the local one.
    NotModified,
    /// Transport failure, or a GET that did not return 200.
    ServerError,
    /// The server answered 404.
    FileNotFound,
    /// The local store could not be written.
    StorageError,
}

impl UpdateStatus {
    /// True for the outcomes that indicate a failure rather than a decision.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            UpdateStatus::ServerError | UpdateStatus::FileNotFound | UpdateStatus::StorageError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStatus::Updated => "updated",
            UpdateStatus::MaxAgeNotReached => "max-age-not-reached",
            UpdateStatus::NotModified => "not-modified",
            UpdateStatus::ServerError => "server-error",
            UpdateStatus::FileNotFound => "file-not-found",
            UpdateStatus::StorageError => "storage-error",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
