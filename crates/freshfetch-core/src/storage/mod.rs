//! Filesystem access for tracked files, sidecars and temp downloads.
//!
//! The updater never touches `std::fs` directly; it goes through [`Storage`]
//! so the same code runs against the real disk ([`DiskStorage`]) or an
//! in-memory store ([`MemStorage`]).

mod disk;
mod mem;

pub use disk::DiskStorage;
pub use mem::MemStorage;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Suffix of the temp file a download is streamed into before the swap.
pub const TEMP_SUFFIX: &str = ".tmp";

/// A file opened for writing by [`Storage::create`].
pub trait FileWrite: Write {
    /// Flush file data to durable storage. Called before the temp file is renamed.
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Minimal filesystem surface needed by the updater.
pub trait Storage {
    fn exists(&self, path: &Path) -> bool;

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Create `path` for writing, truncating any existing content.
    fn create(&self, path: &Path) -> io::Result<Box<dyn FileWrite + '_>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and all missing ancestors.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        (**self).open_read(path)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn FileWrite + '_>> {
        (**self).create(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }
}

/// Appends `suffix` to the full path (e.g. `www/tz.json` + `.meta` → `www/tz.json.meta`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut o = path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

/// Path of the temp download for `final_path` (e.g. `file.gz` → `file.gz.tmp`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    with_suffix(final_path, TEMP_SUFFIX)
}

/// Remove `path`, treating "already absent" as success.
pub fn remove_if_exists<S: Storage + ?Sized>(storage: &S, path: &Path) -> io::Result<()> {
    match storage.remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Make sure the directory that will hold `path` exists.
pub fn ensure_parent_dir<S: Storage + ?Sized>(storage: &S, path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !storage.exists(dir) => {
            tracing::debug!(dir = %dir.display(), "creating parent directory");
            storage.create_dir_all(dir)
        }
        _ => Ok(()),
    }
}

/// Write `data` to `path` through a sibling temp file, so readers see either
/// the old content or the new content, never a partial write.
pub fn replace_contents<S: Storage + ?Sized>(
    storage: &S,
    path: &Path,
    data: &[u8],
) -> io::Result<()> {
    let tmp = temp_path(path);
    let written = (|| {
        let mut file = storage.create(&tmp)?;
        file.write_all(data)?;
        file.sync()
    })();
    if let Err(e) = written {
        let _ = remove_if_exists(storage, &tmp);
        return Err(e);
    }
    remove_if_exists(storage, path)?;
    storage.rename(&tmp, path).inspect_err(|_| {
        let _ = remove_if_exists(storage, &tmp);
    })
}
