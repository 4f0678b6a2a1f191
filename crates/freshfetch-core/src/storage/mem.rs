//! In-memory `Storage` with fault injection, for tests and host-side dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{FileWrite, Storage};

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    fail_create: BTreeSet<PathBuf>,
    fail_rename: bool,
    /// Per-file size cap; writes past it fail like a full flash partition.
    capacity: Option<usize>,
}

impl MemState {
    fn add_ancestors(&mut self, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
        }
    }
}

/// Shared in-memory filesystem. Clones see the same files.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    inner: Arc<Mutex<MemState>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Put a file (and its parent directories) into the store.
    pub fn insert(&self, path: impl AsRef<Path>, data: &[u8]) {
        let path = path.as_ref();
        let mut st = self.state();
        st.add_ancestors(path);
        st.files.insert(path.to_path_buf(), data.to_vec());
    }

    /// Current content of a file, if present.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(path.as_ref()).cloned()
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }

    /// Make every `create` of `path` fail.
    pub fn fail_create(&self, path: impl AsRef<Path>) {
        self.state().fail_create.insert(path.as_ref().to_path_buf());
    }

    /// Make every `rename` fail.
    pub fn fail_rename(&self, fail: bool) {
        self.state().fail_rename = fail;
    }

    /// Limit how many bytes any single file may hold.
    pub fn set_capacity(&self, bytes: Option<usize>) {
        self.state().capacity = bytes;
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file", path.display()),
    )
}

struct MemFile {
    inner: Arc<Mutex<MemState>>,
    path: PathBuf,
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut st = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let capacity = st.capacity;
        let file = st
            .files
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;
        if let Some(cap) = capacity {
            if file.len() + buf.len() > cap {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
            }
        }
        file.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileWrite for MemFile {}

impl Storage for MemStorage {
    fn exists(&self, path: &Path) -> bool {
        let st = self.state();
        st.files.contains_key(path) || st.dirs.contains(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let data = self.read(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn FileWrite + '_>> {
        let mut st = self.state();
        if st.fail_create.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{}: create refused", path.display()),
            ));
        }
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && dir != Path::new("/") && !st.dirs.contains(dir) {
                return Err(not_found(dir));
            }
        }
        st.files.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemFile {
            inner: Arc::clone(&self.inner),
            path: path.to_path_buf(),
        }))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.state()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut st = self.state();
        if st.fail_rename {
            return Err(io::Error::new(io::ErrorKind::Other, "rename refused"));
        }
        let data = st.files.remove(from).ok_or_else(|| not_found(from))?;
        st.files.insert(to.to_path_buf(), data);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut st = self.state();
        st.add_ancestors(path);
        st.dirs.insert(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_parent_dir() {
        let store = MemStorage::new();
        assert!(store.create(Path::new("/www/a.json")).is_err());
        store.create_dir_all(Path::new("/www")).unwrap();
        assert!(store.create(Path::new("/www/a.json")).is_ok());
    }

    #[test]
    fn capacity_limits_writes() {
        let store = MemStorage::new();
        store.set_capacity(Some(4));
        let mut f = store.create(Path::new("/f")).unwrap();
        f.write_all(b"abcd").unwrap();
        assert!(f.write_all(b"e").is_err());
        drop(f);
        assert_eq!(store.read("/f").as_deref(), Some(&b"abcd"[..]));
    }

    #[test]
    fn clones_share_files() {
        let a = MemStorage::new();
        let b = a.clone();
        a.insert("/x", b"1");
        assert!(b.exists(Path::new("/x")));
        assert!(b.exists(Path::new("/")));
    }
}
