//! File access capability for kernel text interfaces.
//!
//! Every parser and state in this crate reads `/proc` and `/sys` through a
//! [`FileSource`]. Production code uses [`OsFileSource`]; tests and dry runs
//! use [`MemoryFileSource`], an in-memory tree of fixture files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of a filesystem.
pub trait FileSource: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

impl<T: FileSource + ?Sized> FileSource for &T {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

impl<T: FileSource + ?Sized> FileSource for Arc<T> {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

/// Filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSource;

impl OsFileSource {
    pub fn new() -> Self {
        Self
    }
}

impl FileSource for OsFileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }
}

/// In-memory filesystem for fixtures.
///
/// Parent directories are registered automatically when a file is added,
/// so `read_dir` on `/sys/class/net` lists every interface that has at least
/// one file below it.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSource {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MemoryFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.register_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Builder form of [`MemoryFileSource::add_file`].
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Removes a file; reads of it fail with `NotFound` afterwards.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    fn register_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSource for MemoryFileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }
        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        let mut entries: Vec<PathBuf> = entries.into_iter().collect();
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_read_and_exists() {
        let fs = MemoryFileSource::new().with_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")));
        assert!(fs.exists(Path::new("/proc")));
        assert_eq!(
            fs.read_to_string(Path::new("/proc/meminfo")).unwrap(),
            "MemTotal: 16384 kB\n"
        );
    }

    #[test]
    fn test_memory_source_missing_file() {
        let fs = MemoryFileSource::new();
        let err = fs.read_to_string(Path::new("/proc/stat")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_source_read_dir_lists_children() {
        let mut fs = MemoryFileSource::new();
        fs.add_file("/sys/class/net/eth0/mtu", "1500");
        fs.add_file("/sys/class/net/lo/mtu", "65536");

        let entries = fs.read_dir(Path::new("/sys/class/net")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/sys/class/net/eth0"),
                PathBuf::from("/sys/class/net/lo")
            ]
        );
    }

    #[test]
    fn test_remove_file() {
        let mut fs = MemoryFileSource::new().with_file("/a/b", "x");
        fs.remove_file("/a/b");
        assert!(fs.read_to_string(Path::new("/a/b")).is_err());
    }

    #[test]
    fn test_os_source_reads_tempfile() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("stat");
        std::fs::write(&path, "btime 1\n").expect("Failed to write file");

        let fs = OsFileSource::new();
        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "btime 1\n");
        assert_eq!(fs.read_dir(dir.path()).unwrap(), vec![path]);
    }
}
