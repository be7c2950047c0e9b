//! File-system capability used to resolve paths to byte streams.
//!
//! [`PhysicalFileSystem`] goes to disk. [`MemoryFileSystem`] keeps files in a
//! shared in-memory table and is what the tests run against.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Message carried by the not-found error of every implementation.
pub const FILE_NOT_FOUND_MESSAGE: &str = "Unable to find the specified file.";

/// Resolves paths to file handles.
pub trait FileSystem {
    fn file(&self, path: &Path) -> Box<dyn FileHandle>;
}

/// A path resolved by a [`FileSystem`]. The file need not exist.
pub trait FileHandle {
    fn path(&self) -> &Path;

    fn exists(&self) -> bool;

    /// Opens the file for reading. Missing files fail with
    /// [`io::ErrorKind::NotFound`] and [`FILE_NOT_FOUND_MESSAGE`].
    fn open_read(&self) -> io::Result<Box<dyn Read>>;

    /// Opens the file for writing, truncating any existing content.
    fn open_write(&self) -> io::Result<Box<dyn Write>>;
}

fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, FILE_NOT_FOUND_MESSAGE)
}

// === Physical ===

/// Direct access to the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalFileSystem;

impl FileSystem for PhysicalFileSystem {
    fn file(&self, path: &Path) -> Box<dyn FileHandle> {
        Box::new(PhysicalFile {
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug)]
struct PhysicalFile {
    path: PathBuf,
}

impl FileHandle for PhysicalFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn open_read(&self) -> io::Result<Box<dyn Read>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(err) => Err(err),
        }
    }

    fn open_write(&self) -> io::Result<Box<dyn Write>> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(BufWriter::new(File::create(&self.path)?)))
    }
}

// === In-memory ===

type FileTable = Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>;

/// A virtual file system. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: FileTable,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a file.
    pub fn create_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        if let Ok(mut files) = lock(&self.files) {
            files.insert(path.as_ref().to_path_buf(), content.as_ref().to_vec());
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        lock(&self.files).is_ok_and(|files| files.contains_key(path.as_ref()))
    }

    pub fn read(&self, path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
        lock(&self.files)?
            .get(path.as_ref())
            .cloned()
            .ok_or_else(not_found)
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> io::Result<String> {
        String::from_utf8(self.read(path)?)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.files)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl FileSystem for MemoryFileSystem {
    fn file(&self, path: &Path) -> Box<dyn FileHandle> {
        Box::new(MemoryFile {
            path: path.to_path_buf(),
            files: Arc::clone(&self.files),
        })
    }
}

fn lock(files: &FileTable) -> io::Result<MutexGuard<'_, BTreeMap<PathBuf, Vec<u8>>>> {
    files
        .lock()
        .map_err(|_| io::Error::other("in-memory file table lock poisoned"))
}

struct MemoryFile {
    path: PathBuf,
    files: FileTable,
}

impl FileHandle for MemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        lock(&self.files).is_ok_and(|files| files.contains_key(&self.path))
    }

    fn open_read(&self) -> io::Result<Box<dyn Read>> {
        let content = lock(&self.files)?
            .get(&self.path)
            .cloned()
            .ok_or_else(not_found)?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn open_write(&self) -> io::Result<Box<dyn Write>> {
        lock(&self.files)?.insert(self.path.clone(), Vec::new());
        Ok(Box::new(MemoryWriter {
            path: self.path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }
}

/// Buffers writes and commits them to the table on flush and on drop.
struct MemoryWriter {
    path: PathBuf,
    files: FileTable,
    buffer: Vec<u8>,
}

impl MemoryWriter {
    fn commit(&self) -> io::Result<()> {
        lock(&self.files)?.insert(self.path.clone(), self.buffer.clone());
        Ok(())
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if let Err(err) = self.commit() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to commit in-memory file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_file_round_trip() {
        let fs = MemoryFileSystem::new();
        let handle = fs.file(Path::new("/Working/web.config"));
        assert!(!handle.exists());

        let mut writer = handle.open_write().unwrap();
        writer.write_all(b"<configuration/>").unwrap();
        drop(writer);

        assert!(handle.exists());
        let mut content = String::new();
        handle.open_read().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "<configuration/>");
    }

    #[test]
    fn test_memory_missing_file_has_fixed_message() {
        let fs = MemoryFileSystem::new();
        let err = fs.file(Path::new("/missing")).open_read().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), FILE_NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_memory_clones_share_files() {
        let fs = MemoryFileSystem::new();
        let other = fs.clone();
        fs.create_file("/a.config", "<a/>");
        assert_eq!(other.read_to_string("/a.config").unwrap(), "<a/>");
        assert_eq!(other.paths(), vec![PathBuf::from("/a.config")]);
    }

    #[test]
    fn test_physical_missing_file_has_fixed_message() {
        let dir = tempfile::tempdir().unwrap();
        let err = PhysicalFileSystem
            .file(&dir.path().join("missing.config"))
            .open_read()
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), FILE_NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_physical_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.config");
        let handle = PhysicalFileSystem.file(&path);
        let mut writer = handle.open_write().unwrap();
        writer.write_all(b"<a/>").unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert!(handle.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<a/>");
    }
}
