// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Filesystem access used by the config store, package model and migrations.
//!
//! Everything in this crate touches disk through the [`Filesystem`] trait so
//! that callers can swap in [`MemoryFilesystem`] for tests or dry runs.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(test)]
#[path = "./fs_test.rs"]
mod fs_test;

/// Minimal set of filesystem operations needed by ksapp.
pub trait Filesystem: Send + Sync {
    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of a file, creating it if needed.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Whether anything (file or directory) exists at `path`.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Move a file or directory tree from `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// All regular files below `dir`, recursively, in sorted order.
    fn walk(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let data = self.read(path)?;
        String::from_utf8(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    /// Writes go to a temporary file next to the target which is then
    /// persisted over it, so readers never observe a partial file.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn walk(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryTree {
    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// An in-memory filesystem. Paths are used verbatim as keys, so callers
/// should stick to absolute paths.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    tree: Mutex<MemoryTree>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, MemoryTree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.tree()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut tree = self.tree();
        if tree.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ));
        }
        tree.add_parents(path);
        tree.files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        let tree = self.tree();
        Ok(tree.files.contains_key(path) || tree.dirs.contains(path))
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(self.tree().dirs.contains(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        if tree.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            ));
        }
        tree.add_parents(path);
        tree.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        if let Some(data) = tree.files.remove(from) {
            tree.add_parents(to);
            tree.files.insert(to.to_path_buf(), data);
            return Ok(());
        }
        if !tree.dirs.contains(from) {
            return Err(not_found(from));
        }
        if to.starts_with(from) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }

        let moved_files: Vec<PathBuf> = tree
            .files
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved_files {
            if let (Some(data), Ok(rel)) = (tree.files.remove(&old), old.strip_prefix(from)) {
                tree.files.insert(to.join(rel), data);
            }
        }

        let moved_dirs: Vec<PathBuf> = tree
            .dirs
            .iter()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved_dirs {
            tree.dirs.remove(&old);
            if let Ok(rel) = old.strip_prefix(from) {
                tree.dirs.insert(to.join(rel));
            }
        }
        tree.add_parents(to);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.tree()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn walk(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree();
        if !tree.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        Ok(tree
            .files
            .keys()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect())
    }
}
