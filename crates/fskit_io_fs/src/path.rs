//! Read-only queries over a filesystem path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::control::{self, EnumControl};
use crate::directory::DirectoryHandle;
use crate::file::FileHandle;
use crate::spec::{EnumEntryKind, FsError, FsResult};
use crate::sync::RecursiveSynchronizer;
use crate::util::{classify_kind, is_accessible, os_error};

/// Stateless wrapper classifying and querying one path.
///
/// Holding a `PathHandle` does not imply the entry exists; every query
/// re-reads the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathHandle {
    path: PathBuf,
}

impl PathHandle {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True for any entry kind, including dangling symlinks.
    pub fn exists(&self) -> bool {
        self.kind() != EnumEntryKind::Missing
    }

    pub fn kind(&self) -> EnumEntryKind {
        classify_kind(&self.path)
    }

    pub fn is_readable(&self) -> bool {
        self.exists() && is_accessible(&self.path, false)
    }

    pub fn is_writable(&self) -> bool {
        self.exists() && is_accessible(&self.path, true)
    }

    /// Byte length of a file, or recursive file-size sum of a directory.
    ///
    /// Symlinks and special entries have size 0.
    pub fn size(&self) -> FsResult<u64> {
        match self.kind() {
            EnumEntryKind::File => fs::metadata(&self.path)
                .map(|m| m.len())
                .map_err(|e| os_error(&self.path, e)),
            EnumEntryKind::Directory => RecursiveSynchronizer::new(&self.path).size(),
            EnumEntryKind::Symlink | EnumEntryKind::Special => Ok(0),
            EnumEntryKind::Missing => Err(FsError::PathNotFound(self.path.clone())),
        }
    }

    /// Zero-length file, or directory without direct children.
    pub fn is_empty(&self) -> FsResult<bool> {
        match self.kind() {
            EnumEntryKind::File => Ok(self.size()? == 0),
            EnumEntryKind::Directory => DirectoryHandle::new(&self.path).is_empty(),
            EnumEntryKind::Symlink | EnumEntryKind::Special => Ok(true),
            EnumEntryKind::Missing => Err(FsError::PathNotFound(self.path.clone())),
        }
    }

    pub fn open_file(&self) -> FileHandle {
        FileHandle::new(&self.path)
    }

    pub fn open_directory(&self) -> DirectoryHandle {
        DirectoryHandle::new(&self.path)
    }

    /// Control object for the entry's current kind. See [`control::control`].
    pub fn control(&self, fallback: Option<EnumEntryKind>) -> FsResult<EnumControl> {
        control::control(&self.path, fallback)
    }
}
