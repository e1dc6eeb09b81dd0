//! Live type dispatch: pick the handle matching what is on disk now.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::directory::DirectoryHandle;
use crate::file::FileHandle;
use crate::path::PathHandle;
use crate::spec::{EnumEntryKind, FsError, FsResult};
use crate::util::{classify_kind, os_error};

/// Mutations shared by every controllable entry kind.
pub trait Control {
    fn create(&self, mode: u32) -> FsResult<()>;
    fn delete(&self) -> FsResult<()>;
    fn chmod(&self, mode: u32) -> FsResult<()>;
}

impl Control for FileHandle {
    fn create(&self, mode: u32) -> FsResult<()> {
        FileHandle::create(self, mode)
    }

    fn delete(&self) -> FsResult<()> {
        FileHandle::delete(self)
    }

    fn chmod(&self, mode: u32) -> FsResult<()> {
        FileHandle::chmod(self, mode)
    }
}

impl Control for DirectoryHandle {
    fn create(&self, mode: u32) -> FsResult<()> {
        DirectoryHandle::create(self, mode)
    }

    fn delete(&self) -> FsResult<()> {
        DirectoryHandle::delete(self)
    }

    fn chmod(&self, mode: u32) -> FsResult<()> {
        DirectoryHandle::chmod(self, mode)
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Symlink

/// Symbolic link itself, never its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymlinkHandle {
    path: PathBuf,
}

impl SymlinkHandle {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the symlink. The target is left untouched.
    pub fn delete(&self) -> FsResult<()> {
        if classify_kind(&self.path) != EnumEntryKind::Symlink {
            return Err(FsError::NotFound(self.path.clone()));
        }
        fs::remove_file(&self.path).map_err(|e| os_error(&self.path, e))?;
        debug!("unlinked symlink {}", self.path.display());
        Ok(())
    }

    pub fn read_target(&self) -> FsResult<PathBuf> {
        if classify_kind(&self.path) != EnumEntryKind::Symlink {
            return Err(FsError::NotFound(self.path.clone()));
        }
        fs::read_link(&self.path).map_err(|e| os_error(&self.path, e))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Dispatch

/// Handle matching the entry kind observed at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumEntry {
    File(FileHandle),
    Directory(DirectoryHandle),
    Symlink(SymlinkHandle),
    Special(PathHandle),
    Missing(PathHandle),
}

/// Classify `path` once and wrap it in the matching handle.
pub fn classify<P: AsRef<Path>>(path: P) -> EnumEntry {
    let path = path.as_ref();
    match classify_kind(path) {
        EnumEntryKind::File => EnumEntry::File(FileHandle::new(path)),
        EnumEntryKind::Directory => EnumEntry::Directory(DirectoryHandle::new(path)),
        EnumEntryKind::Symlink => EnumEntry::Symlink(SymlinkHandle::new(path)),
        EnumEntryKind::Special => EnumEntry::Special(PathHandle::new(path)),
        EnumEntryKind::Missing => EnumEntry::Missing(PathHandle::new(path)),
    }
}

/// Controllable entry: a file, a directory or a symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumControl {
    File(FileHandle),
    Directory(DirectoryHandle),
    Symlink(SymlinkHandle),
}

impl EnumControl {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(h) => h.path(),
            Self::Directory(h) => h.path(),
            Self::Symlink(h) => h.path(),
        }
    }

    pub fn kind(&self) -> EnumEntryKind {
        match self {
            Self::File(_) => EnumEntryKind::File,
            Self::Directory(_) => EnumEntryKind::Directory,
            Self::Symlink(_) => EnumEntryKind::Symlink,
        }
    }
}

impl Control for EnumControl {
    fn create(&self, mode: u32) -> FsResult<()> {
        match self {
            Self::File(h) => h.create(mode),
            Self::Directory(h) => h.create(mode),
            Self::Symlink(h) => Err(FsError::AlreadyExists(h.path().to_path_buf())),
        }
    }

    fn delete(&self) -> FsResult<()> {
        match self {
            Self::File(h) => h.delete(),
            Self::Directory(h) => h.delete(),
            Self::Symlink(h) => h.delete(),
        }
    }

    fn chmod(&self, mode: u32) -> FsResult<()> {
        match self {
            Self::File(h) => h.chmod(mode),
            Self::Directory(h) => h.chmod(mode),
            Self::Symlink(h) => Err(FsError::Unsupported {
                path: h.path().to_path_buf(),
                operation: "chmod",
            }),
        }
    }
}

/// Control object for whatever is at `path` right now.
///
/// A missing path yields the `fallback` kind when it is `File` or
/// `Directory` (so the caller can create it), otherwise
/// [`FsError::PathNotFound`]. Special entries are not controllable.
pub fn control<P: AsRef<Path>>(
    path: P,
    fallback: Option<EnumEntryKind>,
) -> FsResult<EnumControl> {
    let path = path.as_ref();
    match classify(path) {
        EnumEntry::File(h) => Ok(EnumControl::File(h)),
        EnumEntry::Directory(h) => Ok(EnumControl::Directory(h)),
        EnumEntry::Symlink(h) => Ok(EnumControl::Symlink(h)),
        EnumEntry::Special(_) => Err(FsError::Unsupported {
            path: path.to_path_buf(),
            operation: "control",
        }),
        EnumEntry::Missing(_) => match fallback {
            Some(EnumEntryKind::File) => Ok(EnumControl::File(FileHandle::new(path))),
            Some(EnumEntryKind::Directory) => {
                Ok(EnumControl::Directory(DirectoryHandle::new(path)))
            }
            _ => Err(FsError::PathNotFound(path.to_path_buf())),
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
