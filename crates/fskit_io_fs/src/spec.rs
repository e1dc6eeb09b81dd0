//! Handle specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Default permission bits for created directories.
pub const DEFAULT_MODE_DIR: u32 = 0o755;
/// Default permission bits for created files.
pub const DEFAULT_MODE_FILE: u32 = 0o644;
/// Permission bits applied by `make_writable_for_all`.
pub const MODE_WRITABLE_FOR_ALL: u32 = 0o777;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Kind of a filesystem entry, derived from `symlink_metadata` on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumEntryKind {
    /// Directory (never reported for a symlink pointing at one).
    Directory,
    /// Regular file.
    File,
    /// Symbolic link, dangling or not.
    Symlink,
    /// FIFO, socket or device node.
    Special,
    /// Nothing at this path.
    Missing,
}

/// Existing destination entry conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyMode {
    /// Keep destination entry and skip current source entry.
    #[default]
    SkipExisting,
    /// Replace destination file (directories are merged).
    OverwriteExisting,
    /// Fail with [`FsError::Abort`] at the first existing destination entry.
    AbortIfExists,
}

/// Pattern matching mode for directory listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCopyOptions {
    /// Conflict behavior for destination entries.
    pub rule_copy: EnumCopyMode,
    /// Mode applied to directories created at destination.
    pub mode_dir: u32,
    /// Mode applied to files written at destination.
    pub mode_file: u32,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            rule_copy: EnumCopyMode::SkipExisting,
            mode_dir: DEFAULT_MODE_DIR,
            mode_file: DEFAULT_MODE_FILE,
        }
    }
}

/// One directory listing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntry {
    /// Basename (lossy UTF-8).
    pub name: String,
    /// Kind observed while listing.
    pub kind: EnumEntryKind,
    /// Full path of the entry.
    pub path: PathBuf,
}

/// Result alias used by every handle operation.
pub type FsResult<T> = Result<T, FsError>;

/// Failure taxonomy shared by all handles.
///
/// Every variant names the path involved so that a caller can locate the
/// partial state a failed walk leaves behind.
#[derive(Debug, Error)]
pub enum FsError {
    /// Entry kind could not be determined (nothing exists at the path).
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),
    /// Entry required by the operation is absent.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Parent directory of a file to create is absent.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    /// Create-time conflict.
    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// Directory operation requested on a non-directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// File operation requested on a non-file.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),
    /// Non-recursive delete on a populated directory.
    #[error("Directory not empty: {}", .0.display())]
    NotEmpty(PathBuf),
    /// Underlying OS call failed.
    #[error("Permission denied: {} ({source})", .path.display())]
    Permission {
        /// Path passed to the failing call.
        path: PathBuf,
        /// OS error.
        source: io::Error,
    },
    /// `AbortIfExists` policy hit an existing destination entry.
    #[error("Aborted, destination exists: {}", .0.display())]
    Abort(PathBuf),
    /// Advisory write lock not acquired.
    #[error("Failed to lock file: {} ({message})", .path.display())]
    Lock {
        /// Locked file.
        path: PathBuf,
        /// Lock failure text.
        message: String,
    },
    /// Invalid include pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Invalid argument value.
    #[error("{0}")]
    InvalidArgument(String),
    /// Source and destination trees overlap.
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .path_source.display(),
        .path_destination.display()
    )]
    Overlap {
        /// Source directory.
        path_source: PathBuf,
        /// Destination directory.
        path_destination: PathBuf,
    },
    /// Operation has no meaning for the entry kind at this path.
    #[error("Unsupported operation `{operation}` on {}", .path.display())]
    Unsupported {
        /// Entry path.
        path: PathBuf,
        /// Operation name.
        operation: &'static str,
    },
}

impl FsError {
    /// Path carried by the error, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PathNotFound(p)
            | Self::NotFound(p)
            | Self::DirectoryNotFound(p)
            | Self::AlreadyExists(p)
            | Self::NotADirectory(p)
            | Self::NotAFile(p)
            | Self::NotEmpty(p)
            | Self::Abort(p) => Some(p.as_path()),
            Self::Permission { path, .. }
            | Self::Lock { path, .. }
            | Self::Unsupported { path, .. } => Some(path.as_path()),
            Self::Overlap {
                path_destination, ..
            } => Some(path_destination.as_path()),
            Self::InvalidPattern(_) | Self::InvalidArgument(_) => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
