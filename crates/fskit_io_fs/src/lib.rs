//! `fskit_io_fs` v1:
//! Handle-based filesystem utilities.
//!
//! Module map:
//! - `path`      : read-only path classification and queries
//! - `file`      : single regular file operations (lines, locked writes)
//! - `directory` : single directory operations
//! - `sync`      : recursive size / clear / chmod / copy walks
//! - `control`   : live type dispatch over file, directory and symlink
//! - `random`    : injectable random source for line sampling
//! - `spec`      : enums/options/errors
//! - `report`    : walk report model
//! - `util`      : shared helper functions

pub mod control;
pub mod directory;
pub mod file;
pub mod path;
pub mod random;
pub mod report;
pub mod spec;
pub mod sync;
mod util;

pub use control::{Control, EnumControl, EnumEntry, SymlinkHandle, classify, control};
pub use directory::DirectoryHandle;
pub use file::FileHandle;
pub use path::PathHandle;
pub use random::{RandomSource, RngSource, SequenceSource};
pub use report::{ReportSync, ReportSyncBuilder};
pub use spec::{
    DEFAULT_MODE_DIR, DEFAULT_MODE_FILE, EnumCopyMode, EnumEntryKind, EnumPatternMode, FsError,
    FsResult, SpecCopyOptions, SpecEntry,
};
pub use sync::RecursiveSynchronizer;
