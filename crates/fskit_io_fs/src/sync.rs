//! Recursive directory walks: size, clear, chmod propagation and copy.
//!
//! Every walk is depth-first, single-threaded and stops at the first failing
//! entry. Nothing is rolled back: the returned error names the entry that
//! failed so the caller can inspect the partial state.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::control::SymlinkHandle;
use crate::directory::DirectoryHandle;
use crate::file::{FileHandle, copy_file_entry};
use crate::report::{ReportSync, ReportSyncBuilder};
use crate::spec::{
    EnumCopyMode, EnumEntryKind, FsError, FsResult, MODE_WRITABLE_FOR_ALL, SpecCopyOptions,
};
use crate::util::{
    classify_kind, convert_file_type, is_directory_followed, is_within, normalize_path, os_error,
    set_mode,
};

#[derive(Debug, Clone)]
struct SpecWalkEntry {
    path_entry: PathBuf,
    name_entry: OsString,
    kind_entry: EnumEntryKind,
}

#[derive(Debug)]
struct SpecCopyContext {
    spec_cp_options: SpecCopyOptions,
    builder_report: ReportSyncBuilder,
}

/// Recursive operations rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecursiveSynchronizer {
    path_dir_root: PathBuf,
}

impl RecursiveSynchronizer {
    pub fn new<P: AsRef<Path>>(dir_root: P) -> Self {
        Self {
            path_dir_root: dir_root.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path_dir_root
    }

    /// Sum of all descendant regular-file sizes.
    ///
    /// Directories, symlinks and special entries contribute 0 directly.
    pub fn size(&self) -> FsResult<u64> {
        self.ensure_root()?;
        sum_sizes(&self.path_dir_root)
    }

    /// Delete every descendant, children before parents. The root stays.
    pub fn clear(&self) -> FsResult<ReportSync> {
        self.ensure_root()?;
        let mut builder_report = ReportSyncBuilder::default();
        clear_directory(&self.path_dir_root, &mut builder_report)?;

        let report = builder_report.build();
        info!("clear {}: {report}", self.path_dir_root.display());
        Ok(report)
    }

    /// Apply `mode` to every descendant file and directory, not the root.
    ///
    /// Children are updated before their parent. Symlinks are left alone.
    pub fn chmod_internal_content(&self, mode: u32) -> FsResult<ReportSync> {
        self.ensure_root()?;
        let mut builder_report = ReportSyncBuilder::default();
        chmod_directory(&self.path_dir_root, mode, &mut builder_report)?;

        let report = builder_report.build();
        info!(
            "chmod {:o} under {}: {report}",
            mode,
            self.path_dir_root.display()
        );
        Ok(report)
    }

    /// Mode `0o777` on every descendant, then on the root.
    pub fn make_writable_for_all(&self) -> FsResult<ReportSync> {
        let mut report = self.chmod_internal_content(MODE_WRITABLE_FOR_ALL)?;
        DirectoryHandle::new(&self.path_dir_root).chmod(MODE_WRITABLE_FOR_ALL)?;
        report.cnt_chmod += 1;
        Ok(report)
    }

    /// Copy the tree into `dir_destination/<root basename>`.
    ///
    /// Behavior is controlled by [`SpecCopyOptions`]:
    /// - `rule_copy` decides what happens to existing destination entries
    ///   (existing directories are merged unless `AbortIfExists`),
    /// - `mode_dir` is applied to created directories,
    /// - `mode_file` is applied to every written file.
    ///
    /// `dir_destination` itself may be a symlink to a directory. The mirror
    /// root must not be the source or lie inside it. Source symlinks and
    /// special entries are skipped, never followed.
    pub fn copy_to<P: AsRef<Path>>(
        &self,
        dir_destination: P,
        spec_cp_options: SpecCopyOptions,
    ) -> FsResult<ReportSync> {
        self.ensure_root()?;
        let path_dir_dst = dir_destination.as_ref();
        if !is_directory_followed(path_dir_dst) {
            return Err(FsError::NotFound(path_dir_dst.to_path_buf()));
        }

        let name_root = match self.path_dir_root.file_name() {
            Some(name) => name.to_os_string(),
            None => normalize_path(&self.path_dir_root)
                .file_name()
                .map(|v| v.to_os_string())
                .ok_or_else(|| {
                    FsError::InvalidArgument(format!(
                        "Source directory has no basename: {}",
                        self.path_dir_root.display()
                    ))
                })?,
        };
        let path_dir_mirror = path_dir_dst.join(&name_root);
        if is_within(
            &self.path_dir_root,
            &normalize_path(path_dir_dst).join(&name_root),
        ) {
            return Err(FsError::Overlap {
                path_source: self.path_dir_root.clone(),
                path_destination: path_dir_mirror,
            });
        }

        let mut spec_cp_ctx = SpecCopyContext {
            spec_cp_options,
            builder_report: ReportSyncBuilder::default(),
        };
        ensure_mirror_directory(&path_dir_mirror, &mut spec_cp_ctx)?;
        copy_directory(&self.path_dir_root, &path_dir_mirror, &mut spec_cp_ctx)?;

        let report = spec_cp_ctx.builder_report.build();
        info!(
            "copy {} -> {}: {report}",
            self.path_dir_root.display(),
            path_dir_mirror.display()
        );
        Ok(report)
    }

    fn ensure_root(&self) -> FsResult<()> {
        match classify_kind(&self.path_dir_root) {
            EnumEntryKind::Directory => Ok(()),
            EnumEntryKind::Missing => Err(FsError::NotFound(self.path_dir_root.clone())),
            _ => Err(FsError::NotADirectory(self.path_dir_root.clone())),
        }
    }
}

/// Direct children sorted by name, classified without following symlinks.
fn read_children(path_dir: &Path) -> FsResult<Vec<SpecWalkEntry>> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| os_error(path_dir, e))?;

    let mut l_entries = Vec::new();
    for entry_res in iter_entries {
        let entry = entry_res.map_err(|e| os_error(path_dir, e))?;
        let path_entry = entry.path();
        let file_type = entry.file_type().map_err(|e| os_error(&path_entry, e))?;
        l_entries.push(SpecWalkEntry {
            path_entry,
            name_entry: entry.file_name(),
            kind_entry: convert_file_type(file_type),
        });
    }
    l_entries.sort_by(|a, b| a.name_entry.cmp(&b.name_entry));
    Ok(l_entries)
}

fn sum_sizes(path_dir: &Path) -> FsResult<u64> {
    let mut n_bytes = 0_u64;
    for spec_entry in read_children(path_dir)? {
        match spec_entry.kind_entry {
            EnumEntryKind::File => {
                n_bytes += fs::symlink_metadata(&spec_entry.path_entry)
                    .map_err(|e| os_error(&spec_entry.path_entry, e))?
                    .len();
            }
            EnumEntryKind::Directory => n_bytes += sum_sizes(&spec_entry.path_entry)?,
            EnumEntryKind::Symlink | EnumEntryKind::Special | EnumEntryKind::Missing => {}
        }
    }
    Ok(n_bytes)
}

fn clear_directory(path_dir: &Path, builder_report: &mut ReportSyncBuilder) -> FsResult<()> {
    for spec_entry in read_children(path_dir)? {
        builder_report.add_scanned();
        let path_entry = &spec_entry.path_entry;
        match spec_entry.kind_entry {
            EnumEntryKind::Directory => {
                clear_directory(path_entry, builder_report)?;
                DirectoryHandle::new(path_entry).delete()?;
            }
            EnumEntryKind::File => FileHandle::new(path_entry).delete()?,
            EnumEntryKind::Symlink => SymlinkHandle::new(path_entry).delete()?,
            EnumEntryKind::Special => {
                fs::remove_file(path_entry).map_err(|e| os_error(path_entry, e))?;
                debug!("deleted special entry {}", path_entry.display());
            }
            EnumEntryKind::Missing => return Err(FsError::NotFound(path_entry.clone())),
        }
        builder_report.add_removed();
    }
    Ok(())
}

fn chmod_directory(
    path_dir: &Path,
    mode: u32,
    builder_report: &mut ReportSyncBuilder,
) -> FsResult<()> {
    for spec_entry in read_children(path_dir)? {
        builder_report.add_scanned();
        let path_entry = &spec_entry.path_entry;
        match spec_entry.kind_entry {
            EnumEntryKind::Directory => {
                chmod_directory(path_entry, mode, builder_report)?;
                DirectoryHandle::new(path_entry).chmod(mode)?;
            }
            EnumEntryKind::File => FileHandle::new(path_entry).chmod(mode)?,
            EnumEntryKind::Symlink | EnumEntryKind::Special | EnumEntryKind::Missing => {
                builder_report.add_skipped();
                continue;
            }
        }
        debug!("chmod {mode:o} {}", path_entry.display());
        builder_report.add_chmod();
    }
    Ok(())
}

/// Create `path_dir_dst` if absent, or accept it for merging.
fn ensure_mirror_directory(path_dir_dst: &Path, spec_cp_ctx: &mut SpecCopyContext) -> FsResult<()> {
    match classify_kind(path_dir_dst) {
        EnumEntryKind::Missing => {
            fs::create_dir(path_dir_dst).map_err(|e| os_error(path_dir_dst, e))?;
            set_mode(path_dir_dst, spec_cp_ctx.spec_cp_options.mode_dir)?;
            debug!("created directory {}", path_dir_dst.display());
            spec_cp_ctx.builder_report.add_created();
            Ok(())
        }
        EnumEntryKind::Directory => {
            if spec_cp_ctx.spec_cp_options.rule_copy == EnumCopyMode::AbortIfExists {
                return Err(FsError::Abort(path_dir_dst.to_path_buf()));
            }
            debug!("merge into existing directory {}", path_dir_dst.display());
            Ok(())
        }
        _ => Err(FsError::NotADirectory(path_dir_dst.to_path_buf())),
    }
}

fn copy_directory(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_ctx: &mut SpecCopyContext,
) -> FsResult<()> {
    for spec_entry in read_children(path_dir_src)? {
        spec_cp_ctx.builder_report.add_scanned();
        let path_entry_dst = path_dir_dst.join(&spec_entry.name_entry);
        match spec_entry.kind_entry {
            EnumEntryKind::Directory => {
                ensure_mirror_directory(&path_entry_dst, spec_cp_ctx)?;
                copy_directory(&spec_entry.path_entry, &path_entry_dst, spec_cp_ctx)?;
            }
            EnumEntryKind::File => {
                let b_written = copy_file_entry(
                    &spec_entry.path_entry,
                    &path_entry_dst,
                    spec_cp_ctx.spec_cp_options.rule_copy,
                    spec_cp_ctx.spec_cp_options.mode_file,
                )?;
                if b_written {
                    spec_cp_ctx.builder_report.add_copied();
                } else {
                    spec_cp_ctx.builder_report.add_skipped();
                }
            }
            EnumEntryKind::Symlink => {
                debug!("symlink skipped: {}", spec_entry.path_entry.display());
                spec_cp_ctx.builder_report.add_skipped();
            }
            EnumEntryKind::Special | EnumEntryKind::Missing => {
                warn!("Special file skipped: {}", spec_entry.path_entry.display());
                spec_cp_ctx.builder_report.add_skipped();
            }
        }
    }
    Ok(())
}
