//! Operations on a single directory.
//!
//! Recursive work (`clear`, `copy_to`, ...) is delegated to
//! [`RecursiveSynchronizer`].

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::report::ReportSync;
use crate::spec::{
    DEFAULT_MODE_DIR, EnumEntryKind, EnumPatternMode, FsError, FsResult, SpecCopyOptions,
    SpecEntry,
};
use crate::sync::RecursiveSynchronizer;
use crate::util::{
    TypePatternSeq, classify_kind, convert_file_type, is_accessible, os_error, set_mode,
};

/// Stateless wrapper for directory operations on one path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryHandle {
    path: PathBuf,
}

impl DirectoryHandle {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_exists(&self) -> bool {
        classify_kind(&self.path) == EnumEntryKind::Directory
    }

    pub fn is_readable(&self) -> bool {
        self.is_exists() && is_accessible(&self.path, false)
    }

    pub fn is_writable(&self) -> bool {
        self.is_exists() && is_accessible(&self.path, true)
    }

    /// True when the directory has no direct children.
    pub fn is_empty(&self) -> FsResult<bool> {
        self.ensure_directory()?;
        let mut iter_entries = fs::read_dir(&self.path).map_err(|e| os_error(&self.path, e))?;
        Ok(iter_entries.next().is_none())
    }

    /// Recursive sum of descendant file sizes.
    pub fn size(&self) -> FsResult<u64> {
        self.synchronizer().size()
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Control

    /// Create the directory and missing ancestors (`mkdir -p`).
    ///
    /// The final directory ends with exactly `mode`; intermediate ones get
    /// `mode` filtered by the process umask.
    pub fn create(&self, mode: u32) -> FsResult<()> {
        if classify_kind(&self.path) != EnumEntryKind::Missing {
            return Err(FsError::AlreadyExists(self.path.clone()));
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        builder
            .create(&self.path)
            .map_err(|e| os_error(&self.path, e))?;
        set_mode(&self.path, mode)?;
        debug!("created directory {} mode={mode:o}", self.path.display());
        Ok(())
    }

    /// [`create`](Self::create) with [`DEFAULT_MODE_DIR`].
    pub fn create_default(&self) -> FsResult<()> {
        self.create(DEFAULT_MODE_DIR)
    }

    /// Remove the directory; only empty directories are accepted.
    pub fn delete(&self) -> FsResult<()> {
        match classify_kind(&self.path) {
            EnumEntryKind::Directory => {}
            EnumEntryKind::Missing => return Err(FsError::NotFound(self.path.clone())),
            _ => return Err(FsError::NotADirectory(self.path.clone())),
        }
        if !self.is_empty()? {
            return Err(FsError::NotEmpty(self.path.clone()));
        }
        fs::remove_dir(&self.path).map_err(|e| os_error(&self.path, e))?;
        debug!("deleted directory {}", self.path.display());
        Ok(())
    }

    /// Set mode on the directory itself (not recursive).
    pub fn chmod(&self, mode: u32) -> FsResult<()> {
        self.ensure_directory()?;
        set_mode(&self.path, mode)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Listing

    /// Direct children in filesystem order.
    pub fn list_entries(&self) -> FsResult<Vec<SpecEntry>> {
        self.ensure_directory()?;
        let iter_entries = fs::read_dir(&self.path).map_err(|e| os_error(&self.path, e))?;

        let mut l_entries = Vec::new();
        for entry_res in iter_entries {
            let entry = entry_res.map_err(|e| os_error(&self.path, e))?;
            let path_entry = entry.path();
            let file_type = entry.file_type().map_err(|e| os_error(&path_entry, e))?;
            l_entries.push(SpecEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind: convert_file_type(file_type),
                path: path_entry,
            });
        }
        Ok(l_entries)
    }

    /// Direct children whose name matches any of `patterns`.
    pub fn list_entries_matching(
        &self,
        patterns: &[String],
        rule_pattern: EnumPatternMode,
    ) -> FsResult<Vec<SpecEntry>> {
        let seq_patterns = TypePatternSeq::compile(patterns, rule_pattern)?;
        let mut l_entries = self.list_entries()?;
        l_entries.retain(|e| seq_patterns.is_match(&e.name));
        Ok(l_entries)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Recursive

    pub fn synchronizer(&self) -> RecursiveSynchronizer {
        RecursiveSynchronizer::new(&self.path)
    }

    /// Remove every descendant, keeping the directory itself.
    pub fn clear(&self) -> FsResult<ReportSync> {
        self.synchronizer().clear()
    }

    pub fn chmod_internal_content(&self, mode: u32) -> FsResult<ReportSync> {
        self.synchronizer().chmod_internal_content(mode)
    }

    pub fn make_writable_for_all(&self) -> FsResult<ReportSync> {
        self.synchronizer().make_writable_for_all()
    }

    pub fn copy_to<P: AsRef<Path>>(
        &self,
        dir_destination: P,
        spec_cp_options: SpecCopyOptions,
    ) -> FsResult<ReportSync> {
        self.synchronizer().copy_to(dir_destination, spec_cp_options)
    }

    // #endregion

    fn ensure_directory(&self) -> FsResult<()> {
        if classify_kind(&self.path) != EnumEntryKind::Directory {
            return Err(FsError::NotADirectory(self.path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::DirectoryHandle;
    use crate::spec::{EnumEntryKind, EnumPatternMode, FsError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    #[test]
    fn create_builds_missing_ancestors() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("a/b/c");

        let handle = DirectoryHandle::new(&path_dir);
        assert!(!handle.is_exists());
        handle.create(0o755).expect("create");
        assert!(handle.is_exists());
        assert!(handle.is_empty().expect("is_empty"));

        #[cfg(unix)]
        assert_eq!(crate::util::mode_of(&path_dir), 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn create_applies_exact_mode() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("open");

        DirectoryHandle::new(&path_dir).create(0o777).expect("create");
        assert_eq!(crate::util::mode_of(&path_dir), 0o777);
    }

    #[test]
    fn create_rejects_existing_entries() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = DirectoryHandle::new(tmp.path())
            .create(0o755)
            .expect_err("directory exists");
        assert!(matches!(err, FsError::AlreadyExists(_)));

        let path_file = tmp.path().join("a.file");
        write_text(&path_file, "x");
        let err = DirectoryHandle::new(&path_file)
            .create(0o755)
            .expect_err("file exists");
        assert!(matches!(err, FsError::AlreadyExists(_)));
    }

    #[cfg(unix)]
    #[test]
    fn create_under_read_only_parent_fails() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::Uid::effective().is_root() {
            return;
        }
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_parent = tmp.path().join("ro");
        std::fs::create_dir(&path_parent).expect("mkdir");
        std::fs::set_permissions(&path_parent, std::fs::Permissions::from_mode(0o555))
            .expect("chmod");

        let err = DirectoryHandle::new(path_parent.join("child"))
            .create(0o755)
            .expect_err("must fail");
        assert!(matches!(err, FsError::Permission { .. }));

        std::fs::set_permissions(&path_parent, std::fs::Permissions::from_mode(0o755))
            .expect("restore");
    }

    #[test]
    fn delete_empty_and_non_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_empty = tmp.path().join("empty");
        std::fs::create_dir(&path_empty).expect("mkdir");
        DirectoryHandle::new(&path_empty).delete().expect("delete");
        assert!(!path_empty.exists());

        let path_full = tmp.path().join("full");
        write_text(&path_full.join("a.file"), "x");
        let err = DirectoryHandle::new(&path_full)
            .delete()
            .expect_err("not empty");
        assert!(matches!(err, FsError::NotEmpty(_)));
        assert!(path_full.join("a.file").exists());
    }

    #[test]
    fn delete_checks_kind() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = DirectoryHandle::new(tmp.path().join("absent"))
            .delete()
            .expect_err("missing");
        assert!(matches!(err, FsError::NotFound(_)));

        let path_file = tmp.path().join("a.file");
        write_text(&path_file, "x");
        let err = DirectoryHandle::new(&path_file)
            .delete()
            .expect_err("file");
        assert!(matches!(err, FsError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn chmod_is_not_recursive() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("dir");
        let path_file = path_dir.join("a.file");
        write_text(&path_file, "x");
        std::fs::set_permissions(&path_file, std::fs::Permissions::from_mode(0o644))
            .expect("chmod");

        DirectoryHandle::new(&path_dir).chmod(0o700).expect("chmod");
        assert_eq!(crate::util::mode_of(&path_dir), 0o700);
        assert_eq!(crate::util::mode_of(&path_file), 0o644);
    }

    #[test]
    fn chmod_requires_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = DirectoryHandle::new(tmp.path().join("absent"))
            .chmod(0o755)
            .expect_err("missing");
        assert!(matches!(err, FsError::NotADirectory(_)));

        let path_file = tmp.path().join("a.file");
        write_text(&path_file, "x");
        let err = DirectoryHandle::new(&path_file)
            .chmod(0o755)
            .expect_err("file");
        assert!(matches!(err, FsError::NotADirectory(_)));
    }

    #[test]
    fn list_entries_one_level() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");
        write_text(&tmp.path().join("b.md"), "b");
        write_text(&tmp.path().join("sub/c.txt"), "c");

        let handle = DirectoryHandle::new(tmp.path());
        let mut l_entries = handle.list_entries().expect("list");
        l_entries.sort_by(|a, b| a.name.cmp(&b.name));
        let l_pairs: Vec<(&str, EnumEntryKind)> =
            l_entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            l_pairs,
            vec![
                ("a.txt", EnumEntryKind::File),
                ("b.md", EnumEntryKind::File),
                ("sub", EnumEntryKind::Directory),
            ]
        );

        let l_txt = handle
            .list_entries_matching(&["*.txt".to_string()], EnumPatternMode::Glob)
            .expect("glob");
        assert_eq!(l_txt.len(), 1);
        assert_eq!(l_txt[0].name, "a.txt");

        let err = handle
            .list_entries_matching(&["(".to_string()], EnumPatternMode::Regex)
            .expect_err("invalid regex");
        assert!(matches!(err, FsError::InvalidPattern(_)));
    }
}
