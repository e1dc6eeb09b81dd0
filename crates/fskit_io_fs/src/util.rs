use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumEntryKind, EnumPatternMode, FsError, FsResult};

////////////////////////////////////////////////////////////////////////////////
// #region EntryInspection

/// Classify `path` without following a final symlink.
///
/// Any `symlink_metadata` failure (absent entry, unreadable parent) is
/// reported as `Missing`: the kind cannot be determined.
pub(crate) fn classify_kind(path: &Path) -> EnumEntryKind {
    match fs::symlink_metadata(path) {
        Ok(meta) => convert_file_type(meta.file_type()),
        Err(_) => EnumEntryKind::Missing,
    }
}

pub(crate) fn convert_file_type(file_type: fs::FileType) -> EnumEntryKind {
    if file_type.is_symlink() {
        EnumEntryKind::Symlink
    } else if file_type.is_dir() {
        EnumEntryKind::Directory
    } else if file_type.is_file() {
        EnumEntryKind::File
    } else {
        EnumEntryKind::Special
    }
}

/// Directory check that follows symlinks, for caller-supplied parents and
/// destinations rather than walked entries.
pub(crate) fn is_directory_followed(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

pub(crate) fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Wrap an OS failure with the path passed to the failing call.
pub(crate) fn os_error(path: &Path, e: io::Error) -> FsError {
    FsError::Permission {
        path: path.to_path_buf(),
        source: e,
    }
}

/// `access(2)` check; false when the entry is absent.
pub(crate) fn is_accessible(path: &Path, if_write: bool) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};

        let flags = if if_write {
            AccessFlags::W_OK
        } else {
            AccessFlags::R_OK
        };
        access(path, flags).is_ok()
    }
    #[cfg(not(unix))]
    {
        match fs::metadata(path) {
            Ok(meta) => !if_write || !meta.permissions().readonly(),
            Err(_) => false,
        }
    }
}

/// Set permission bits on `path` (follows symlinks, callers never pass one).
pub(crate) fn set_mode(path: &Path, mode: u32) -> FsResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|e| os_error(path, e))
    }
    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)
            .map_err(|e| os_error(path, e))?
            .permissions();
        perms.set_readonly(mode & 0o200 == 0);
        fs::set_permissions(path, perms).map_err(|e| os_error(path, e))
    }
}

/// Permission bits of `path`, masked to `0o777`.
#[cfg(all(test, unix))]
pub(crate) fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::symlink_metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypePatternSeq {
    pub(crate) fn compile(patterns: &[String], rule_pattern: EnumPatternMode) -> FsResult<Self> {
        match rule_pattern {
            EnumPatternMode::Literal => Ok(Self::Literal(patterns.to_vec())),
            EnumPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| FsError::InvalidPattern(format!("Invalid glob pattern: {e}")))?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Self::Glob(l_glob))
            }
            EnumPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = Regex::new(pattern).map_err(|e| {
                        FsError::InvalidPattern(format!("Invalid regex pattern: {e}"))
                    })?;
                    l_regex.push(regex);
                }
                Ok(Self::Regex(l_regex))
            }
        }
    }

    pub(crate) fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// True when `dst` is `src` or lies inside it after canonicalization.
pub(crate) fn is_within(src: &Path, dst: &Path) -> bool {
    normalize_path(dst).starts_with(normalize_path(src))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{TypePatternSeq, classify_kind, is_directory_followed, is_within};
    use crate::spec::{EnumEntryKind, EnumPatternMode, FsError};

    #[test]
    fn classify_kind_reports_each_kind() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("a.file");
        std::fs::write(&path_file, "x").expect("write");

        assert_eq!(classify_kind(tmp.path()), EnumEntryKind::Directory);
        assert_eq!(classify_kind(&path_file), EnumEntryKind::File);
        assert_eq!(
            classify_kind(&tmp.path().join("absent")),
            EnumEntryKind::Missing
        );

        #[cfg(unix)]
        {
            let path_link = tmp.path().join("link");
            std::os::unix::fs::symlink(tmp.path(), &path_link).expect("symlink");
            assert_eq!(classify_kind(&path_link), EnumEntryKind::Symlink);
            assert!(is_directory_followed(&path_link));
        }
        assert!(is_directory_followed(tmp.path()));
        assert!(!is_directory_followed(&path_file));
        assert!(!is_directory_followed(&tmp.path().join("absent")));
    }

    #[test]
    fn pattern_modes_match_basenames() {
        let seq_glob =
            TypePatternSeq::compile(&["*.txt".to_string()], EnumPatternMode::Glob).expect("glob");
        assert!(seq_glob.is_match("a.txt"));
        assert!(!seq_glob.is_match("a.md"));

        let seq_regex = TypePatternSeq::compile(&[r"^log_\d+$".to_string()], EnumPatternMode::Regex)
            .expect("regex");
        assert!(seq_regex.is_match("log_12"));
        assert!(!seq_regex.is_match("log_x"));

        let seq_literal =
            TypePatternSeq::compile(&["part".to_string()], EnumPatternMode::Literal).expect("lit");
        assert!(seq_literal.is_match("a_part_b"));
    }

    #[test]
    fn invalid_patterns_rejected() {
        let err = TypePatternSeq::compile(&["[".to_string()], EnumPatternMode::Glob)
            .expect_err("invalid glob");
        assert!(matches!(err, FsError::InvalidPattern(_)));

        let err = TypePatternSeq::compile(&["(".to_string()], EnumPatternMode::Regex)
            .expect_err("invalid regex");
        assert!(matches!(err, FsError::InvalidPattern(_)));
    }

    #[test]
    fn is_within_is_one_directional() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let nested = src.join("nested");
        std::fs::create_dir_all(&nested).expect("mkdir");
        let other = tmp.path().join("other");
        std::fs::create_dir_all(&other).expect("mkdir");

        assert!(is_within(&src, &nested));
        assert!(is_within(&src, &src));
        assert!(!is_within(&nested, &src));
        assert!(!is_within(&src, &other));
    }
}
