//! Operations on a single regular file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use log::debug;

use crate::random::RandomSource;
use crate::spec::{
    DEFAULT_MODE_FILE, EnumCopyMode, EnumEntryKind, FsError, FsResult, MODE_WRITABLE_FOR_ALL,
};
use crate::util::{
    classify_kind, is_accessible, is_directory_followed, name_of, os_error, set_mode,
};

/// Stateless wrapper for file operations on one path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Queries

    pub fn is_exists(&self) -> bool {
        classify_kind(&self.path) == EnumEntryKind::File
    }

    pub fn is_readable(&self) -> bool {
        self.is_exists() && is_accessible(&self.path, false)
    }

    pub fn is_writable(&self) -> bool {
        self.is_exists() && is_accessible(&self.path, true)
    }

    pub fn size(&self) -> FsResult<u64> {
        self.ensure_readable_file()?;
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| os_error(&self.path, e))
    }

    pub fn is_empty(&self) -> FsResult<bool> {
        Ok(self.size()? == 0)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Control

    /// Create an empty file, then apply `mode` in a second step.
    ///
    /// The two steps are not atomic: if `chmod` fails the file stays behind
    /// with the process default mode.
    pub fn create(&self, mode: u32) -> FsResult<()> {
        let path_parent = parent_dir(&self.path);
        if !is_directory_followed(&path_parent) {
            return Err(FsError::DirectoryNotFound(path_parent));
        }
        if classify_kind(&self.path) != EnumEntryKind::Missing {
            return Err(FsError::AlreadyExists(self.path.clone()));
        }

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => FsError::AlreadyExists(self.path.clone()),
                _ => os_error(&self.path, e),
            })?;
        set_mode(&self.path, mode)?;
        debug!("created file {} mode={mode:o}", self.path.display());
        Ok(())
    }

    /// [`create`](Self::create) with [`DEFAULT_MODE_FILE`].
    pub fn create_default(&self) -> FsResult<()> {
        self.create(DEFAULT_MODE_FILE)
    }

    pub fn delete(&self) -> FsResult<()> {
        match classify_kind(&self.path) {
            EnumEntryKind::Missing => return Err(FsError::NotFound(self.path.clone())),
            EnumEntryKind::File => {}
            _ => return Err(FsError::NotAFile(self.path.clone())),
        }
        fs::remove_file(&self.path).map_err(|e| os_error(&self.path, e))?;
        debug!("deleted file {}", self.path.display());
        Ok(())
    }

    pub fn chmod(&self, mode: u32) -> FsResult<()> {
        if classify_kind(&self.path) != EnumEntryKind::File {
            return Err(FsError::NotFound(self.path.clone()));
        }
        set_mode(&self.path, mode)
    }

    pub fn make_writable_for_all(&self) -> FsResult<()> {
        self.chmod(MODE_WRITABLE_FOR_ALL)
    }

    /// Set the modification time of an existing file to now.
    pub fn touch(&self) -> FsResult<()> {
        if classify_kind(&self.path) != EnumEntryKind::File {
            return Err(FsError::NotFound(self.path.clone()));
        }
        filetime::set_file_mtime(&self.path, FileTime::now()).map_err(|e| os_error(&self.path, e))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region ReadWrite

    pub fn read_all(&self) -> FsResult<Vec<u8>> {
        let mut file = self.open_read()?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| os_error(&self.path, e))?;
        Ok(buf)
    }

    /// Whole content as text; invalid UTF-8 is replaced.
    pub fn read_to_string(&self) -> FsResult<String> {
        Ok(String::from_utf8_lossy(&self.read_all()?).into_owned())
    }

    /// All lines with `\n` / `\r\n` separators stripped.
    pub fn read_lines(&self) -> FsResult<Vec<String>> {
        self.lines()?.collect()
    }

    /// Truncate and write `content` under an exclusive advisory lock.
    pub fn write_all<C: AsRef<[u8]>>(&self, content: C) -> FsResult<()> {
        let file = self.open_write(false)?;
        self.write_locked(file, content.as_ref(), true)
    }

    /// Append `content` under an exclusive advisory lock.
    pub fn append_all<C: AsRef<[u8]>>(&self, content: C) -> FsResult<()> {
        let file = self.open_write(true)?;
        self.write_locked(file, content.as_ref(), false)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region LineSearch

    pub fn line_count(&self) -> FsResult<usize> {
        let mut n_lines = 0;
        for line in self.lines()? {
            line?;
            n_lines += 1;
        }
        Ok(n_lines)
    }

    /// Line at 0-based `line_number`, `None` past the end.
    pub fn find_line_by_number(&self, line_number: usize) -> FsResult<Option<String>> {
        self.lines()?.nth(line_number).transpose()
    }

    /// First line whose `delimiter`-separated field `field_index` equals `value`.
    pub fn find_line_by_delimited_field(
        &self,
        delimiter: &str,
        field_index: usize,
        value: &str,
    ) -> FsResult<Option<String>> {
        if delimiter.is_empty() {
            return Err(FsError::InvalidArgument(
                "Arg `delimiter` must not be empty.".to_string(),
            ));
        }
        for line in self.lines()? {
            let line = line?;
            if line.split(delimiter).nth(field_index) == Some(value) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// First line containing `substring`.
    ///
    /// With `at_offset`, a line matches only when its first occurrence starts
    /// at that byte offset.
    pub fn find_line_containing(
        &self,
        substring: &str,
        at_offset: Option<usize>,
    ) -> FsResult<Option<String>> {
        for line in self.lines()? {
            let line = line?;
            let b_hit = match at_offset {
                None => line.contains(substring),
                Some(offset) => line.find(substring) == Some(offset),
            };
            if b_hit {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Uniformly random line in one pass (reservoir sampling, size 1).
    ///
    /// Line `i` replaces the held candidate when `source` draws `0` from
    /// `[0, i]`, so each of `N` lines ends up selected with probability `1/N`.
    /// An empty file yields `None`.
    pub fn find_random_line<S: RandomSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> FsResult<Option<String>> {
        let mut line_held = None;
        for (idx, line) in self.lines()?.enumerate() {
            let line = line?;
            if source.next_index(idx) == 0 {
                line_held = Some(line);
            }
        }
        Ok(line_held)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Copy

    /// Copy into the existing directory `dir_destination`.
    ///
    /// `rename` replaces the file stem and keeps the extension. Returns
    /// whether the destination was written (false when skipped).
    pub fn copy_to<P: AsRef<Path>>(
        &self,
        dir_destination: P,
        rename: Option<&str>,
        mode: u32,
        rule_copy: EnumCopyMode,
    ) -> FsResult<bool> {
        self.ensure_readable_file()?;
        let path_dir_dst = dir_destination.as_ref();
        if !is_directory_followed(path_dir_dst) {
            return Err(FsError::NotFound(path_dir_dst.to_path_buf()));
        }

        let name_dst = match rename {
            None => name_of(&self.path),
            Some(stem) => match self.path.extension() {
                Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
                None => stem.to_string(),
            },
        };
        copy_file_entry(&self.path, &path_dir_dst.join(name_dst), rule_copy, mode)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Internals

    fn ensure_readable_file(&self) -> FsResult<()> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(FsError::NotAFile(self.path.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FsError::NotFound(self.path.clone()))
            }
            Err(e) => Err(os_error(&self.path, e)),
        }
    }

    fn open_read(&self) -> FsResult<File> {
        self.ensure_readable_file()?;
        File::open(&self.path).map_err(|e| os_error(&self.path, e))
    }

    fn open_write(&self, if_append: bool) -> FsResult<File> {
        let path_parent = parent_dir(&self.path);
        if !is_directory_followed(&path_parent) {
            return Err(FsError::DirectoryNotFound(path_parent));
        }
        if fs::metadata(&self.path).is_ok_and(|m| !m.is_file()) {
            return Err(FsError::NotAFile(self.path.clone()));
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if if_append {
            options.append(true);
        } else {
            options.write(true);
        }
        options.open(&self.path).map_err(|e| os_error(&self.path, e))
    }

    fn write_locked(&self, mut file: File, content: &[u8], if_truncate: bool) -> FsResult<()> {
        file.try_lock().map_err(|e| FsError::Lock {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let res_write = write_content(&mut file, content, if_truncate);
        let res_unlock = file.unlock();

        res_write.map_err(|e| os_error(&self.path, e))?;
        res_unlock.map_err(|e| os_error(&self.path, e))?;
        debug!(
            "wrote {} bytes to {} (truncate={if_truncate})",
            content.len(),
            self.path.display()
        );
        Ok(())
    }

    fn lines(&self) -> FsResult<LineReader> {
        Ok(LineReader {
            reader: BufReader::new(self.open_read()?),
            buf: Vec::new(),
            path: self.path.clone(),
        })
    }

    // #endregion
}

/// Copy one file honoring `rule_copy`; returns whether `path_dst` was written.
///
/// An existing entry at `path_dst` is unlinked before overwriting, so the
/// copy never writes through a symlink or into a read-only file.
pub(crate) fn copy_file_entry(
    path_src: &Path,
    path_dst: &Path,
    rule_copy: EnumCopyMode,
    mode: u32,
) -> FsResult<bool> {
    match classify_kind(path_dst) {
        EnumEntryKind::Missing => {}
        EnumEntryKind::Directory => return Err(FsError::NotAFile(path_dst.to_path_buf())),
        _ => match rule_copy {
            EnumCopyMode::SkipExisting => {
                debug!("skip existing {}", path_dst.display());
                return Ok(false);
            }
            EnumCopyMode::AbortIfExists => return Err(FsError::Abort(path_dst.to_path_buf())),
            EnumCopyMode::OverwriteExisting => {
                fs::remove_file(path_dst).map_err(|e| os_error(path_dst, e))?;
            }
        },
    }

    fs::copy(path_src, path_dst).map_err(|e| os_error(path_dst, e))?;
    set_mode(path_dst, mode)?;
    debug!("copied {} -> {}", path_src.display(), path_dst.display());
    Ok(true)
}

fn write_content(file: &mut File, content: &[u8], if_truncate: bool) -> io::Result<()> {
    if if_truncate {
        file.set_len(0)?;
    }
    file.write_all(content)?;
    file.flush()
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Line iterator stripping `\n` / `\r\n`; a trailing separator does not open
/// an extra empty line.
struct LineReader {
    reader: BufReader<File>,
    buf: Vec<u8>,
    path: PathBuf,
}

impl Iterator for LineReader {
    type Item = FsResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(os_error(&self.path, e))),
        }
    }
}
