//! Submodule providing the file-system interface over local disks and
//! HDFS.

use std::time::{SystemTime, UNIX_EPOCH};

use log::error;

use crate::{
    error::StreamError,
    io::path::{is_hdfs_path, is_stdin_stdout_path, FilePath, FileStat, FileType},
};

/// Directory and metadata operations shared by the local and HDFS
/// backends. Failures are reported by `None`/`false` after an error
/// log; callers decide whether to continue.
pub trait FileSystem {
    /// Returns the metadata of `path`, or `None` when it cannot be
    /// statted.
    fn stat(&mut self, path: &FilePath) -> Option<FileStat>;

    /// Lists `path`, skipping child directories when `skip_dir`.
    /// Listing a file yields the file itself. Results are sorted by
    /// path.
    fn list(&mut self, path: &FilePath, skip_dir: bool) -> Option<Vec<(FilePath, FileStat)>>;

    /// Lists `path` recursively.
    fn list_recursive(
        &mut self,
        path: &FilePath,
        skip_dir: bool,
    ) -> Option<Vec<(FilePath, FileStat)>>;

    /// Creates `dir` and any missing parents.
    fn make_dir(&mut self, dir: &FilePath) -> bool;

    /// Renames `old_path` to `new_path`.
    fn move_path(&mut self, old_path: &FilePath, new_path: &FilePath) -> bool;

    /// Returns whether `path` exists.
    fn exists(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.exists())
    }

    /// Returns whether `path` is a directory.
    fn is_dir(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_dir())
    }

    /// Returns whether `path` is a regular file or a symlink.
    fn is_file(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_file())
    }

    /// Returns whether `path` is a regular file.
    fn is_reg_file(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_reg_file())
    }

    /// Returns whether `path` is a symbolic link.
    fn is_sym_link(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_sym_link())
    }

    /// Returns whether `path` is of any other kind.
    fn is_other(&mut self, path: &FilePath) -> bool {
        self.stat(path).is_some_and(|stat| stat.is_other())
    }

    /// Returns the size of `path` in bytes.
    fn file_size(&mut self, path: &FilePath) -> Option<u64> {
        self.stat(path).map(|stat| stat.file_size())
    }

    /// Renames `old_path` to `old_path.unix_timestamp` when it exists.
    /// Returns the backup path on success, `None` when there was
    /// nothing to back up or the move failed.
    fn backup_if_exists(&mut self, old_path: &FilePath) -> Option<FilePath> {
        if is_stdin_stdout_path(old_path.as_str()) {
            error!("invalid backup path: {old_path}");
            return None;
        }
        if !self.exists(old_path) {
            return None;
        }
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let new_path = FilePath::new(format!("{old_path}.{now}"));
        self.move_path(old_path, &new_path).then_some(new_path)
    }
}

/// The local-disk backend of the file-system interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    fn stat_path(path: &str) -> Option<FileStat> {
        let meta = std::fs::symlink_metadata(path).ok()?;
        let file_type = if meta.file_type().is_dir() {
            FileType::Dir
        } else if meta.file_type().is_symlink() {
            FileType::SymLink
        } else if meta.file_type().is_file() {
            FileType::RegFile
        } else {
            FileType::Other
        };
        Some(FileStat::new(file_type, meta.len()))
    }

    fn list_impl(
        &mut self,
        path: &FilePath,
        skip_dir: bool,
        recursive: bool,
    ) -> Option<Vec<(FilePath, FileStat)>> {
        let stat = self.stat(path)?;
        if stat.is_file() {
            return Some(vec![(path.clone(), stat)]);
        }

        let mut children = Vec::new();
        let mut pending = vec![path.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(dir.as_str()) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("failed to list {dir}: {e}");
                    return None;
                }
            };
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        error!("failed to list {dir}: {e}");
                        return None;
                    }
                };
                let child_path = FilePath::new(entry.path().to_string_lossy().into_owned());
                let Some(child_stat) = Self::stat_path(child_path.as_str()) else {
                    continue;
                };
                if child_stat.is_dir() {
                    if recursive {
                        pending.push(child_path.clone());
                    }
                    if skip_dir {
                        continue;
                    }
                }
                children.push((child_path, child_stat));
            }
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Some(children)
    }
}

impl FileSystem for LocalFileSystem {
    fn stat(&mut self, path: &FilePath) -> Option<FileStat> {
        if is_stdin_stdout_path(path.as_str()) {
            return Some(FileStat::stdin_stdout());
        }
        Self::stat_path(path.as_str())
    }

    fn list(&mut self, path: &FilePath, skip_dir: bool) -> Option<Vec<(FilePath, FileStat)>> {
        if is_stdin_stdout_path(path.as_str()) {
            error!("invalid path: {path}");
            return None;
        }
        self.list_impl(path, skip_dir, false)
    }

    fn list_recursive(
        &mut self,
        path: &FilePath,
        skip_dir: bool,
    ) -> Option<Vec<(FilePath, FileStat)>> {
        if is_stdin_stdout_path(path.as_str()) {
            error!("invalid path: {path}");
            return None;
        }
        self.list_impl(path, skip_dir, true)
    }

    fn make_dir(&mut self, dir: &FilePath) -> bool {
        if is_stdin_stdout_path(dir.as_str()) {
            error!("invalid dir: {dir}");
            return false;
        }
        match std::fs::create_dir_all(dir.as_str()) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to make dir {dir}: {e}");
                false
            }
        }
    }

    fn move_path(&mut self, old_path: &FilePath, new_path: &FilePath) -> bool {
        if is_stdin_stdout_path(old_path.as_str()) || is_stdin_stdout_path(new_path.as_str()) {
            error!("invalid path: {old_path} -> {new_path}");
            return false;
        }
        match std::fs::rename(old_path.as_str(), new_path.as_str()) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to move {old_path} -> {new_path}: {e}");
                false
            }
        }
    }
}

/// Splits an `hdfs://host[:port]/...` path into its name-node address;
/// `hdfs:///...` names the default name node.
pub(crate) fn parse_hdfs_name_node(path: &str) -> Option<(String, u16)> {
    let rest = path.strip_prefix("hdfs://")?;
    let slash = match rest.find('/') {
        Some(slash) => slash,
        None => {
            error!("invalid hdfs path: {path}");
            return None;
        }
    };
    if slash == 0 {
        return Some(("default".to_string(), 0));
    }
    let authority = &rest[..slash];
    match authority.find(':') {
        None => Some((authority.to_string(), 0)),
        Some(colon) => {
            let host = authority[..colon].to_string();
            match authority[colon + 1..].parse() {
                Ok(port) => Some((host, port)),
                Err(_) => {
                    error!("invalid hdfs path: {path}");
                    None
                }
            }
        }
    }
}

/// A file system dispatching on the path scheme: `hdfs://` paths go to
/// the HDFS backend, everything else to the local one.
#[derive(Default)]
pub struct AutoFileSystem {
    fs: Option<Box<dyn FileSystem>>,
}

impl AutoFileSystem {
    /// Creates a closed file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the backend matching `path`, connecting to its name node
    /// for an HDFS path.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::HdfsUnavailable`],
    /// [`StreamError::InvalidHdfsPath`] or [`StreamError::HdfsConnect`]
    /// when the HDFS backend cannot be bound.
    pub fn open(&mut self, path: &str) -> Result<(), StreamError> {
        self.close();

        if is_hdfs_path(path) {
            #[cfg(unix)]
            {
                use crate::io::hdfs::{HdfsFileSystem, HdfsHandle};
                if !crate::io::hdfs::has_hdfs() {
                    return Err(StreamError::HdfsUnavailable);
                }
                let (host, port) = parse_hdfs_name_node(path)
                    .ok_or_else(|| StreamError::InvalidHdfsPath(path.to_string()))?;
                let handle = HdfsHandle::connect(&host, port)?;
                self.fs = Some(Box::new(HdfsFileSystem::new(handle)));
                return Ok(());
            }
            #[cfg(not(unix))]
            return Err(StreamError::HdfsUnavailable);
        }

        self.fs = Some(Box::new(LocalFileSystem));
        Ok(())
    }

    /// Returns whether a backend is bound.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.fs.is_some()
    }

    /// Unbinds the backend.
    pub fn close(&mut self) {
        self.fs = None;
    }

    fn with_backend<R>(&mut self, f: impl FnOnce(&mut dyn FileSystem) -> Option<R>) -> Option<R> {
        match &mut self.fs {
            Some(fs) => f(fs.as_mut()),
            None => None,
        }
    }

    /// One-shot [`FileSystem::exists`] over the backend matching
    /// `path`.
    #[must_use]
    pub fn path_exists(path: &str) -> bool {
        let mut fs = Self::new();
        fs.open(path).is_ok() && fs.exists(&FilePath::new(path))
    }

    /// One-shot [`FileSystem::is_dir`].
    #[must_use]
    pub fn path_is_dir(path: &str) -> bool {
        let mut fs = Self::new();
        fs.open(path).is_ok() && fs.is_dir(&FilePath::new(path))
    }

    /// One-shot [`FileSystem::is_file`].
    #[must_use]
    pub fn path_is_file(path: &str) -> bool {
        let mut fs = Self::new();
        fs.open(path).is_ok() && fs.is_file(&FilePath::new(path))
    }

    /// One-shot [`FileSystem::file_size`].
    #[must_use]
    pub fn path_file_size(path: &str) -> Option<u64> {
        let mut fs = Self::new();
        fs.open(path).ok()?;
        fs.file_size(&FilePath::new(path))
    }

    /// One-shot [`FileSystem::list`], returning paths only.
    #[must_use]
    pub fn list_path(path: &str, skip_dir: bool) -> Option<Vec<String>> {
        let mut fs = Self::new();
        fs.open(path).ok()?;
        let children = fs.list(&FilePath::new(path), skip_dir)?;
        Some(children.into_iter().map(|(p, _)| p.as_str().to_string()).collect())
    }

    /// One-shot [`FileSystem::list_recursive`], returning paths only.
    #[must_use]
    pub fn list_path_recursive(path: &str, skip_dir: bool) -> Option<Vec<String>> {
        let mut fs = Self::new();
        fs.open(path).ok()?;
        let children = fs.list_recursive(&FilePath::new(path), skip_dir)?;
        Some(children.into_iter().map(|(p, _)| p.as_str().to_string()).collect())
    }

    /// One-shot [`FileSystem::make_dir`].
    #[must_use]
    pub fn make_dir_path(dir: &str) -> bool {
        let mut fs = Self::new();
        fs.open(dir).is_ok() && fs.make_dir(&FilePath::new(dir))
    }

    /// One-shot [`FileSystem::move_path`].
    #[must_use]
    pub fn move_paths(old_path: &str, new_path: &str) -> bool {
        let mut fs = Self::new();
        fs.open(old_path).is_ok() && fs.move_path(&FilePath::new(old_path), &FilePath::new(new_path))
    }

    /// One-shot [`FileSystem::backup_if_exists`], returning the backup
    /// path.
    #[must_use]
    pub fn backup_path_if_exists(old_path: &str) -> Option<String> {
        let mut fs = Self::new();
        fs.open(old_path).ok()?;
        fs.backup_if_exists(&FilePath::new(old_path)).map(|p| p.as_str().to_string())
    }
}

impl FileSystem for AutoFileSystem {
    fn stat(&mut self, path: &FilePath) -> Option<FileStat> {
        self.with_backend(|fs| fs.stat(path))
    }

    fn list(&mut self, path: &FilePath, skip_dir: bool) -> Option<Vec<(FilePath, FileStat)>> {
        self.with_backend(|fs| fs.list(path, skip_dir))
    }

    fn list_recursive(
        &mut self,
        path: &FilePath,
        skip_dir: bool,
    ) -> Option<Vec<(FilePath, FileStat)>> {
        self.with_backend(|fs| fs.list_recursive(path, skip_dir))
    }

    fn make_dir(&mut self, dir: &FilePath) -> bool {
        self.with_backend(|fs| fs.make_dir(dir).then_some(())).is_some()
    }

    fn move_path(&mut self, old_path: &FilePath, new_path: &FilePath) -> bool {
        self.with_backend(|fs| fs.move_path(old_path, new_path).then_some(())).is_some()
    }
}
