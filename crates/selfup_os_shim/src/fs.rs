use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::ffi::OsStrExt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use tracing::trace;
use walkdir::WalkDir;

use crate::Shim;

#[derive(Debug, Clone, Default)]
pub struct Fs(inner::Inner);

mod inner {
    use std::sync::Arc;

    use tempfile::TempDir;

    #[derive(Debug, Clone, Default)]
    pub(super) enum Inner {
        #[default]
        Real,
        /// Uses the real filesystem except acts as if the process has
        /// a different root directory by using [TempDir]
        Chroot(Arc<TempDir>),
    }
}

impl Fs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a chroot [Fs] rooted in a fresh temporary directory.
    pub fn new_chroot() -> io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        Ok(Self(inner::Inner::Chroot(Arc::new(tempdir))))
    }

    pub fn is_chroot(&self) -> bool {
        matches!(self.0, inner::Inner::Chroot(_))
    }

    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::create_dir_all(self.chroot_path(path))
    }

    pub fn read_to_string(&self, path: impl AsRef<Path>) -> io::Result<String> {
        fs::read_to_string(self.chroot_path(path))
    }

    /// Writes `contents` to `path`, creating any missing parent directories.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<()> {
        let path = self.chroot_path(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    /// Returns `true` if the path points at an existing entity.
    ///
    /// This is a proxy to [std::path::Path::exists].
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.chroot_path(path).exists()
    }

    /// Returns `true` if the path exists and is a directory, following symlinks.
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.chroot_path(path).is_dir()
    }

    /// Queries the metadata of a path, following symlinks.
    ///
    /// This is a proxy to [`std::fs::metadata`].
    pub fn metadata(&self, path: impl AsRef<Path>) -> io::Result<fs::Metadata> {
        fs::metadata(self.chroot_path(path))
    }

    /// Returns the entries of a directory sorted by file name.
    ///
    /// The returned paths are `path` joined with each entry name, so they stay in the
    /// caller's view of the filesystem when using a chroot.
    pub fn read_dir_sorted(&self, path: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
        let path = path.as_ref();
        let mut names = fs::read_dir(self.chroot_path(path))?
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names.into_iter().map(|name| path.join(name)).collect())
    }

    /// Removes a directory at this path, after removing all its contents. Use carefully!
    ///
    /// This is a proxy to [`std::fs::remove_dir_all`].
    pub fn remove_dir_all(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::remove_dir_all(self.chroot_path(path))
    }

    /// Renames a file or directory to a new name.
    ///
    /// This will not work if the new name is on a different mount point.
    ///
    /// This is a proxy to [`std::fs::rename`].
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> io::Result<()> {
        fs::rename(self.chroot_path(from), self.chroot_path(to))
    }

    /// Recursively copies the tree rooted at `from` into `to`, creating `to` and any
    /// intermediate directories.
    ///
    /// Entries are visited depth first in file name order and symlinks are followed. The
    /// copy stops at the first error; whatever was copied up to that point stays in place.
    ///
    /// Returns the number of files copied.
    pub fn copy_dir_all(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> io::Result<u64> {
        let from = self.chroot_path(from);
        let to = self.chroot_path(to);
        let mut copied = 0;

        for entry in WalkDir::new(&from).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let relative = entry.path().strip_prefix(&from).map_err(io::Error::other)?;
            let target = to.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                trace!(from = ?entry.path(), to = ?target, "copying file");
                fs::copy(entry.path(), &target)?;
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Creates a new symbolic link on the filesystem.
    ///
    /// The `link` path will be a symbolic link pointing to the `original` path.
    ///
    /// This is a proxy to [`std::os::unix::fs::symlink`].
    #[cfg(unix)]
    pub fn symlink(&self, original: impl AsRef<Path>, link: impl AsRef<Path>) -> io::Result<()> {
        std::os::unix::fs::symlink(self.chroot_path(original), self.chroot_path(link))
    }

    /// For test [Fs]'s that use a different root, returns an absolute path.
    ///
    /// This must be used for any paths indirectly used by code using a chroot
    /// [Fs].
    pub fn chroot_path(&self, path: impl AsRef<Path>) -> PathBuf {
        use inner::Inner;
        match &self.0 {
            Inner::Chroot(root) => append(root.path(), path),
            Inner::Real => path.as_ref().to_path_buf(),
        }
    }
}

impl Shim for Fs {
    fn is_real(&self) -> bool {
        matches!(self.0, inner::Inner::Real)
    }
}

/// Performs `a.join(b)`, except:
/// - if `b` is an absolute path, then the resulting path will equal `/a/b`
/// - if the prefix of `b` contains some `n` copies of a, then the resulting path will equal `/a/b`
#[cfg(unix)]
fn append(a: impl AsRef<Path>, b: impl AsRef<Path>) -> PathBuf {
    use std::ffi::OsStr;

    let a = a.as_ref().as_os_str().as_bytes();
    let mut b = b.as_ref().as_os_str().as_bytes();
    while let Some(rest) = b.strip_prefix(a) {
        b = rest;
    }
    while let Some(rest) = b.strip_prefix(b"/") {
        b = rest;
    }
    Path::new(OsStr::from_bytes(a)).join(OsStr::from_bytes(b))
}

#[cfg(windows)]
fn append(a: impl AsRef<Path>, b: impl AsRef<Path>) -> PathBuf {
    let a_path = a.as_ref();
    let a_str = a_path.to_string_lossy().replace('/', "\\");
    let a_without_drive = strip_drive(&a_str);

    let b_str = b.as_ref().to_string_lossy().replace('/', "\\");
    let mut b_rest = strip_drive(&b_str);
    while let Some(rest) = b_rest.strip_prefix(a_without_drive) {
        if a_without_drive.is_empty() {
            break;
        }
        b_rest = rest;
    }
    a_path.join(b_rest.trim_start_matches('\\'))
}

#[cfg(windows)]
fn strip_drive(path: &str) -> &str {
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        &path[2..]
    } else {
        path
    }
}
