//! Filesystem helpers for the location store, built on `cap-std` and `camino`.
//!
//! Every helper resolves an ambient directory for the parent of the target
//! path and then works relative to that directory handle. Writes go through
//! [`write_atomic`], which stages the payload in a sibling file and renames it
//! over the destination so readers never observe a half-written document.
//! Writers in different processes coordinate through [`lock_exclusive`].
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use fs4::fs_std::FileExt;
use std::io::{self, Write};
use std::path::Component;
use std::sync::atomic::{AtomicU64, Ordering};

static STAGING_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Resolve an ambient directory for the given path and return the directory with the file name.
///
/// A bare file name resolves against the current directory.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Read the whole file at `path` as UTF-8 text.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let (dir, file_name) = open_dir_and_file(path)?;
    dir.read_to_string(file_name.as_str())
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Replace the file at `path` with `contents` in a single rename.
///
/// The payload is written to a hidden sibling, flushed to disk, and then
/// renamed over the destination. Parent directories are created on demand.
/// On failure the staging file is removed and the destination is untouched.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, file_name) = open_dir_and_file(path)?;
    let staging = staging_name(&file_name);

    let outcome = write_and_sync(&dir, &staging, contents)
        .and_then(|()| dir.rename(&staging, &dir, &file_name));
    if outcome.is_err() {
        // Best-effort cleanup; the write error is returned.
        drop(dir.remove_file(&staging));
    }
    outcome
}

fn staging_name(file_name: &str) -> String {
    let sequence = STAGING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(".{file_name}.{}.{sequence}.tmp", std::process::id())
}

/// An exclusive advisory lock on a file, released when dropped.
#[derive(Debug)]
pub struct FileLock {
    _file: std::fs::File,
    path: Utf8PathBuf,
}

impl FileLock {
    /// Location of the lock file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Block until this handle holds an exclusive advisory lock on `path`.
///
/// The lock file and its parent directories are created on demand and left
/// in place afterwards. Every holder, in this process or another, must open
/// its own handle; the lock is released when the returned guard is dropped.
pub fn lock_exclusive(path: &Utf8Path) -> io::Result<FileLock> {
    ensure_parent_dir(path)?;
    let (dir, file_name) = open_dir_and_file(path)?;
    let mut options = fs_utf8::OpenOptions::new();
    options.create(true).write(true);
    let file = dir.open_with(file_name.as_str(), &options)?.into_std();
    FileExt::lock_exclusive(&file)?;
    Ok(FileLock {
        _file: file,
        path: path.to_path_buf(),
    })
}

fn write_and_sync(dir: &fs_utf8::Dir, name: &str, contents: &[u8]) -> io::Result<()> {
    let mut file = dir.create(name)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Split an absolute or relative parent path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR_STR);
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR);
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative))
}
