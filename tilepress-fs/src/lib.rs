//! Filesystem helpers shared by the conversion pipeline and the CLI.
//!
//! All access goes through `cap-std` directory handles opened with ambient
//! authority, and all paths are UTF-8 (`camino`), so the rest of the
//! workspace never touches `std::fs` directly.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open an existing file for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Return whether `path` names a regular file.
///
/// A missing path surfaces as an [`io::ErrorKind::NotFound`] error so callers
/// can tell "absent" apart from "present but a directory".
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Create every missing directory above `path`.
///
/// Paths without a parent, or whose parent is the filesystem root, need no
/// work and succeed immediately.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (anchor, relative) = split_anchor(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&relative)
}

/// Swap a trailing `suffix` of the file name for `replacement`.
///
/// When the file name does not end with `suffix` (compared ASCII
/// case-insensitively) the replacement is appended instead, so
/// `planet.osm.pbf` becomes `planet.mbtiles` and `planet.bin` becomes
/// `planet.bin.mbtiles`.
#[must_use]
pub fn replace_suffix(path: &Utf8Path, suffix: &str, replacement: &str) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or_default();
    let stem = file_name
        .len()
        .checked_sub(suffix.len())
        .and_then(|cut| {
            let (head, tail) = file_name.split_at_checked(cut)?;
            tail.eq_ignore_ascii_case(suffix).then_some(head)
        })
        .unwrap_or(file_name);
    path.with_file_name(format!("{stem}{replacement}"))
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Split `dir` into an ambient anchor directory (root, drive or `.`) and the
/// remaining relative components, which is the shape `cap-std` needs for
/// `create_dir_all`.
fn split_anchor(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();

    let (anchor, std_relative) = match std_dir.components().next() {
        // Windows drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let anchor =
                Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(anchor.as_std_path())
                .or_else(|_| std_dir.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from directory"))?
                .to_path_buf();
            (anchor, relative)
        }
        Some(Component::RootDir) => {
            let anchor = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(anchor.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from directory"))?
                .to_path_buf();
            (anchor, relative)
        }
        _ => (Utf8PathBuf::from("."), std_dir.to_path_buf()),
    };

    let handle = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(std_relative)
        .map_err(|_| io::Error::other("non-UTF-8 directory path"))?;
    Ok((handle, relative))
}
