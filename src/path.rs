// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Decide how a user-supplied path is resolved to an absolute location on
//! disk, and which __storage form__ (absolute or home-relative) gets
//! persisted into the registry for it. Every function that needs the home
//! directory takes it as an explicit argument instead of reading ambient
//! process state.

use std::{
    fs,
    path::{Path, PathBuf},
};

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Resolve user input to an absolute path.
///
/// Absolute input is used as-is. Relative input is joined onto the current
/// working directory. Does not check that the result exists.
///
/// # Errors
///
/// - Return [`std::io::Error`] if the current working directory cannot be
///   determined.
pub fn absolutize(input: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let input = input.as_ref();
    if input.is_absolute() {
        Ok(input.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(input))
    }
}

/// Compute the storage form of a resolved path.
///
/// The registry stays portable across machines by storing paths under the
/// home directory relative to it, but an explicitly absolute input is never
/// rewritten. Precedence:
///
/// 1. Original input was absolute: store the absolute path.
/// 2. Resolved path lies under `home`: store it home-relative.
/// 3. Otherwise: store the absolute path.
pub fn storage_form(input: impl AsRef<Path>, resolved: &Path, home: &Path) -> String {
    if input.as_ref().is_absolute() {
        return resolved.to_string_lossy().into_owned();
    }

    match resolved.strip_prefix(home) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => resolved.to_string_lossy().into_owned(),
    }
}

/// Resolve a stored form back to an absolute path.
///
/// Inverse of [`storage_form`]: a stored value is either already absolute,
/// or relative to the home directory. No other interpretation exists.
pub fn resolve_stored(stored: impl AsRef<Path>, home: &Path) -> PathBuf {
    let stored = stored.as_ref();
    if stored.is_absolute() {
        stored.to_path_buf()
    } else {
        home.join(stored)
    }
}

/// Read the target a symbolic link points to, as an absolute path.
///
/// Returns [`None`] if `link` is not a symbolic link. A relative link target
/// is resolved against the link's parent directory, matching how the
/// operating system resolves it.
pub fn link_target(link: impl AsRef<Path>) -> Option<PathBuf> {
    let link = link.as_ref();
    let target = fs::read_link(link).ok()?;
    if target.is_absolute() {
        Some(target)
    } else {
        Some(link.parent().map(|dir| dir.join(&target)).unwrap_or(target))
    }
}

/// Create a symbolic link at `link` pointing to `original`.
#[cfg(unix)]
pub fn symlink(original: impl AsRef<Path>, link: impl AsRef<Path>) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

/// Create a symbolic link at `link` pointing to `original`.
#[cfg(windows)]
pub fn symlink(original: impl AsRef<Path>, link: impl AsRef<Path>) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
