// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

//! Symlink reconciliation operations.
//!
//! The operations behind every Sym subcommand: initialize the config
//! pointer, link a dotfile into place, unlink it again, and verify the
//! registry against the filesystem. Each operation takes the home directory
//! as an explicit argument, validates its inputs before touching anything,
//! and performs at most one load-mutate-persist cycle against the registry.
//!
//! # Failure Atomicity
//!
//! A failing step leaves both the filesystem and the registry as they were:
//! no symlink is created when input validation fails, and no registry write
//! happens when the filesystem step failed. All filesystem checks go through
//! a symlink-aware stat, so a dangling link counts as present rather than
//! absent.
//!
//! These operations never print. They return typed errors and report values;
//! presentation belongs to the command line layer.

use crate::{
    config::Registry,
    path,
    registry::{RegistryError, RegistryStore, REGISTRY_FILE_NAME},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Initialize the config pointer for a dotfiles repository.
///
/// Resolves `basedir` to an absolute repository path, creates the pointer
/// symlink at `<home>/.symconfig` aimed at the registry file inside the
/// repository, and creates an empty registry document there if none exists
/// yet. The pointer is never overwritten: re-initialization is a reportable
/// failure.
///
/// # Errors
///
/// - Return [`LinkError::PathNotFound`] if `basedir` is relative and does
///   not exist.
/// - Return [`LinkError::AlreadyExists`] if the pointer already exists,
///   reporting the path it currently resolves to.
#[instrument(skip_all, level = "debug")]
pub fn init(basedir: impl AsRef<Path>, home: impl AsRef<Path>) -> Result<()> {
    let (basedir, home) = (basedir.as_ref(), home.as_ref());
    let basedir = if basedir.is_absolute() {
        basedir.to_path_buf()
    } else if basedir.exists() {
        path::absolutize(basedir).map_err(|err| LinkError::Io {
            source: err,
            path: basedir.to_path_buf(),
        })?
    } else {
        return Err(LinkError::PathNotFound {
            path: basedir.to_path_buf(),
        });
    };

    let registry_path = basedir.join(REGISTRY_FILE_NAME);
    let pointer_path = RegistryStore::pointer_path(home);
    if pointer_path.symlink_metadata().is_ok() {
        let target = path::link_target(&pointer_path).unwrap_or_else(|| pointer_path.clone());
        return Err(LinkError::AlreadyExists {
            path: pointer_path,
            target,
        });
    }

    path::symlink(&registry_path, &pointer_path).map_err(|err| LinkError::Io {
        source: err,
        path: pointer_path.clone(),
    })?;
    info!(
        "created pointer {:?} -> {:?}",
        pointer_path.display(),
        registry_path.display()
    );

    if registry_path.symlink_metadata().is_err() {
        RegistryStore::at(registry_path).save(&Registry::default())?;
    }

    Ok(())
}

/// Link a dotfile from the repository into its canonical destination.
///
/// Resolves both inputs to absolute paths, creates the symlink
/// `destination -> source` when the destination is free, and records the
/// pair in the registry in storage form. A destination that already points
/// at the source is treated as satisfied rather than an error, which makes
/// the operation idempotent; the registry is still updated in that case.
///
/// # Errors
///
/// - Return [`LinkError::PathNotFound`] if the resolved source does not
///   exist.
/// - Return [`LinkError::AlreadyExists`] if the destination exists and does
///   not resolve to the source. The filesystem is left untouched.
/// - Return [`LinkError::Registry`] if no registry has been initialized, or
///   it cannot be loaded or persisted.
#[instrument(skip_all, level = "debug")]
pub fn link(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    home: impl AsRef<Path>,
) -> Result<LinkOutcome> {
    let (source, destination, home) = (source.as_ref(), destination.as_ref(), home.as_ref());
    let source_abs = path::absolutize(source).map_err(|err| LinkError::Io {
        source: err,
        path: source.to_path_buf(),
    })?;
    let destination_abs = path::absolutize(destination).map_err(|err| LinkError::Io {
        source: err,
        path: destination.to_path_buf(),
    })?;

    if source_abs.symlink_metadata().is_err() {
        return Err(LinkError::PathNotFound { path: source_abs });
    }

    // Validate registry access before mutating the filesystem.
    let store = RegistryStore::open(home)?;
    let mut registry = store.load()?;

    let outcome = match destination_abs.symlink_metadata() {
        Ok(_) => match path::link_target(&destination_abs) {
            Some(target) if target == source_abs => {
                debug!(
                    "{:?} already links to {:?}",
                    destination_abs.display(),
                    source_abs.display()
                );
                LinkOutcome::AlreadySatisfied
            }
            Some(target) => {
                return Err(LinkError::AlreadyExists {
                    path: destination_abs,
                    target,
                })
            }
            None => {
                return Err(LinkError::AlreadyExists {
                    path: destination_abs.clone(),
                    target: destination_abs,
                })
            }
        },
        Err(_) => {
            path::symlink(&source_abs, &destination_abs).map_err(|err| LinkError::Io {
                source: err,
                path: destination_abs.clone(),
            })?;
            info!(
                "created symlink {:?} -> {:?}",
                destination_abs.display(),
                source_abs.display()
            );
            LinkOutcome::Created
        }
    };

    let source_form = path::storage_form(source, &source_abs, home);
    let destination_form = path::storage_form(destination, &destination_abs, home);
    registry.symlinks.insert(destination_form, source_form);
    store.save(&registry)?;

    Ok(outcome)
}

/// Unlink a tracked dotfile and drop it from the registry.
///
/// Locates the registry entry whose stored destination resolves to the given
/// destination. The on-disk symlink is removed only while it still points at
/// the recorded source; a link that was repointed elsewhere is user data and
/// stays put. A symlink that already vanished is treated as satisfied, and
/// only the registry entry is dropped.
///
/// # Errors
///
/// - Return [`LinkError::NotTracked`] if no registry entry matches.
/// - Return [`LinkError::ExternallyModified`] if the on-disk link diverges
///   from the recorded source. Nothing is removed.
/// - Return [`LinkError::Registry`] if no registry has been initialized, or
///   it cannot be loaded or persisted.
#[instrument(skip_all, level = "debug")]
pub fn unlink(destination: impl AsRef<Path>, home: impl AsRef<Path>) -> Result<()> {
    let (destination, home) = (destination.as_ref(), home.as_ref());
    let destination_abs = path::absolutize(destination).map_err(|err| LinkError::Io {
        source: err,
        path: destination.to_path_buf(),
    })?;

    let store = RegistryStore::open(home)?;
    let mut registry = store.load()?;

    let key = registry
        .symlinks
        .keys()
        .find(|stored| path::resolve_stored(stored, home) == destination_abs)
        .cloned()
        .ok_or_else(|| LinkError::NotTracked {
            path: destination_abs.clone(),
        })?;
    let source_abs = path::resolve_stored(&registry.symlinks[&key], home);

    if destination_abs.symlink_metadata().is_ok() {
        match path::link_target(&destination_abs) {
            Some(target) if target == source_abs => {
                fs::remove_file(&destination_abs).map_err(|err| LinkError::Io {
                    source: err,
                    path: destination_abs.clone(),
                })?;
                info!("removed symlink {:?}", destination_abs.display());
            }
            Some(target) => {
                return Err(LinkError::ExternallyModified {
                    path: destination_abs,
                    expected: source_abs,
                    found: target,
                })
            }
            None => {
                return Err(LinkError::ExternallyModified {
                    path: destination_abs.clone(),
                    expected: source_abs,
                    found: destination_abs,
                })
            }
        }
    }

    registry.symlinks.remove(&key);
    store.save(&registry)?;

    Ok(())
}

/// Verify every registry entry against the filesystem.
///
/// Resolves each stored destination and source back to absolute paths and
/// classifies the entry. Read-only: mutates neither the filesystem nor the
/// registry.
///
/// # Errors
///
/// - Return [`LinkError::Registry`] if no registry has been initialized, or
///   it cannot be loaded.
#[instrument(skip_all, level = "debug")]
pub fn verify(home: impl AsRef<Path>) -> Result<VerifyReport> {
    let home = home.as_ref();
    let store = RegistryStore::open(home)?;
    let registry = store.load()?;

    let entries = registry
        .symlinks
        .iter()
        .map(|(destination, source)| {
            let destination = path::resolve_stored(destination, home);
            let source = path::resolve_stored(source, home);
            let status = classify(&destination, &source);
            VerifyEntry {
                destination,
                source,
                status,
            }
        })
        .collect();

    Ok(VerifyReport { entries })
}

fn classify(destination: &Path, source: &Path) -> LinkStatus {
    if destination.symlink_metadata().is_err() {
        return LinkStatus::Missing;
    }

    match path::link_target(destination) {
        Some(target) if target == *source => {
            if source.symlink_metadata().is_ok() {
                LinkStatus::Ok
            } else {
                LinkStatus::Broken
            }
        }
        _ => LinkStatus::Mismatched,
    }
}

/// Filesystem outcome of a [`link`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new symlink was created.
    Created,

    /// The destination already pointed at the source; only the registry was
    /// updated.
    AlreadySatisfied,
}

/// Classification of a single registry entry during [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Destination is a symlink to the recorded source, and the source
    /// exists.
    Ok,

    /// Destination is absent from the filesystem.
    Missing,

    /// Destination exists but is not a symlink to the recorded source.
    Mismatched,

    /// Destination links to the recorded source, but the source is gone.
    Broken,
}

impl Display for LinkStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::Mismatched => "mismatched",
            Self::Broken => "broken",
        };
        fmt.write_str(label)
    }
}

/// One verified registry entry with resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyEntry {
    /// Destination resolved to an absolute path.
    pub destination: PathBuf,

    /// Source resolved to an absolute path.
    pub source: PathBuf,

    /// Classification of the entry.
    pub status: LinkStatus,
}

/// Report over every registry entry produced by [`verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Entries in registry order.
    pub entries: Vec<VerifyEntry>,
}

impl VerifyReport {
    /// Whether every entry verified as [`LinkStatus::Ok`].
    pub fn is_clean(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.status == LinkStatus::Ok)
    }
}

/// Symlink reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Supplied base or source path does not exist.
    #[error("path {:?} does not exist", path.display())]
    PathNotFound { path: PathBuf },

    /// Pointer or destination already present, and not equivalent to the
    /// requested link.
    #[error("{:?} already exists and resolves to {:?}", path.display(), target.display())]
    AlreadyExists { path: PathBuf, target: PathBuf },

    /// Destination is not recorded in the registry.
    #[error("{:?} is not tracked in the registry", path.display())]
    NotTracked { path: PathBuf },

    /// On-disk symlink diverges from the registry record.
    #[error(
        "{:?} was modified externally: expected link to {:?}, found {:?}",
        path.display(),
        expected.display(),
        found.display()
    )]
    ExternallyModified {
        path: PathBuf,
        expected: PathBuf,
        found: PathBuf,
    },

    /// Registry persistence fails.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Filesystem operation fails.
    #[error("filesystem operation failed at {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::write;

    #[test]
    fn classify_ok_entry() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("vimrc");
        let destination = dir.path().join(".vimrc");
        write(&source, "set number")?;
        path::symlink(&source, &destination)?;

        assert_eq!(classify(&destination, &source), LinkStatus::Ok);

        Ok(())
    }

    #[test]
    fn classify_missing_entry() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("vimrc");
        write(&source, "set number")?;

        let destination = dir.path().join(".vimrc");
        assert_eq!(classify(&destination, &source), LinkStatus::Missing);

        Ok(())
    }

    #[test]
    fn classify_mismatched_entry() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("vimrc");
        let other = dir.path().join("other");
        let destination = dir.path().join(".vimrc");
        write(&source, "set number")?;
        write(&other, "something else")?;
        path::symlink(&other, &destination)?;

        assert_eq!(classify(&destination, &source), LinkStatus::Mismatched);

        Ok(())
    }

    #[test]
    fn classify_plain_file_as_mismatched() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("vimrc");
        let destination = dir.path().join(".vimrc");
        write(&source, "set number")?;
        write(&destination, "not a symlink")?;

        assert_eq!(classify(&destination, &source), LinkStatus::Mismatched);

        Ok(())
    }

    #[test]
    fn classify_broken_entry() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("vimrc");
        let destination = dir.path().join(".vimrc");
        path::symlink(&source, &destination)?;

        assert_eq!(classify(&destination, &source), LinkStatus::Broken);

        Ok(())
    }

    #[test]
    fn report_cleanliness() {
        let clean = VerifyReport {
            entries: vec![VerifyEntry {
                destination: "/tmp/home/.vimrc".into(),
                source: "/tmp/repo/vimrc".into(),
                status: LinkStatus::Ok,
            }],
        };
        assert!(clean.is_clean());

        let dirty = VerifyReport {
            entries: vec![VerifyEntry {
                destination: "/tmp/home/.vimrc".into(),
                source: "/tmp/repo/vimrc".into(),
                status: LinkStatus::Missing,
            }],
        };
        assert!(!dirty.is_clean());

        assert!(VerifyReport::default().is_clean());
    }
}
