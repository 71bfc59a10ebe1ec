// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

//! Registry persistence.
//!
//! Load and save the registry document through the __config pointer__: a
//! symbolic link at a fixed location in the user's home directory that
//! indirects to the real registry file inside the user-chosen repository
//! directory. The indirection lets the repository move or be re-cloned
//! without the home directory needing to change, and lets Sym detect
//! "already initialized" by testing for the pointer instead of the registry.
//!
//! # Crash Safety
//!
//! Saves are atomic with respect to process crashes: the document is written
//! to a temporary file in the same directory and renamed over the target, so
//! a crash mid-write never leaves a truncated registry behind. There is no
//! inter-process locking; concurrent invocations against the same registry
//! race and the last writer wins.

use crate::config::{ConfigError, Registry};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Fixed name of the registry file inside the repository directory.
pub const REGISTRY_FILE_NAME: &str = "symconfig.toml";

/// Fixed name of the config pointer inside the home directory.
pub const POINTER_FILE_NAME: &str = ".symconfig";

/// Handle on the registry file.
///
/// Owns only the path to the registry document. The document itself is a
/// plain [`Registry`] record, so alternate storage backends only need to
/// replace this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryStore {
    registry_path: PathBuf,
}

impl RegistryStore {
    /// Open the registry store through the config pointer.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::NotInitialized`] if the pointer does not
    ///   exist or cannot be read as a symbolic link.
    #[instrument(skip_all, level = "debug")]
    pub fn open(home: impl AsRef<Path>) -> Result<Self> {
        let pointer_path = Self::pointer_path(home.as_ref());
        let target = fs::read_link(&pointer_path).map_err(|_| RegistryError::NotInitialized {
            pointer_path: pointer_path.clone(),
        })?;

        // A relative pointer target resolves against the pointer's directory.
        let registry_path = if target.is_absolute() {
            target
        } else {
            home.as_ref().join(target)
        };
        debug!(
            "pointer {:?} -> {:?}",
            pointer_path.display(),
            registry_path.display()
        );

        Ok(Self { registry_path })
    }

    /// Construct a store addressing the registry file directly.
    ///
    /// Used during initialization, before the pointer exists.
    pub fn at(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
        }
    }

    /// Fixed location of the config pointer for a given home directory.
    pub fn pointer_path(home: impl AsRef<Path>) -> PathBuf {
        home.as_ref().join(POINTER_FILE_NAME)
    }

    /// Absolute path of the registry file this store addresses.
    pub fn path(&self) -> &Path {
        &self.registry_path
    }

    /// Load the registry document from disk.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::Read`] if the registry file cannot be read.
    /// - Return [`RegistryError::Parse`] if the document is malformed.
    #[instrument(skip_all, level = "debug")]
    pub fn load(&self) -> Result<Registry> {
        let content = fs::read_to_string(&self.registry_path).map_err(|err| RegistryError::Read {
            source: err,
            registry_path: self.registry_path.clone(),
        })?;

        content.parse().map_err(|err| RegistryError::Parse {
            source: err,
            registry_path: self.registry_path.clone(),
        })
    }

    /// Persist the registry document to disk, replacing prior contents.
    ///
    /// Renders the document through the [`Display`](std::fmt::Display) impl
    /// of [`Registry`], writes it to a temporary file in the same directory,
    /// then renames it over the registry file.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::Write`] if the temporary file cannot be
    ///   written or renamed into place.
    #[instrument(skip_all, level = "debug")]
    pub fn save(&self, registry: &Registry) -> Result<()> {
        let content = registry.to_string();

        let scratch_path = self.registry_path.with_extension("toml.tmp");
        fs::write(&scratch_path, content.as_bytes()).map_err(|err| RegistryError::Write {
            source: err,
            registry_path: scratch_path.clone(),
        })?;
        fs::rename(&scratch_path, &self.registry_path).map_err(|err| RegistryError::Write {
            source: err,
            registry_path: self.registry_path.clone(),
        })?;
        debug!("persisted registry at {:?}", self.registry_path.display());

        Ok(())
    }
}

/// Registry persistence error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Config pointer is missing, so no registry has been initialized.
    #[error("no registry initialized, pointer {:?} does not exist", pointer_path.display())]
    NotInitialized { pointer_path: PathBuf },

    /// Registry file cannot be read from.
    #[error("failed to read registry file at {:?}", registry_path.display())]
    Read {
        #[source]
        source: std::io::Error,
        registry_path: PathBuf,
    },

    /// Registry file cannot be written to.
    #[error("failed to write registry file at {:?}", registry_path.display())]
    Write {
        #[source]
        source: std::io::Error,
        registry_path: PathBuf,
    },

    /// Registry document is malformed.
    #[error("failed to parse registry file at {:?}", registry_path.display())]
    Parse {
        #[source]
        source: ConfigError,
        registry_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load_round_trips() -> anyhow::Result<()> {
        let repo = tempfile::tempdir()?;
        let store = RegistryStore::at(repo.path().join(REGISTRY_FILE_NAME));

        let mut registry = Registry::default();
        registry
            .symlinks
            .insert(".vimrc".into(), "dotfiles/vimrc".into());
        store.save(&registry)?;

        assert_eq!(store.load()?, registry);

        // Scratch file never outlives the save.
        assert!(!repo.path().join("symconfig.toml.tmp").exists());

        Ok(())
    }

    #[test]
    fn save_writes_display_rendering() -> anyhow::Result<()> {
        let repo = tempfile::tempdir()?;
        let store = RegistryStore::at(repo.path().join(REGISTRY_FILE_NAME));

        let mut registry = Registry::default();
        registry
            .symlinks
            .insert(".vimrc".into(), "dotfiles/vimrc".into());
        store.save(&registry)?;

        let on_disk = std::fs::read_to_string(store.path())?;
        assert_eq!(on_disk, registry.to_string());

        Ok(())
    }

    #[test]
    fn save_replaces_prior_contents() -> anyhow::Result<()> {
        let repo = tempfile::tempdir()?;
        let store = RegistryStore::at(repo.path().join(REGISTRY_FILE_NAME));

        let mut registry = Registry::default();
        registry
            .symlinks
            .insert(".vimrc".into(), "dotfiles/vimrc".into());
        store.save(&registry)?;

        registry.symlinks.clear();
        store.save(&registry)?;
        assert_eq!(store.load()?, Registry::default());

        Ok(())
    }

    #[test]
    fn open_resolves_pointer_to_registry_path() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        let repo = tempfile::tempdir()?;
        let registry_path = repo.path().join(REGISTRY_FILE_NAME);
        path::symlink(&registry_path, RegistryStore::pointer_path(home.path()))?;

        let store = RegistryStore::open(home.path())?;
        assert_eq!(store.path(), registry_path);

        Ok(())
    }

    #[test]
    fn open_without_pointer_is_not_initialized() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;

        let result = RegistryStore::open(home.path());
        assert!(matches!(
            result,
            Err(RegistryError::NotInitialized { .. })
        ));

        Ok(())
    }

    #[test]
    fn malformed_registry_is_a_parse_error() -> anyhow::Result<()> {
        let repo = tempfile::tempdir()?;
        let registry_path = repo.path().join(REGISTRY_FILE_NAME);
        std::fs::write(&registry_path, "symlinks = \"not a table\"")?;

        let result = RegistryStore::at(registry_path).load();
        assert!(matches!(result, Err(RegistryError::Parse { .. })));

        Ok(())
    }
}
