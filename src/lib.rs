// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

//! Symlink-based dotfiles and configuration management.
//!
//! Sym tracks symbolic links between a version-controlled repository
//! directory and their canonical locations under the user's home directory.
//! A __registry__ document inside the repository records every managed link
//! as a destination-to-source mapping, reached through a __config pointer__:
//! a symlink at `~/.symconfig` aimed at the registry file. Paths under the
//! home directory are stored home-relative so the registry stays portable
//! across machines; explicitly absolute inputs are stored absolute.
//!
//! Sym manages link placement only. File contents, version control, and
//! cross-machine conflicts belong to the user and their git workflow.
//!
//! # Concurrency
//!
//! Sym is a single-user, interactively invoked tool. There is no locking
//! around the registry file: two concurrent invocations against the same
//! registry race, and the last writer wins.

pub mod config;
pub mod links;
pub mod path;
pub mod registry;

pub use config::Registry;
pub use links::{init, link, unlink, verify, LinkError, LinkOutcome, LinkStatus, VerifyReport};
pub use registry::{RegistryStore, POINTER_FILE_NAME, REGISTRY_FILE_NAME};
