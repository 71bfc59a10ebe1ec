// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

//! Registry document layout.
//!
//! Specify the layout of the registry document that Sym persists inside the
//! dotfiles repository, to simplify the process of serialization and
//! deserialization. File I/O is left to the caller to figure out.
//!
//! # General Layout
//!
//! The registry document is a TOML file with a single `[symlinks]` table
//! mapping each tracked destination to its source. Both sides are stored in
//! __storage form__: absolute, or relative to the user's home directory.
//! An empty table is a valid document. Unknown top-level fields written by
//! newer versions are tolerated, and survive a load/save round trip.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Registry document layout.
///
/// A plain record of the destination-to-source mapping. Persistence lives in
/// [`RegistryStore`](crate::registry::RegistryStore), so the record itself
/// stays independent of any particular storage backend.
#[derive(Default, Debug, PartialEq, Clone, Deserialize, Serialize)]
pub struct Registry {
    /// Mapping from destination storage form to source storage form.
    #[serde(default)]
    pub symlinks: BTreeMap<String, String>,

    /// Unknown top-level fields, preserved across load/save.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl FromStr for Registry {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Registry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Registry document error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize registry document.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize registry document.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_registry() -> anyhow::Result<()> {
        let result: Registry = r#"
            [symlinks]
            ".vimrc" = "dotfiles/vimrc"
            ".gitconfig" = "/srv/shared/gitconfig"
        "#
        .parse()?;

        let expect = Registry {
            symlinks: BTreeMap::from([
                (".vimrc".into(), "dotfiles/vimrc".into()),
                (".gitconfig".into(), "/srv/shared/gitconfig".into()),
            ]),
            extra: toml::Table::new(),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_empty_document() -> anyhow::Result<()> {
        let result: Registry = "".parse()?;
        assert_eq!(result, Registry::default());

        let result: Registry = "[symlinks]\n".parse()?;
        assert_eq!(result, Registry::default());

        Ok(())
    }

    #[test]
    fn serialize_registry() {
        let result = Registry {
            symlinks: BTreeMap::from([
                (".gitconfig".into(), "/srv/shared/gitconfig".into()),
                (".vimrc".into(), "dotfiles/vimrc".into()),
            ]),
            extra: toml::Table::new(),
        }
        .to_string();

        let expect = indoc! {r#"
            [symlinks]
            ".gitconfig" = "/srv/shared/gitconfig"
            ".vimrc" = "dotfiles/vimrc"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn unknown_fields_survive_round_trip() -> anyhow::Result<()> {
        let original: Registry = indoc! {r#"
            version = 2

            [symlinks]
            ".vimrc" = "dotfiles/vimrc"

            [machine]
            name = "workstation"
        "#}
        .parse()?;

        assert!(original.extra.contains_key("version"));
        assert!(original.extra.contains_key("machine"));

        let reparsed: Registry = original.to_string().parse()?;
        assert_eq!(reparsed, original);

        Ok(())
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let result = "symlinks = 42".parse::<Registry>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }
}
