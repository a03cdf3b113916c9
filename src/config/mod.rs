//! Configuration loading: a YAML document whose
//! sections mirror `phpmix-obfuscator`'s and `phpmix-walker`'s own config structs.
//! Both a flat legacy layout (just the obfuscator section's keys at the document
//! root, predating the walker section) and the nested layout below are accepted; the
//! nested layout takes precedence when it parses.

use std::path::{Path, PathBuf};

use phpmix_obfuscator::ObfuscatorConfig;
use phpmix_walker::WalkerConfig;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_CONFIG_FILE_NAME;
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub obfuscator: ObfuscatorConfig,
    pub walker: WalkerConfig,
}

impl Configuration {
    /// Loads configuration for `workspace`, preferring `explicit_path` when given,
    /// otherwise `<workspace>/phpmix.yaml`. A workspace with no configuration file at
    /// all uses built-in defaults "missing keys take defaults".
    pub fn load(workspace: &Path, explicit_path: Option<&Path>) -> Result<Self, Error> {
        let path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = workspace.join(DEFAULT_CONFIG_FILE_NAME);
                candidate.exists().then_some(candidate)
            }
        };

        let Some(path) = path else {
            tracing::debug!("no configuration file found, using defaults");
            return Ok(Self::default());
        };

        tracing::debug!("loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|source| Error::Io { path: path.clone(), source })?;

        if path.extension().is_some_and(|extension| extension == "toml") {
            Self::parse_toml(&contents)
        } else {
            Self::parse_yaml(&contents)
        }
    }

    /// Tries the nested layout first; a document written in the flat legacy layout
    /// (just the obfuscator section's own keys, no `obfuscator:`/`walker:` wrapper)
    /// fails that parse and falls back to being read as a bare `ObfuscatorConfig`
    /// with a default walker section.
    fn parse_yaml(contents: &str) -> Result<Self, Error> {
        if let Ok(nested) = serde_norway::from_str::<Configuration>(contents) {
            return Ok(nested);
        }

        let obfuscator: ObfuscatorConfig = serde_norway::from_str(contents).map_err(Error::DeserializingYaml)?;
        Ok(Self { obfuscator, walker: WalkerConfig::default() })
    }

    /// Secondary legacy format reader: a
    /// `.toml` configuration file predating the YAML-only convention. Same
    /// nested-then-flat fallback as [`Self::parse_yaml`].
    fn parse_toml(contents: &str) -> Result<Self, Error> {
        if let Ok(nested) = toml::from_str::<Configuration>(contents) {
            return Ok(nested);
        }

        let obfuscator: ObfuscatorConfig = toml::from_str(contents).map_err(Error::DeserializingToml)?;
        Ok(Self { obfuscator, walker: WalkerConfig::default() })
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_norway::to_string(self).map_err(Error::SerializingYaml)
    }
}
