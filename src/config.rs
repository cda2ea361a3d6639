//! Compiler configuration loader describing the cache-page rules of a project.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::CachePageRule;
use crate::module_resolver::DEFAULT_MODULE_CONFIG_FILE;

const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "manifest.config.json",
    "manifest.config.yaml",
    "manifest.config.yml",
];

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse a JSON configuration.
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a YAML configuration.
    #[error("failed to parse {}: {source}", .path.display())]
    Yaml {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_yaml::Error,
    },
}

/// Content-encoding override for files whose relative path satisfies `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEncodingRule {
    /// Path pattern tested against pipeline-relative paths.
    pub pattern: String,
    /// Encoding label attached to matching files.
    pub encoding: String,
}

/// Discoverable configuration for the manifest compiler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Cache-page rules, one manifest each.
    pub manifests: Vec<CachePageRule>,
    /// Module configuration file consulted when resolving AMD identifiers.
    pub config_file: String,
    /// Ordered content-encoding overrides; the first satisfied pattern wins.
    pub file_encodings: Vec<FileEncodingRule>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            manifests: Vec::new(),
            config_file: DEFAULT_MODULE_CONFIG_FILE.into(),
            file_encodings: Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// When no configuration file exists or it fails to parse we fall back to default
    /// values, which generate no manifests.
    pub fn discover(dir: &Path) -> Self {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .and_then(|candidate| match Self::from_path(&candidate) {
                Ok(config) => Some(config),
                Err(err) => {
                    debug!("ignoring configuration: {err}");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Read configuration from a JSON or YAML file, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Encoding overrides as ordered `(pattern, encoding)` pairs.
    pub fn encoding_pairs(&self) -> Vec<(String, String)> {
        self.file_encodings
            .iter()
            .map(|rule| (rule.pattern.clone(), rule.encoding.clone()))
            .collect()
    }
}
