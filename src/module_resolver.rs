//! Mapping AMD module identifiers onto the source files that define them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::paths::{join, normalize, to_slash};

/// Trait describing how module identifiers are located on disk.
pub trait ModuleResolver {
  /// Absolute source path of `module_id`, or `None` when it cannot be located.
  fn resolve(&self, module_id: &str) -> Option<PathBuf>;
}

/// Default module configuration file name, looked up in the pipeline base directory.
pub const DEFAULT_MODULE_CONFIG_FILE: &str = "module.conf";

/// Errors that can occur while loading the module configuration.
#[derive(Debug, Error)]
pub enum ModuleConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration.
  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },
}

/// On-disk layout of the module configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleConfigFile {
  #[serde(default)]
  base_url: Option<String>,
  #[serde(default)]
  paths: BTreeMap<String, String>,
  #[serde(default)]
  packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PackageEntry {
  Name(String),
  Detailed {
    name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    main: Option<String>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Package {
  name: String,
  location: String,
  main: String,
}

impl From<PackageEntry> for Package {
  fn from(entry: PackageEntry) -> Self {
    match entry {
      PackageEntry::Name(name) => Self {
        location: name.clone(),
        main: "main".into(),
        name,
      },
      PackageEntry::Detailed {
        name,
        location,
        main,
      } => Self {
        location: location.unwrap_or_else(|| name.clone()),
        main: main
          .map(|value| value.trim_end_matches(".js").to_string())
          .unwrap_or_else(|| "main".into()),
        name,
      },
    }
  }
}

/// Resolver driven by an AMD loader configuration (`baseUrl`, `paths`, `packages`).
#[derive(Debug, Clone, Default)]
pub struct AmdModuleResolver {
  base: Option<String>,
  paths: Vec<(String, String)>,
  packages: Vec<Package>,
}

impl AmdModuleResolver {
  /// Load the configuration file if present.
  ///
  /// A missing file produces a resolver that locates nothing, so module discovery quietly
  /// yields no entries for projects without AMD configuration.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ModuleConfigError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        debug!("no module configuration at {}", path.display());
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(ModuleConfigError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    let file: ModuleConfigFile =
      serde_json::from_str(&contents).map_err(|err| ModuleConfigError::Parse {
        path: path.to_path_buf(),
        source: err,
      })?;

    let config_dir = path.parent().map(to_slash).unwrap_or_default();
    Ok(Self::from_config(&config_dir, file))
  }

  /// Load `config_file` relative to the pipeline base directory.
  pub fn discover(base_dir: &Path, config_file: &str) -> Result<Self, ModuleConfigError> {
    Self::load_from_path(base_dir.join(config_file))
  }

  fn from_config(config_dir: &str, file: ModuleConfigFile) -> Self {
    let base_url = file.base_url.unwrap_or_else(|| ".".into());
    let mut paths: Vec<(String, String)> = file
      .paths
      .into_iter()
      .map(|(prefix, target)| (prefix.trim_end_matches('/').to_string(), target))
      .filter(|(prefix, _)| !prefix.is_empty())
      .collect();
    // longest prefix first
    paths.sort_by(|(left, _), (right, _)| right.len().cmp(&left.len()));

    Self {
      base: Some(join(config_dir, &base_url)),
      paths,
      packages: file.packages.into_iter().map(Package::from).collect(),
    }
  }

  fn apply_packages(&self, module_id: &str) -> String {
    for package in &self.packages {
      if module_id == package.name {
        return format!("{}/{}", package.location, package.main);
      }
      if let Some(rest) = module_id.strip_prefix(&format!("{}/", package.name)) {
        return format!("{}/{}", package.location, rest);
      }
    }
    module_id.to_string()
  }

  fn apply_paths(&self, module_id: &str) -> String {
    for (prefix, target) in &self.paths {
      if module_id == prefix {
        return target.clone();
      }
      if let Some(rest) = module_id.strip_prefix(&format!("{prefix}/")) {
        return format!("{target}/{rest}");
      }
    }
    module_id.to_string()
  }
}

impl ModuleResolver for AmdModuleResolver {
  fn resolve(&self, module_id: &str) -> Option<PathBuf> {
    let base = self.base.as_deref()?;
    if module_id.is_empty() || module_id.contains('!') {
      trace!("skipping module `{module_id}`");
      return None;
    }

    let id = self.apply_paths(&self.apply_packages(module_id));
    let location = if id.starts_with('/') {
      normalize(&id)
    } else {
      join(base, &id)
    };
    Some(PathBuf::from(format!("{location}.js")))
  }
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for &R {
  fn resolve(&self, module_id: &str) -> Option<PathBuf> {
    (**self).resolve(module_id)
  }
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for Box<R> {
  fn resolve(&self, module_id: &str) -> Option<PathBuf> {
    (**self).resolve(module_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn resolver(json: &str) -> AmdModuleResolver {
    AmdModuleResolver::from_config("/site", serde_json::from_str(json).unwrap())
  }

  #[test]
  fn resolves_against_base_url() {
    let resolver = resolver(r#"{"baseUrl": "src"}"#);
    assert_eq!(
      resolver.resolve("page/index"),
      Some(PathBuf::from("/site/src/page/index.js"))
    );
  }

  #[test]
  fn base_url_defaults_to_config_dir() {
    let resolver = resolver("{}");
    assert_eq!(resolver.resolve("main"), Some(PathBuf::from("/site/main.js")));
  }

  #[test]
  fn prefers_longest_path_prefix() {
    let resolver = resolver(
      r#"{"baseUrl": "src", "paths": {"ui": "../lib/ui", "ui/widgets": "../widgets"}}"#,
    );
    assert_eq!(
      resolver.resolve("ui/widgets/Tab"),
      Some(PathBuf::from("/site/widgets/Tab.js"))
    );
    assert_eq!(
      resolver.resolve("ui/Dialog"),
      Some(PathBuf::from("/site/lib/ui/Dialog.js"))
    );
    assert_eq!(resolver.resolve("uix"), Some(PathBuf::from("/site/src/uix.js")));
  }

  #[test]
  fn maps_packages_to_their_main_module() {
    let resolver = resolver(
      r#"{"baseUrl": "src", "packages": [
        {"name": "er", "location": "../dep/er/src", "main": "main.js"},
        "etpl"
      ]}"#,
    );
    assert_eq!(
      resolver.resolve("er"),
      Some(PathBuf::from("/site/dep/er/src/main.js"))
    );
    assert_eq!(
      resolver.resolve("er/View"),
      Some(PathBuf::from("/site/dep/er/src/View.js"))
    );
    assert_eq!(
      resolver.resolve("etpl"),
      Some(PathBuf::from("/site/src/etpl/main.js"))
    );
  }

  #[test]
  fn plugin_resources_are_not_resolved() {
    let resolver = resolver("{}");
    assert_eq!(resolver.resolve("css!style.css"), None);
  }

  #[test]
  fn missing_configuration_resolves_nothing() {
    let temp = tempdir().expect("failed to create temp dir");
    let resolver = AmdModuleResolver::discover(temp.path(), DEFAULT_MODULE_CONFIG_FILE)
      .expect("missing files should not produce an error");
    assert_eq!(resolver.resolve("main"), None);
  }

  #[test]
  fn loads_configuration_from_disk() {
    let temp = tempdir().expect("failed to create temp dir");
    fs::write(temp.path().join("module.conf"), r#"{"baseUrl": "src"}"#)
      .expect("failed to write module config");

    let resolver = AmdModuleResolver::discover(temp.path(), "module.conf").unwrap();
    let expected = format!("{}/src/app.js", to_slash(temp.path()));
    assert_eq!(resolver.resolve("app"), Some(PathBuf::from(expected)));
  }

  #[test]
  fn reports_invalid_configuration() {
    let temp = tempdir().expect("failed to create temp dir");
    let path = temp.path().join("module.conf");
    fs::write(&path, "{ not json").expect("failed to write module config");

    let err = AmdModuleResolver::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ModuleConfigError::Parse { .. }));
    assert!(err.to_string().contains("failed to parse"));
  }
}
