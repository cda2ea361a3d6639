//! Data structures describing cache-page rules and the manifests built from them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A configured mapping from an entry page to the manifest generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePageRule {
  /// Path pattern selecting the entry page(s) to cache.
  #[serde(alias = "cachePage")]
  pub cache_page_addr: String,
  /// Discover referenced resources from the entry page automatically.
  #[serde(default = "default_auto_cache")]
  pub auto_cache: bool,
  /// Prefix joined onto the html, cssurl and module sections.
  #[serde(default)]
  pub prefix_path: Option<String>,
  /// Manifest file name, written beside the entry page and into its `manifest` attribute.
  #[serde(alias = "manifestName")]
  pub manifest_file_name: String,
  /// Literal entries for the `CACHE:` section.
  #[serde(default)]
  pub cache: Vec<String>,
  /// Literal entries for the `FALLBACK:` section.
  #[serde(default)]
  pub fallback: Vec<String>,
  /// Literal entries for the `NETWORK:` section.
  #[serde(default)]
  pub network: Vec<String>,
}

fn default_auto_cache() -> bool {
  true
}

impl CachePageRule {
  /// Rule with auto-caching enabled and no declared entries.
  pub fn new(cache_page_addr: impl Into<String>, manifest_file_name: impl Into<String>) -> Self {
    Self {
      cache_page_addr: cache_page_addr.into(),
      auto_cache: true,
      prefix_path: None,
      manifest_file_name: manifest_file_name.into(),
      cache: Vec::new(),
      fallback: Vec::new(),
      network: Vec::new(),
    }
  }

  /// Prefix configured for this rule, ignoring empty strings.
  pub fn prefix(&self) -> Option<&str> {
    self.prefix_path.as_deref().filter(|prefix| !prefix.is_empty())
  }
}

/// Resource categories discovered from an entry page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceCategory {
  /// The entry page itself.
  Html,
  /// `<img src>` references.
  Image,
  /// `<link href>` references.
  Css,
  /// `url(...)` references found inside linked stylesheets.
  CssUrl,
  /// `<script src>` references.
  Script,
  /// Output paths of AMD modules listed in `require([...])` calls.
  Module,
}

impl ResourceCategory {
  /// Every category in manifest order.
  pub const ALL: [ResourceCategory; 6] = [
    ResourceCategory::Html,
    ResourceCategory::Image,
    ResourceCategory::Css,
    ResourceCategory::CssUrl,
    ResourceCategory::Script,
    ResourceCategory::Module,
  ];

  /// Key used for the category in the manifest template.
  pub fn key(self) -> &'static str {
    match self {
      Self::Html => "html",
      Self::Image => "image",
      Self::Css => "css",
      Self::CssUrl => "cssurl",
      Self::Script => "script",
      Self::Module => "module",
    }
  }
}

/// Discovered resources for one entry page, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBundle {
  /// Output path of the entry page.
  pub html: Vec<String>,
  /// Image references.
  pub image: Vec<String>,
  /// Stylesheet references.
  pub css: Vec<String>,
  /// References found inside the linked stylesheets.
  pub cssurl: Vec<String>,
  /// Script references.
  pub script: Vec<String>,
  /// Module output paths.
  pub module: Vec<String>,
}

impl ResourceBundle {
  /// Entries recorded for `category`.
  pub fn get(&self, category: ResourceCategory) -> &[String] {
    match category {
      ResourceCategory::Html => &self.html,
      ResourceCategory::Image => &self.image,
      ResourceCategory::Css => &self.css,
      ResourceCategory::CssUrl => &self.cssurl,
      ResourceCategory::Script => &self.script,
      ResourceCategory::Module => &self.module,
    }
  }

  /// Total number of entries across every category.
  pub fn len(&self) -> usize {
    ResourceCategory::ALL
      .iter()
      .map(|category| self.get(*category).len())
      .sum()
  }

  /// Returns `true` when no category holds an entry.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Build state of one configured manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestState {
  /// Rule the manifest was configured from.
  pub rule: CachePageRule,
  /// Manifest location relative to the pipeline base directory, once matched.
  pub relative_path: Option<String>,
  /// Absolute manifest location, once matched.
  pub full_path: Option<PathBuf>,
  /// Milliseconds since the epoch at the time of the last match.
  pub version: Option<i64>,
  /// Resources discovered for the entry page.
  pub resources: ResourceBundle,
}

impl ManifestState {
  /// Fresh, unmatched state for `rule`.
  pub fn new(rule: CachePageRule) -> Self {
    Self {
      rule,
      relative_path: None,
      full_path: None,
      version: None,
      resources: ResourceBundle::default(),
    }
  }

  /// Whether a matching entry page has been found.
  pub fn is_matched(&self) -> bool {
    self.relative_path.is_some()
  }
}
