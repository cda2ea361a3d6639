//! Manifest compiler orchestrating rule matching, resource discovery and manifest output.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::extract::ArrayLiteralError;
use crate::manifest::{add_manifest_file, inject_manifest_attribute, render_manifest};
use crate::models::{CachePageRule, ManifestState};
use crate::module_resolver::{AmdModuleResolver, DEFAULT_MODULE_CONFIG_FILE, ModuleResolver};
use crate::paths::{dirname, path_satisfies, relative, resolve, to_slash};
use crate::pipeline::{ProcessContext, Processor};
use crate::resources::resolve_resources;

/// Generic compile result type used across the crate.
pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal errors raised while compiling manifests.
#[derive(Debug, Error)]
pub enum CompileError {
  /// An entry page passes something other than a literal string array to `require([...])`.
  #[error("malformed dependency array in {path}")]
  MalformedDependencies {
    /// Pipeline path of the offending entry page.
    path: String,
    /// Parser failure.
    #[source]
    source: ArrayLiteralError,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  Accumulating { expected: Option<usize>, seen: usize },
  Finalized,
}

/// Pipeline processor generating one AppCache manifest per cache-page rule.
///
/// The processor does nothing until it has been invoked once for every file present on
/// the first invocation. It then runs a single pass over the whole file set.
pub struct ManifestCompiler {
  rules: Vec<CachePageRule>,
  states: Vec<ManifestState>,
  config_file: String,
  resolver: Option<Box<dyn ModuleResolver>>,
  clock: fn() -> i64,
  phase: Phase,
}

fn current_millis() -> i64 {
  Utc::now().timestamp_millis()
}

impl ManifestCompiler {
  /// Create a compiler for the provided rules.
  ///
  /// Rules sharing a `cache_page_addr` share one manifest state; the later rule's
  /// settings win.
  pub fn new(rules: Vec<CachePageRule>) -> Self {
    let mut states: Vec<ManifestState> = Vec::new();
    for rule in &rules {
      let state = ManifestState::new(rule.clone());
      match states
        .iter_mut()
        .find(|existing| existing.rule.cache_page_addr == rule.cache_page_addr)
      {
        Some(existing) => *existing = state,
        None => states.push(state),
      }
    }

    Self {
      rules,
      states,
      config_file: DEFAULT_MODULE_CONFIG_FILE.into(),
      resolver: None,
      clock: current_millis,
      phase: Phase::Accumulating {
        expected: None,
        seen: 0,
      },
    }
  }

  /// Create a compiler from a loaded configuration.
  pub fn from_config(config: &CompilerConfig) -> Self {
    Self::new(config.manifests.clone()).with_config_file(config.config_file.clone())
  }

  /// Module configuration file looked up in the base directory.
  pub fn with_config_file(mut self, config_file: impl Into<String>) -> Self {
    self.config_file = config_file.into();
    self
  }

  /// Use `resolver` instead of loading the module configuration file.
  pub fn with_module_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
    self.resolver = Some(Box::new(resolver));
    self
  }

  /// Replace the version clock.
  pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
    self.clock = clock;
    self
  }

  /// Rules still eligible for matching.
  pub fn active_rules(&self) -> &[CachePageRule] {
    &self.rules
  }

  /// Manifest states in configuration order.
  pub fn manifest_states(&self) -> &[ManifestState] {
    &self.states
  }

  /// State of the manifest configured for `cache_page_addr`.
  pub fn manifest_state(&self, cache_page_addr: &str) -> Option<&ManifestState> {
    self
      .states
      .iter()
      .find(|state| state.rule.cache_page_addr == cache_page_addr)
  }

  /// Whether the single compilation pass has run.
  pub fn is_finalized(&self) -> bool {
    self.phase == Phase::Finalized
  }

  /// Match every file against every active rule, then write out the manifests.
  fn finalize(&mut self, context: &mut ProcessContext) -> CompileResult<()> {
    let base = context.base_dir_slash();
    let config_file = &self.config_file;
    let resolver: &dyn ModuleResolver = &**self
      .resolver
      .get_or_insert_with(|| -> Box<dyn ModuleResolver> {
        Box::new(load_module_resolver(context, config_file))
      });

    let file_count = context.files().len();
    debug!(
      "matching {file_count} file(s) against {} cache-page rule(s)",
      self.rules.len()
    );

    for index in 0..file_count {
      let mut consumed = BTreeSet::new();

      for (rule_index, rule) in self.rules.iter().enumerate() {
        let file = &context.files()[index];
        if !path_satisfies(&file.path, &rule.cache_page_addr) {
          continue;
        }
        let Some(state) = self
          .states
          .iter_mut()
          .find(|state| state.rule.cache_page_addr == rule.cache_page_addr)
        else {
          continue;
        };

        // the manifest lives beside the matched page; with several matches the last one wins
        let full_path = resolve(&dirname(&to_slash(&file.full_path)), &rule.manifest_file_name);
        state.relative_path = Some(relative(&base, &full_path));
        state.full_path = Some(PathBuf::from(&full_path));
        state.version = Some((self.clock)());
        debug!("{} matched cache page rule `{}`", file.path, rule.cache_page_addr);

        if state.rule.auto_cache {
          state.resources = resolve_resources(context, file, resolver).map_err(|source| {
            CompileError::MalformedDependencies {
              path: file.path.clone(),
              source,
            }
          })?;
        }

        let exact = file.path == rule.cache_page_addr;
        let injected = inject_manifest_attribute(file.data(), &rule.manifest_file_name);
        if let Some(content) = injected {
          context.files_mut()[index].set_data(content);
        }
        if exact {
          consumed.insert(rule_index);
        }
      }

      if !consumed.is_empty() {
        let mut rule_index = 0;
        self.rules.retain(|_| {
          let keep = !consumed.contains(&rule_index);
          rule_index += 1;
          keep
        });
      }
    }

    for state in &self.states {
      let Some(full_path) = &state.full_path else {
        debug!("no entry page matched `{}`", state.rule.cache_page_addr);
        continue;
      };

      let relative_path = add_manifest_file(context, full_path);
      match context.file_by_path_mut(&relative_path) {
        Some(file) => {
          file.set_data(render_manifest(state));
          info!(
            "generated {relative_path} with {} discovered resource(s)",
            state.resources.len()
          );
        }
        None => debug!("manifest record {relative_path} missing, skipping render"),
      }
    }

    Ok(())
  }
}

fn load_module_resolver(context: &ProcessContext, config_file: &str) -> AmdModuleResolver {
  match AmdModuleResolver::discover(&context.base_dir, config_file) {
    Ok(resolver) => resolver,
    Err(err) => {
      warn!("module identifiers will not be resolved: {err}");
      AmdModuleResolver::default()
    }
  }
}

impl Processor for ManifestCompiler {
  type Error = CompileError;

  fn name(&self) -> &str {
    "ManifestCompiler"
  }

  fn process(
    &mut self,
    _file_index: usize,
    context: &mut ProcessContext,
    done: &mut dyn FnMut(),
  ) -> CompileResult<()> {
    let reached = match &mut self.phase {
      Phase::Accumulating { expected, seen } => {
        let total = *expected.get_or_insert(context.files().len());
        *seen += 1;
        *seen == total
      }
      Phase::Finalized => false,
    };

    if reached {
      self.phase = Phase::Finalized;
      self.finalize(context)?;
    }

    done();
    Ok(())
  }
}
