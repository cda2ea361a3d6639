//! Command-line entry point generating AppCache manifests for a built site directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use offline_manifest_compiler::{CompilerConfig, ManifestCompiler, ProcessContext, run_processor};

/// Generate AppCache manifests for the cache pages of a built site.
#[derive(Debug, Parser)]
#[command(name = "appcache-manifest", version, about)]
struct Cli {
  /// Directory holding the built site; pipeline paths are relative to it.
  #[arg(long, default_value = ".")]
  base_dir: PathBuf,
  /// Configuration file; `manifest.config.json` in the base directory by default.
  #[arg(long)]
  config: Option<PathBuf>,
  /// Directory receiving the rewritten files; defaults to the base directory.
  #[arg(long)]
  out_dir: Option<PathBuf>,
  /// Log matching and discovery details.
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let base_dir = fs::canonicalize(&cli.base_dir)
    .with_context(|| format!("failed to resolve {}", cli.base_dir.display()))?;
  let config = match &cli.config {
    Some(path) => CompilerConfig::from_path(path)?,
    None => CompilerConfig::discover(&base_dir),
  };
  let out_dir = cli.out_dir.clone().unwrap_or_else(|| base_dir.clone());

  let compiler = compile_site(&base_dir, &out_dir, &config)?;

  for state in compiler.manifest_states() {
    match &state.relative_path {
      Some(path) => println!("{path}"),
      None => println!("no page matched {}", state.rule.cache_page_addr),
    }
  }

  Ok(())
}

/// Load the site under `base_dir`, generate its manifests and write the result to `out_dir`.
///
/// Pages that already carry a `manifest` attribute keep it, so compiling in place twice is
/// stable.
fn compile_site(base_dir: &Path, out_dir: &Path, config: &CompilerConfig) -> Result<ManifestCompiler> {
  let mut context = ProcessContext::new(base_dir).with_file_encodings(config.encoding_pairs());
  load_site_files(base_dir, Path::new(""), &mut context)?;
  info!("loaded {} file(s) from {}", context.files().len(), base_dir.display());

  let mut compiler = ManifestCompiler::from_config(config);
  run_processor(&mut compiler, &mut context)?;

  let written = write_site_files(&context, out_dir)?;
  info!("wrote {written} file(s) to {}", out_dir.display());
  Ok(compiler)
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .init();
}

/// Walk `dir` adding every non-hidden file to the pipeline in a stable order.
fn load_site_files(root: &Path, relative_root: &Path, context: &mut ProcessContext) -> Result<()> {
  let dir = root.join(relative_root);
  let mut entries = fs::read_dir(&dir)
    .with_context(|| format!("failed to read {}", dir.display()))?
    .collect::<std::io::Result<Vec<_>>>()
    .with_context(|| format!("failed to list {}", dir.display()))?;
  entries.sort_by_key(|entry| entry.file_name());

  for entry in entries {
    let file_name = entry.file_name();
    if file_name.to_string_lossy().starts_with('.') {
      continue;
    }

    let next_relative = relative_root.join(&file_name);
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      load_site_files(root, &next_relative, context)?;
    } else if file_type.is_file() {
      let path = entry.path();
      let data = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
      context.add_relative_file(&next_relative.to_string_lossy(), data);
    }
  }

  Ok(())
}

/// Write each file to `out_dir` at its output path, skipping byte-identical files.
fn write_site_files(context: &ProcessContext, out_dir: &Path) -> Result<usize> {
  let mut written = 0;
  for file in context.files() {
    let destination = out_dir.join(&file.output_path);
    if fs::read(&destination).ok().as_deref() == Some(file.data()) {
      continue;
    }
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&destination, file.data())
      .with_context(|| format!("failed to write {}", destination.display()))?;
    written += 1;
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use offline_manifest_compiler::CachePageRule;
  use tempfile::tempdir;

  #[test]
  fn rewrites_site_in_place() -> Result<()> {
    let temp = tempdir()?;
    let root = temp.path();
    fs::create_dir_all(root.join("css"))?;
    fs::write(root.join("index.html"), r#"<html><link href="css/a.css"></html>"#)?;
    fs::write(root.join("css/a.css"), ".a{background:url(../img/a.png)}")?;
    fs::write(root.join(".hidden"), "skip")?;

    let mut context = ProcessContext::new(root);
    load_site_files(root, Path::new(""), &mut context)?;
    assert_eq!(context.files().len(), 2);

    let mut compiler = ManifestCompiler::new(vec![CachePageRule::new("index.html", "app.manifest")]);
    run_processor(&mut compiler, &mut context)?;

    let written = write_site_files(&context, root)?;
    assert_eq!(written, 2);

    let page = fs::read_to_string(root.join("index.html"))?;
    assert!(page.starts_with(r#"<html manifest="app.manifest" >"#));
    let manifest = fs::read_to_string(root.join("app.manifest"))?;
    assert!(manifest.contains("# css files\ncss/a.css\n# cssurl files\nimg/a.png\n"));
    Ok(())
  }

  #[test]
  fn compiling_in_place_twice_is_stable() -> Result<()> {
    let temp = tempdir()?;
    let root = temp.path();
    fs::write(root.join("index.html"), "<html></html>")?;
    let config = CompilerConfig {
      manifests: vec![CachePageRule::new("index.html", "app.manifest")],
      ..CompilerConfig::default()
    };

    compile_site(root, root, &config)?;
    let compiler = compile_site(root, root, &config)?;

    assert_eq!(
      fs::read_to_string(root.join("index.html"))?,
      r#"<html manifest="app.manifest" ></html>"#
    );
    let state = compiler.manifest_state("index.html").expect("index.html matched");
    assert_eq!(state.relative_path.as_deref(), Some("app.manifest"));
    let manifest = fs::read_to_string(root.join("app.manifest"))?;
    assert!(manifest.starts_with("CACHE MANIFEST\n# manifestName app.manifest\n"));
    assert!(manifest.contains("# html files\nindex.html\n"));
    Ok(())
  }
}
