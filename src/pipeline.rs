//! Minimal build-pipeline collaborators: file records, the shared file set and the driver.
//!
//! The manifest compiler only needs a handful of operations from a build pipeline. These
//! types provide them so the compiler can run standalone (see the `appcache-manifest`
//! binary) and be exercised in tests.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::paths::{extname, to_slash};

/// A single file travelling through the build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
  /// Path relative to the pipeline base directory, using forward slashes.
  pub path: String,
  /// Final published path relative to the output root.
  pub output_path: String,
  /// Absolute source path of the file.
  pub full_path: PathBuf,
  /// Extension without the leading dot.
  pub extname: String,
  /// Optional content-encoding override applied when the file is written.
  pub file_encoding: Option<String>,
  data: Vec<u8>,
}

impl FileInfo {
  /// Create a record whose output path initially equals its relative path.
  pub fn new(path: impl Into<String>, full_path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) -> Self {
    let path = path.into().replace('\\', "/");
    Self {
      extname: extname(&path),
      output_path: path.clone(),
      path,
      full_path: full_path.into(),
      file_encoding: None,
      data: data.into(),
    }
  }

  /// Override the published location of the file.
  pub fn with_output_path(mut self, output_path: impl Into<String>) -> Self {
    self.output_path = output_path.into();
    self
  }

  /// Raw file bytes.
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// File content decoded as UTF-8, replacing invalid sequences.
  pub fn content(&self) -> Cow<'_, str> {
    String::from_utf8_lossy(&self.data)
  }

  /// Replace the file content.
  pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
    self.data = data.into();
  }
}

/// Shared state handed to every processor invocation.
#[derive(Debug, Clone)]
pub struct ProcessContext {
  /// Absolute directory every file path is relative to.
  pub base_dir: PathBuf,
  /// Ordered `(pattern, encoding)` overrides; the first satisfied pattern wins.
  pub file_encodings: Vec<(String, String)>,
  files: Vec<FileInfo>,
}

impl ProcessContext {
  /// Create an empty file set rooted at `base_dir`.
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: base_dir.into(),
      file_encodings: Vec::new(),
      files: Vec::new(),
    }
  }

  /// Attach content-encoding overrides.
  pub fn with_file_encodings(mut self, encodings: Vec<(String, String)>) -> Self {
    self.file_encodings = encodings;
    self
  }

  /// Base directory rendered with forward slashes.
  pub fn base_dir_slash(&self) -> String {
    to_slash(&self.base_dir)
  }

  /// Append a file record to the set.
  pub fn add_file(&mut self, file: FileInfo) {
    self.files.push(file);
  }

  /// Append a file given its path relative to the base directory.
  pub fn add_relative_file(&mut self, path: &str, data: impl Into<Vec<u8>>) {
    let full_path = self.base_dir.join(Path::new(path));
    self.add_file(FileInfo::new(path, full_path, data));
  }

  /// All files in pipeline order.
  pub fn files(&self) -> &[FileInfo] {
    &self.files
  }

  /// Mutable access to the files in pipeline order.
  pub fn files_mut(&mut self) -> &mut [FileInfo] {
    &mut self.files
  }

  /// Most recently added file whose relative path equals `path`.
  pub fn file_by_path(&self, path: &str) -> Option<&FileInfo> {
    self.files.iter().rev().find(|file| file.path == path)
  }

  /// Mutable variant of [`ProcessContext::file_by_path`].
  pub fn file_by_path_mut(&mut self, path: &str) -> Option<&mut FileInfo> {
    self.files.iter_mut().rev().find(|file| file.path == path)
  }
}

/// A pipeline stage invoked once per file.
pub trait Processor {
  /// Failure that aborts the pipeline run.
  type Error;

  /// Human readable processor name used in logs.
  fn name(&self) -> &str;

  /// Handle the file at `file_index`, calling `done` once the invocation completes.
  fn process(
    &mut self,
    file_index: usize,
    context: &mut ProcessContext,
    done: &mut dyn FnMut(),
  ) -> Result<(), Self::Error>;
}

/// Drive `processor` over every file present when the run starts.
///
/// Returns the number of completion signals received, which equals the number of
/// invocations when every one of them succeeded.
pub fn run_processor<P: Processor + ?Sized>(
  processor: &mut P,
  context: &mut ProcessContext,
) -> Result<usize, P::Error> {
  let total = context.files().len();
  let mut completed = 0;
  for index in 0..total {
    processor.process(index, context, &mut || completed += 1)?;
  }
  tracing::debug!("{} completed {completed} of {total} invocations", processor.name());
  Ok(completed)
}
