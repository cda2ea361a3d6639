//! Discover the resources an entry page pulls in, expressed as final output paths.

use tracing::{debug, trace};

use crate::extract::{ArrayLiteralError, css_urls, module_ids, tag_attribute_values};
use crate::models::ResourceBundle;
use crate::module_resolver::ModuleResolver;
use crate::paths::{
  dirname, join, normalize, path_satisfies, references_outside_output, resolve, to_slash,
};
use crate::pipeline::{FileInfo, ProcessContext};

/// Build the resource bundle for `entry` from its markup and the pipeline file set.
///
/// Link, image and script references are taken verbatim from the markup. Module
/// identifiers go through `resolver` and are then mapped onto the output path of the
/// pipeline file built from the resolved source; stylesheet `url(...)` references are
/// rebased onto the base directory. Anything that cannot be mapped is left out.
pub fn resolve_resources<R: ModuleResolver + ?Sized>(
  context: &ProcessContext,
  entry: &FileInfo,
  resolver: &R,
) -> Result<ResourceBundle, ArrayLiteralError> {
  let content = entry.content();

  let module = module_output_paths(context, &module_ids(&content)?, resolver);
  let css = tag_attribute_values(&content, "link", "href");
  let image = tag_attribute_values(&content, "img", "src");
  let script = tag_attribute_values(&content, "script", "src");
  let cssurl = stylesheet_urls(context, entry, &css);

  let bundle = ResourceBundle {
    html: vec![entry.output_path.clone()],
    image,
    css,
    cssurl,
    script,
    module,
  };
  debug!(
    "{}: {} image, {} css, {} cssurl, {} script, {} module reference(s)",
    entry.path,
    bundle.image.len(),
    bundle.css.len(),
    bundle.cssurl.len(),
    bundle.script.len(),
    bundle.module.len()
  );
  Ok(bundle)
}

fn module_output_paths<R: ModuleResolver + ?Sized>(
  context: &ProcessContext,
  ids: &[String],
  resolver: &R,
) -> Vec<String> {
  let mut result = Vec::new();

  for id in ids {
    let Some(source) = resolver.resolve(id) else {
      trace!("module `{id}` could not be located");
      continue;
    };
    let source = normalize(&to_slash(&source));

    let before = result.len();
    result.extend(
      context
        .files()
        .iter()
        .filter(|file| normalize(&to_slash(&file.full_path)) == source)
        .map(|file| file.output_path.clone()),
    );
    if result.len() == before {
      trace!("module `{id}` resolved to {source}, which is not part of the build");
    }
  }

  result
}

fn stylesheet_urls(context: &ProcessContext, entry: &FileInfo, stylesheets: &[String]) -> Vec<String> {
  let entry_dir = dirname(&entry.output_path);
  let mut result = Vec::new();

  for href in stylesheets {
    if references_outside_output(href) {
      continue;
    }
    let local = normalize(resolve(&entry_dir, href).trim_start_matches('/'));

    for file in context.files() {
      let matches = path_satisfies(href, &file.output_path) || normalize(&file.output_path) == local;
      if !matches {
        continue;
      }

      let stylesheet_dir = dirname(&file.output_path);
      for url in css_urls(&file.content()) {
        if references_outside_output(&url) {
          trace!("skipping external stylesheet reference {url}");
          continue;
        }
        let rebased = match url.strip_prefix('/') {
          Some(rooted) => normalize(rooted),
          None => join(&stylesheet_dir, &url),
        };
        result.push(rebased);
      }
    }
  }

  result
}
