//! Wiring generated manifests into the pipeline: entry page markup and new file records.

use std::path::Path;
use std::sync::OnceLock;

use regex::bytes::{Captures, Regex};
use tracing::debug;

use crate::paths::{path_satisfies, relative, to_slash};
use crate::pipeline::{FileInfo, ProcessContext};

fn html_open_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i-u)<html\b[^>]*").expect("invalid html tag regex"))
}

fn manifest_attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i-u)\smanifest\s*=").expect("invalid manifest attribute regex")
    })
}

/// Add a `manifest` attribute to every opening `<html>` tag of `content`.
///
/// Works on the raw bytes so pages in any ASCII-compatible encoding keep every other byte.
/// Tags that already declare a manifest are left as they are. Returns `None` for empty
/// content, leaving the page untouched.
pub fn inject_manifest_attribute(content: &[u8], manifest_file_name: &str) -> Option<Vec<u8>> {
    if content.is_empty() {
        return None;
    }

    let attribute = format!(" manifest=\"{manifest_file_name}\" ");
    let updated = html_open_tag_pattern()
        .replace_all(content, |caps: &Captures| {
            let tag = &caps[0];
            if manifest_attribute_pattern().is_match(tag) {
                return tag.to_vec();
            }
            let mut tag = tag.to_vec();
            tag.extend_from_slice(attribute.as_bytes());
            tag
        })
        .into_owned();
    Some(updated)
}

/// Append an empty file record for a manifest at `full_path` and return its relative path.
///
/// The first content-encoding override whose pattern the relative path satisfies is
/// attached to the record.
pub fn add_manifest_file(context: &mut ProcessContext, full_path: &Path) -> String {
    let relative_path = relative(&context.base_dir_slash(), &to_slash(full_path));
    let encoding = context
        .file_encodings
        .iter()
        .find(|(pattern, _)| path_satisfies(&relative_path, pattern))
        .map(|(_, encoding)| encoding.clone());

    let mut file = FileInfo::new(relative_path.clone(), full_path, Vec::<u8>::new());
    file.file_encoding = encoding;
    debug!(
        "adding manifest file {relative_path} ({})",
        file.file_encoding.as_deref().unwrap_or("default encoding")
    );
    context.add_file(file);

    relative_path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inject(content: &str, name: &str) -> Option<String> {
        inject_manifest_attribute(content.as_bytes(), name)
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn injects_after_the_html_tag() {
        assert_eq!(
            inject("<html><head></head></html>", "app.manifest").as_deref(),
            Some(r#"<html manifest="app.manifest" ><head></head></html>"#)
        );
    }

    #[test]
    fn keeps_existing_attributes() {
        assert_eq!(
            inject(r#"<!DOCTYPE html><html lang="en"><body></body></html>"#, "a.manifest").as_deref(),
            Some(r#"<!DOCTYPE html><html lang="en" manifest="a.manifest" ><body></body></html>"#)
        );
    }

    #[test]
    fn empty_content_is_left_alone() {
        assert_eq!(inject_manifest_attribute(b"", "app.manifest"), None);
    }

    #[test]
    fn pages_without_html_tags_are_unchanged() {
        assert_eq!(
            inject("<div>partial</div>", "app.manifest").as_deref(),
            Some("<div>partial</div>")
        );
    }

    #[test]
    fn gbk_pages_keep_their_bytes() {
        let page = b"<html><body>\xD6\xD0\xCE\xC4</body></html>";
        assert_eq!(
            inject_manifest_attribute(page, "app.manifest").unwrap(),
            b"<html manifest=\"app.manifest\" ><body>\xD6\xD0\xCE\xC4</body></html>".to_vec()
        );
    }

    #[test]
    fn tags_declaring_a_manifest_are_not_injected_twice() {
        let page = r#"<html manifest="app.manifest" ><body></body></html>"#;
        assert_eq!(inject(page, "app.manifest").as_deref(), Some(page));
        assert_eq!(
            inject(r#"<HTML lang="en" MANIFEST = "old.manifest">"#, "app.manifest").as_deref(),
            Some(r#"<HTML lang="en" MANIFEST = "old.manifest">"#)
        );
    }

    #[test]
    fn data_manifest_attributes_do_not_count() {
        assert_eq!(
            inject(r#"<html data-manifest="x">"#, "app.manifest").as_deref(),
            Some(r#"<html data-manifest="x" manifest="app.manifest" >"#)
        );
    }

    #[test]
    fn new_files_pick_the_first_matching_encoding() {
        let mut context = ProcessContext::new("/site").with_file_encodings(vec![
            ("*.html".into(), "gbk".into()),
            ("*.manifest".into(), "utf-8".into()),
            ("src/".into(), "latin1".into()),
        ]);

        let relative_path = add_manifest_file(&mut context, Path::new("/site/src/app.manifest"));

        assert_eq!(relative_path, "src/app.manifest");
        let file = context.file_by_path("src/app.manifest").unwrap();
        assert_eq!(file.extname, "manifest");
        assert_eq!(file.output_path, "src/app.manifest");
        assert_eq!(file.file_encoding.as_deref(), Some("utf-8"));
        assert!(file.data().is_empty());
    }

    #[test]
    fn new_files_without_overrides_have_no_encoding() {
        let mut context = ProcessContext::new("/site");
        add_manifest_file(&mut context, Path::new("/site/app.manifest"));
        assert_eq!(context.file_by_path("app.manifest").unwrap().file_encoding, None);
    }
}
