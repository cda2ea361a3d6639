use std::sync::OnceLock;

use regex::Regex;

fn non_path_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:|//|#)").expect("invalid URL scheme regex")
    })
}

/// Whether a stylesheet href or `url(...)` value names something other than a site file.
///
/// Stylesheet `url()`s feed the `cssurl` section, which only lists files from the build
/// output. Remote fonts and inline `data:` images have no output path to rebase, so they
/// are dropped.
pub fn references_outside_output(url: &str) -> bool {
    non_path_url_pattern().is_match(url.trim_start())
}
