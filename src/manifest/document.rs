//! Rendering the AppCache manifest document for a finalized manifest state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::{ManifestState, ResourceCategory};
use crate::paths::join;

/// A section of the generated manifest fed from a list of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSection {
    /// User-declared `CACHE:` entries.
    Cache,
    /// Entries discovered from the entry page.
    Resource(ResourceCategory),
    /// User-declared `FALLBACK:` entries.
    Fallback,
    /// User-declared `NETWORK:` entries.
    Network,
}

impl ManifestSection {
    /// Placeholder key of the section in [`MANIFEST_TEMPLATE`].
    pub fn key(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Resource(category) => category.key(),
            Self::Fallback => "fallback",
            Self::Network => "network",
        }
    }
}

/// Every list-valued section of the manifest.
pub const MANIFEST_SECTIONS: [ManifestSection; 9] = [
    ManifestSection::Cache,
    ManifestSection::Resource(ResourceCategory::Html),
    ManifestSection::Resource(ResourceCategory::Image),
    ManifestSection::Resource(ResourceCategory::Css),
    ManifestSection::Resource(ResourceCategory::CssUrl),
    ManifestSection::Resource(ResourceCategory::Script),
    ManifestSection::Resource(ResourceCategory::Module),
    ManifestSection::Fallback,
    ManifestSection::Network,
];

/// Categories whose entries receive the rule's prefix path.
pub const PREFIXED_CATEGORIES: [ResourceCategory; 3] = [
    ResourceCategory::Html,
    ResourceCategory::CssUrl,
    ResourceCategory::Module,
];

/// Fixed layout of the generated manifest.
pub const MANIFEST_TEMPLATE: &str = "CACHE MANIFEST
# manifestName #{manifestName}
# version  #{version}
CACHE:
# cache
#{cache}
# html files
#{html}
# image files
#{image}
# css files
#{css}
# cssurl files
#{cssurl}
# script files
#{script}
# module files
#{module}
FALLBACK:
#{fallback}
NETWORK:
*
#{network}";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#\{(.+?)\}").expect("invalid placeholder regex"))
}

/// Substitute `#{key}` placeholders; keys without a value render as an empty string.
pub fn fill_template(template: &str, values: &BTreeMap<&str, String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Entries of `section`, de-duplicated in first-seen order and prefixed where configured.
pub fn section_entries(state: &ManifestState, section: ManifestSection) -> Vec<String> {
    let raw: &[String] = match section {
        ManifestSection::Cache => &state.rule.cache,
        ManifestSection::Resource(category) => state.resources.get(category),
        ManifestSection::Fallback => &state.rule.fallback,
        ManifestSection::Network => &state.rule.network,
    };

    let mut seen = BTreeSet::new();
    let unique = raw.iter().filter(|entry| seen.insert(entry.as_str()));

    let prefix = match section {
        ManifestSection::Resource(category) if PREFIXED_CATEGORIES.contains(&category) => {
            state.rule.prefix()
        }
        _ => None,
    };

    match prefix {
        Some(prefix) => unique.map(|entry| join(prefix, entry)).collect(),
        None => unique.cloned().collect(),
    }
}

/// Render the manifest document for `state`.
///
/// The output depends only on the state, so rendering twice yields identical text.
pub fn render_manifest(state: &ManifestState) -> String {
    let mut values = BTreeMap::new();
    values.insert("manifestName", state.rule.manifest_file_name.clone());
    if let Some(version) = state.version {
        values.insert("version", version.to_string());
    }
    for section in MANIFEST_SECTIONS {
        values.insert(section.key(), section_entries(state, section).join("\n"));
    }

    fill_template(MANIFEST_TEMPLATE, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CachePageRule, ResourceBundle};

    fn state() -> ManifestState {
        let mut rule = CachePageRule::new("index.html", "app.manifest");
        rule.cache = vec!["offline.html".into()];
        rule.fallback = vec!["/ /offline.html".into()];
        rule.network = vec!["api/".into()];
        let mut state = ManifestState::new(rule);
        state.version = Some(1_700_000_000_000);
        state.resources = ResourceBundle {
            html: vec!["index.html".into()],
            image: vec!["img/a.png".into()],
            css: vec!["css/main.css".into()],
            cssurl: vec!["img/bg.png".into()],
            script: vec!["a.js".into(), "b.js".into(), "a.js".into()],
            module: vec!["asset/app.js".into()],
        };
        state
    }

    #[test]
    fn renders_the_fixed_layout() {
        let expected = "CACHE MANIFEST
# manifestName app.manifest
# version  1700000000000
CACHE:
# cache
offline.html
# html files
index.html
# image files
img/a.png
# css files
css/main.css
# cssurl files
img/bg.png
# script files
a.js
b.js
# module files
asset/app.js
FALLBACK:
/ /offline.html
NETWORK:
*
api/";
        assert_eq!(render_manifest(&state()), expected);
    }

    #[test]
    fn deduplicates_in_first_seen_order() {
        let entries = section_entries(
            &state(),
            ManifestSection::Resource(ResourceCategory::Script),
        );
        assert_eq!(entries, vec!["a.js", "b.js"]);
    }

    #[test]
    fn prefixes_only_selected_categories() {
        let mut state = state();
        state.rule.prefix_path = Some("/static".into());

        let html = section_entries(&state, ManifestSection::Resource(ResourceCategory::Html));
        let cssurl = section_entries(&state, ManifestSection::Resource(ResourceCategory::CssUrl));
        let module = section_entries(&state, ManifestSection::Resource(ResourceCategory::Module));
        let css = section_entries(&state, ManifestSection::Resource(ResourceCategory::Css));

        assert_eq!(html, vec!["/static/index.html"]);
        assert_eq!(cssurl, vec!["/static/img/bg.png"]);
        assert_eq!(module, vec!["/static/asset/app.js"]);
        assert_eq!(css, vec!["css/main.css"]);
    }

    #[test]
    fn unset_fields_render_empty() {
        let state = ManifestState::new(CachePageRule::new("index.html", "app.manifest"));
        let rendered = render_manifest(&state);

        assert!(rendered.contains("# version  \nCACHE:"));
        assert!(rendered.contains("# html files\n\n# image files"));
        assert!(!rendered.contains("#{"));
    }

    #[test]
    fn rendering_is_repeatable() {
        let state = state();
        assert_eq!(render_manifest(&state), render_manifest(&state));
    }

    #[test]
    fn unknown_placeholders_become_empty() {
        let values = BTreeMap::from([("known", "x".to_string())]);
        assert_eq!(fill_template("#{known}-#{unknown}", &values), "x-");
    }
}
