//! AppCache manifest assembly broken into focused submodules for easier testing.

mod document;
mod inject;

pub use document::{
    MANIFEST_SECTIONS, MANIFEST_TEMPLATE, ManifestSection, PREFIXED_CATEGORIES, fill_template,
    render_manifest, section_entries,
};
pub use inject::{add_manifest_file, inject_manifest_attribute};
