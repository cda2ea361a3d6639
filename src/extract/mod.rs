//! Pattern-based extraction of resource references from markup, stylesheets and scripts.
//!
//! None of these helpers is a real parser. They mirror what a browser would request from a
//! page in the common cases and stay isolated here so a parser-backed implementation can
//! replace them without touching the resolver.

mod attributes;
mod css;
mod modules;

pub use attributes::tag_attribute_values;
pub use css::css_urls;
pub use modules::{ArrayLiteralError, module_ids, parse_array_literal};
