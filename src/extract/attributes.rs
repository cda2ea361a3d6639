use regex::Regex;

/// Collect the values of `attribute` on every opening `<tag ...>` in document order.
///
/// Only the first occurrence of the attribute within a tag is taken, quoted with either
/// `"` or `'`. Values are returned verbatim, without entity decoding. Tags lacking the
/// attribute are skipped.
pub fn tag_attribute_values(content: &str, tag: &str, attribute: &str) -> Vec<String> {
    if content.is_empty() || tag.is_empty() || attribute.is_empty() {
        return Vec::new();
    }

    let tag_pattern = Regex::new(&format!(r"(?i)<{}\b([^>]+)", regex::escape(tag)))
        .expect("invalid tag regex");
    let attribute_pattern = Regex::new(&format!(
        r#"(?i)(?:^|\s){}\s*=\s*(?:"([^"']+)"|'([^"']+)')"#,
        regex::escape(attribute)
    ))
    .expect("invalid attribute regex");

    tag_pattern
        .captures_iter(content)
        .filter_map(|tag_caps| {
            let body = tag_caps.get(1)?.as_str();
            let caps = attribute_pattern.captures(body)?;
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|value| value.as_str().to_string())
        })
        .collect()
}
