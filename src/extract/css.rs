use std::sync::OnceLock;

use regex::Regex;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"url\(\s*(?:"([^"')]+)"|'([^"')]+)'|([^"'\s)]+))\s*\)"#)
            .expect("invalid css url regex")
    })
}

/// Collect every `url(...)` reference in stylesheet text, quotes stripped.
pub fn css_urls(content: &str) -> Vec<String> {
    url_pattern()
        .captures_iter(content)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|value| value.as_str().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::css_urls;

    #[test]
    fn strips_all_quote_styles() {
        let css = r#"
            .a { background: url("img/a.png"); }
            .b { background: url('img/b.png'); }
            .c { background: url(img/c.png) no-repeat; }
        "#;
        assert_eq!(css_urls(css), vec!["img/a.png", "img/b.png", "img/c.png"]);
    }

    #[test]
    fn tolerates_padding_inside_parens() {
        assert_eq!(css_urls("a{b:url( ../font.woff )}"), vec!["../font.woff"]);
    }

    #[test]
    fn counts_multiple_urls_on_one_line() {
        let css = "@font-face{src:url(f.eot?#iefix) format('eot'),url(f.woff) format('woff')}";
        assert_eq!(css_urls(css), vec!["f.eot?#iefix", "f.woff"]);
    }

    #[test]
    fn ignores_unterminated_and_mismatched_urls() {
        assert!(css_urls(".a{background:url(img/a.png").is_empty());
        assert!(css_urls(r#".a{background:url("img/a.png')}"#).is_empty());
    }

    #[test]
    fn returns_nothing_without_urls() {
        assert!(css_urls("body { color: red; }").is_empty());
        assert!(css_urls("").is_empty());
    }
}
