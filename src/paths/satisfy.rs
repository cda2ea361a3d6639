use glob::{MatchOptions, Pattern};
use tracing::trace;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Test whether a pipeline-relative path satisfies a configured path pattern.
///
/// Patterns follow these rules:
///
/// - a leading `!` negates the result;
/// - a leading `/` anchors the pattern at the root, so the whole path has to match;
/// - otherwise the pattern may match the whole path or any trailing run of segments,
///   which lets `index.html` select `src/index.html`;
/// - a trailing `/` selects everything below that directory.
///
/// Invalid glob syntax degrades to literal comparison.
pub fn path_satisfies(path: &str, pattern: &str) -> bool {
    match pattern.strip_prefix('!') {
        Some(rest) => !satisfies(path, rest),
        None => satisfies(path, pattern),
    }
}

fn satisfies(path: &str, pattern: &str) -> bool {
    let path = clean(path);
    let pattern = pattern.replace('\\', "/");
    let (anchored, pattern) = match pattern.strip_prefix('/') {
        Some(rest) => (true, rest.to_string()),
        None => (false, pattern.trim_start_matches("./").to_string()),
    };

    if pattern.is_empty() {
        return false;
    }

    let pattern = if pattern.ends_with('/') {
        format!("{pattern}**")
    } else {
        pattern
    };

    let matcher = Matcher::new(&pattern);
    if anchored {
        return matcher.matches(path);
    }

    if matcher.matches(path) {
        return true;
    }

    path.match_indices('/')
        .any(|(index, _)| matcher.matches(&path[index + 1..]))
}

fn clean(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

enum Matcher<'a> {
    Glob(Pattern),
    Literal(&'a str),
}

impl<'a> Matcher<'a> {
    fn new(pattern: &'a str) -> Self {
        match Pattern::new(pattern) {
            Ok(glob) => Self::Glob(glob),
            Err(err) => {
                trace!("treating `{pattern}` as a literal path: {err}");
                Self::Literal(pattern)
            }
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Glob(glob) => glob.matches_with(path, MATCH_OPTIONS),
            Self::Literal(literal) => *literal == path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::path_satisfies;

    #[test]
    fn exact_paths_match() {
        assert!(path_satisfies("index.html", "index.html"));
        assert!(!path_satisfies("index.htm", "index.html"));
    }

    #[test]
    fn unanchored_patterns_match_trailing_segments() {
        assert!(path_satisfies("src/index.html", "index.html"));
        assert!(path_satisfies("src/pages/home.html", "pages/*.html"));
        assert!(!path_satisfies("src/myindex.html", "index.html"));
    }

    #[test]
    fn anchored_patterns_match_from_root() {
        assert!(path_satisfies("index.html", "/index.html"));
        assert!(!path_satisfies("src/index.html", "/index.html"));
        assert!(path_satisfies("src/a/b.html", "/src/**/*.html"));
    }

    #[test]
    fn star_stays_within_a_segment() {
        assert!(path_satisfies("src/index.html", "src/*.html"));
        assert!(!path_satisfies("src/deep/index.html", "/src/*.html"));
    }

    #[test]
    fn directory_patterns_match_descendants() {
        assert!(path_satisfies("dep/esl/main.js", "dep/"));
        assert!(!path_satisfies("src/main.js", "/dep/"));
    }

    #[test]
    fn negation_inverts_the_result() {
        assert!(path_satisfies("src/main.css", "!*.js"));
        assert!(!path_satisfies("src/main.js", "!*.js"));
    }

    #[test]
    fn leading_slashes_on_paths_are_ignored() {
        assert!(path_satisfies("/css/main.css", "css/main.css"));
        assert!(path_satisfies("./css/main.css", "/css/main.css"));
    }

    #[test]
    fn invalid_globs_compare_literally() {
        assert!(path_satisfies("a[b.html", "a[b.html"));
        assert!(!path_satisfies("ab.html", "a[b.html"));
    }
}
