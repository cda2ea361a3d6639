use std::path::Path;

/// Render a filesystem path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Collapse `.`/`..` segments and duplicate separators without touching the filesystem.
///
/// Leading `..` segments of relative paths are kept; on absolute paths they stop at the
/// root. An empty relative result becomes `.`.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join two path fragments and normalise the result.
pub fn join(base: &str, tail: &str) -> String {
    if base.is_empty() {
        return normalize(tail);
    }
    normalize(&format!("{base}/{tail}"))
}

/// Resolve `tail` against `base`; an absolute `tail` replaces the base entirely.
pub fn resolve(base: &str, tail: &str) -> String {
    let tail = tail.replace('\\', "/");
    if tail.starts_with('/') {
        normalize(&tail)
    } else {
        join(base, &tail)
    }
}

/// Parent directory of `path`, `.` for a bare file name and `/` for root entries.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => normalized[..index].to_string(),
        None => ".".to_string(),
    }
}

/// Extension of the final path segment without the leading dot.
pub fn extname(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let name = normalized.rsplit('/').next().unwrap_or_default();
    match name.rfind('.') {
        Some(index) if index > 0 => name[index + 1..].to_string(),
        _ => String::new(),
    }
}

/// Express `to` relative to the directory `from`, walking up with `..` where needed.
pub fn relative(from: &str, to: &str) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    let to_segments: Vec<&str> = to.split('/').filter(|s| !s.is_empty() && *s != ".").collect();

    let shared = from_segments
        .iter()
        .zip(&to_segments)
        .take_while(|(left, right)| left == right)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_segments.len() - shared];
    parts.extend(&to_segments[shared..]);
    parts.join("/")
}
