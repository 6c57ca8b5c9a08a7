//! Lexical path helpers shared by the matcher, the guard and the rules.
//!
//! Nothing here touches the filesystem: paths are cleaned the way a shell
//! user reads them, not canonicalized, so symlinks are not followed.

use std::borrow::Cow;
use std::path::Path;

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// against the preceding segment where possible. A rooted path never climbs
/// above `/`; a relative path keeps its leading `..` segments. The empty
/// path cleans to `.`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".into(),
        (false, false) => joined,
    }
}

/// Final path segment, `"/"` for the root and `"."` for the empty path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    match trimmed.rsplit_once('/') {
        Some((_, name)) => name,
        None => trimmed,
    }
}

/// Everything before the final segment, `"."` when there is none.
pub fn dir_name(path: &str) -> String {
    let cleaned = clean(path);
    match cleaned.rsplit_once('/') {
        Some(("", _)) => "/".into(),
        Some((dir, _)) => dir.to_string(),
        None => ".".into(),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    shellexpand::tilde(path)
}

/// Expand `~` and `$VAR`/`${VAR}` references.
///
/// Unset variables leave the input untouched rather than failing: the
/// caller still has to judge the literal text.
pub fn expand_full(path: &str) -> Cow<'_, str> {
    shellexpand::full(path).unwrap_or(Cow::Borrowed(path))
}

/// Expand `~`, anchor relative paths at `cwd`, and clean the result.
pub fn resolve(path: &str, cwd: &Path) -> String {
    let expanded = expand_tilde(path);
    if expanded.starts_with('/') {
        return clean(&expanded);
    }
    clean(&format!("{}/{}", cwd.to_string_lossy(), expanded))
}

/// Express an absolute path relative to `cwd` when it lies underneath it.
///
/// Paths outside `cwd` (and relative paths) come back unchanged.
pub fn relative_to(path: &str, cwd: &Path) -> String {
    if !path.starts_with('/') {
        return path.to_string();
    }
    let cleaned = clean(path);
    let root = clean(&cwd.to_string_lossy());
    if cleaned == root {
        return ".".into();
    }
    let prefix = if root == "/" { root } else { format!("{root}/") };
    match cleaned.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}

/// True when `path` equals `dir` or nests under it.
pub fn is_within(path: &str, dir: &str) -> bool {
    path == dir || path.starts_with(&format!("{}/", dir.trim_end_matches('/')))
}
