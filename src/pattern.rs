//! Path/pattern matching with single-segment wildcards and `**`.
//!
//! `*`, `?` and `[...]` never cross a `/`. A pattern without `**` matches
//! either the whole path or its bare filename, so `*.go` matches
//! `src/pkg/main.go`. A single `**` stands for any number of segments.

use ::glob::{MatchOptions, Pattern};

use crate::paths;

const SEGMENT_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Match a path against a glob pattern.
pub fn matches(path: &str, pattern: &str) -> bool {
    let path = paths::clean(path);
    let pattern = paths::clean(pattern);

    if pattern.contains("**") {
        return match_doublestar(&path, &pattern);
    }

    segment_match(&pattern, &path) || segment_match(&pattern, paths::base_name(&path))
}

/// True if the path matches at least one pattern.
///
/// An empty pattern list matches nothing. Callers that treat "no patterns
/// configured" as unrestricted must check for emptiness themselves.
pub fn match_any<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches(path, p.as_ref()))
}

fn segment_match(pattern: &str, candidate: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches_with(candidate, SEGMENT_OPTIONS))
        .unwrap_or(false)
}

fn match_doublestar(path: &str, pattern: &str) -> bool {
    let Some((prefix, suffix)) = pattern.split_once("**") else {
        return false;
    };
    // Only one `**` is supported.
    if suffix.contains("**") {
        return false;
    }

    // `src/**` stops at a segment boundary; `src**` does not.
    let bounded = prefix.ends_with('/');
    let prefix = prefix.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');

    if !prefix.is_empty() {
        let inside = if bounded {
            paths::is_within(path, prefix)
        } else {
            path.starts_with(prefix)
        };
        if !inside {
            return false;
        }
    }
    if suffix.is_empty() {
        return true;
    }

    let remaining = if prefix.is_empty() {
        path
    } else {
        path[prefix.len()..].trim_start_matches('/')
    };

    let segments: Vec<&str> = remaining.split('/').collect();
    (0..segments.len()).any(|i| segment_match(suffix, &segments[i..].join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_wildcards() {
        assert!(matches("main.go", "main.go"));
        assert!(matches("main.go", "*.go"));
        assert!(matches("main.go", "ma?n.go"));
        assert!(!matches("main.rs", "*.go"));
    }

    #[test]
    fn plain_pattern_matches_basename() {
        assert!(matches("src/pkg/main.go", "*.go"));
        assert!(matches("deep/dir/.env", ".env"));
    }

    #[test]
    fn star_does_not_cross_separator() {
        assert!(!matches("src/pkg/main.go", "src/*.go"));
        assert!(matches("src/main.go", "src/*.go"));
    }

    #[test]
    fn doublestar_any_depth() {
        assert!(matches("src/pkg/main.go", "**/*.go"));
        assert!(matches("main.go", "**/*.go"));
        assert!(matches("src/main.go", "src/**/*.go"));
        assert!(matches("src/a/b/c/main.go", "src/**/*.go"));
    }

    #[test]
    fn doublestar_prefix_must_match() {
        assert!(!matches("vendor/pkg/main.go", "src/**/*.go"));
        assert!(!matches("srcx/main.go", "src/**/*.go"));
        assert!(!matches("srcx/a.go", "src/**"));
        assert!(matches("src_gen/a.go", "src**"));
    }

    #[test]
    fn doublestar_empty_suffix_matches_everything_below() {
        assert!(matches("vendor/a/b.go", "vendor/**"));
        assert!(!matches("src/a/b.go", "vendor/**"));
    }

    #[test]
    fn doublestar_suffix_with_directories() {
        assert!(matches("a/b/internal/x.go", "**/internal/*.go"));
        assert!(!matches("a/b/internal/sub/x.go", "**/internal/*.go"));
    }

    #[test]
    fn multiple_doublestars_never_match() {
        assert!(!matches("a/b/c/d.go", "**/b/**/*.go"));
    }

    #[test]
    fn operands_are_cleaned() {
        assert!(matches("./src/main.go", "src/*.go"));
        assert!(matches("src//main.go", "./src/*.go"));
    }

    #[test]
    fn invalid_pattern_never_matches() {
        assert!(!matches("a[b", "a[b"));
    }

    #[test]
    fn match_any_empty_is_false() {
        let none: [&str; 0] = [];
        assert!(!match_any("src/main.go", &none));
        assert!(match_any("src/main.go", &["*.rs", "*.go"]));
    }
}
