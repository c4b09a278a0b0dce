//! Request path → object key helpers.

use crate::policy::ServingPolicy;

/// Whether a request path addresses a directory (empty or ending in `/`).
#[must_use]
pub fn is_directory_style(path: &str) -> bool {
    path.is_empty() || path.ends_with('/')
}

/// Join path segments into an object key.
///
/// Segments are joined with `/`, then empty, `.` and `..` components are
/// resolved (`..` never climbs above the root). The result carries no
/// leading `/`, and keeps a trailing `/` only when the last input segment
/// ends with one and the result is non-empty. Applying it to its own output
/// returns the output unchanged.
///
/// # Examples
///
/// ```
/// use s3static_core::path::join_and_normalize;
///
/// assert_eq!(join_and_normalize(&["/blog/", "index.html"]), "blog/index.html");
/// assert_eq!(join_and_normalize(&["/blog/"]), "blog/");
/// assert_eq!(join_and_normalize(&["/a/./b/../c"]), "a/c");
/// assert_eq!(join_and_normalize(&["/"]), "");
/// ```
#[must_use]
pub fn join_and_normalize(segments: &[&str]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in segments.iter().flat_map(|s| s.split('/')) {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let mut key = parts.join("/");
    let trailing = segments.last().is_some_and(|last| last.ends_with('/'));
    if trailing && !key.is_empty() {
        key.push('/');
    }
    key
}

/// The ordered try-files chain for one request.
///
/// 1. The requested key, or the index document under it for directory-style
///    paths.
/// 2. The error document, when the policy has one.
#[must_use]
pub fn candidate_keys(policy: &ServingPolicy, request_path: &str) -> Vec<String> {
    let first = if is_directory_style(request_path) {
        join_and_normalize(&[request_path, &policy.index_document])
    } else {
        join_and_normalize(&[request_path])
    };

    let mut candidates = vec![first];
    if !policy.error_document.is_empty() {
        candidates.push(join_and_normalize(&[&policy.error_document]));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_detect_directory_style_paths() {
        assert!(is_directory_style(""));
        assert!(is_directory_style("/"));
        assert!(is_directory_style("/blog/"));
        assert!(!is_directory_style("/blog"));
        assert!(!is_directory_style("/blog/index.html"));
    }

    #[test]
    fn test_should_join_and_normalize_segments() {
        assert_eq!(join_and_normalize(&["/blog/", "index.html"]), "blog/index.html");
        assert_eq!(join_and_normalize(&["/", "index.html"]), "index.html");
        assert_eq!(join_and_normalize(&["", "index.html"]), "index.html");
        assert_eq!(join_and_normalize(&["/a//b///c"]), "a/b/c");
        assert_eq!(join_and_normalize(&["/blog/"]), "blog/");
        assert_eq!(join_and_normalize(&["/blog"]), "blog");
        assert_eq!(join_and_normalize(&["/"]), "");
        assert_eq!(join_and_normalize(&[""]), "");
        assert_eq!(join_and_normalize(&[]), "");
    }

    #[test]
    fn test_should_not_escape_root() {
        assert_eq!(join_and_normalize(&["/../../etc/passwd"]), "etc/passwd");
        assert_eq!(join_and_normalize(&["/a/b/../../../c/"]), "c/");
        assert_eq!(join_and_normalize(&["/a/..", "/"]), "");
    }

    #[test]
    fn test_should_keep_trailing_slash_only_from_last_segment() {
        assert_eq!(join_and_normalize(&["/docs/", "guide"]), "docs/guide");
        assert_eq!(join_and_normalize(&["/docs", "guide/"]), "docs/guide/");
    }

    #[test]
    fn test_should_be_idempotent() {
        let inputs = [
            "/blog/",
            "/blog/index.html",
            "a/./b/../c/",
            "//x//y",
            "/",
            "",
            "../a",
            "/photos/2024/",
        ];
        for input in inputs {
            let once = join_and_normalize(&[input]);
            let twice = join_and_normalize(&[&once]);
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn test_should_build_directory_candidates() {
        let policy = ServingPolicy::new("site")
            .with_index_document("index.html")
            .with_error_document("404.html");
        assert_eq!(
            candidate_keys(&policy, "/blog/"),
            vec!["blog/index.html", "404.html"]
        );
        assert_eq!(candidate_keys(&policy, "/"), vec!["index.html", "404.html"]);
        assert_eq!(candidate_keys(&policy, ""), vec!["index.html", "404.html"]);
    }

    #[test]
    fn test_should_build_file_candidates() {
        let policy = ServingPolicy::new("site").with_index_document("index.html");
        assert_eq!(candidate_keys(&policy, "/blog/a.html"), vec!["blog/a.html"]);
    }

    #[test]
    fn test_should_normalize_error_document() {
        let policy = ServingPolicy::new("site")
            .with_index_document("index.html")
            .with_error_document("/errors/404.html");
        assert_eq!(
            candidate_keys(&policy, "/missing"),
            vec!["missing", "errors/404.html"]
        );
    }
}
