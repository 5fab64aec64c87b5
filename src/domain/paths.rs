//! Public path normalization shared by routing and revalidation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path `{0}` must start with `/`")]
    NotAbsolute(String),
    #[error("path `{0}` must not contain whitespace")]
    Whitespace(String),
}

/// Canonical form of a public path: leading slash, no query or fragment,
/// no trailing slash except for the root.
pub fn normalize_path(raw: &str) -> Result<String, PathError> {
    if raw.is_empty() {
        return Err(PathError::Empty);
    }
    if !raw.starts_with('/') {
        return Err(PathError::NotAbsolute(raw.to_string()));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(PathError::Whitespace(raw.to_string()));
    }

    let without_fragment = raw.split('#').next().unwrap_or(raw);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    let trimmed = without_query.trim_end_matches('/');

    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Path a cached entry is tagged with when it is reachable under `normalized`.
/// The first blog index page is served from `/blog`.
pub fn tag_path(normalized: &str) -> &str {
    match normalized {
        "/blog/page/1" => "/blog",
        other => other,
    }
}

/// Whether `target` is safe to redirect to: a local absolute path only.
pub fn is_local_redirect(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_blog_page_aliases_the_index() {
        assert_eq!(tag_path("/blog/page/1"), "/blog");
        assert_eq!(tag_path("/blog/page/2"), "/blog/page/2");
        assert_eq!(tag_path("/blog"), "/blog");
    }

    #[test]
    fn normalizes_trailing_slash_and_query() {
        assert_eq!(normalize_path("/blog/").unwrap(), "/blog");
        assert_eq!(normalize_path("/blog/hello?x=1#top").unwrap(), "/blog/hello");
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert_eq!(normalize_path("///").unwrap(), "/");
    }

    #[test]
    fn rejects_relative_and_empty_paths() {
        assert_eq!(normalize_path(""), Err(PathError::Empty));
        assert!(matches!(
            normalize_path("blog/hello"),
            Err(PathError::NotAbsolute(_))
        ));
        assert!(matches!(
            normalize_path("/blog/ hello"),
            Err(PathError::Whitespace(_))
        ));
    }

    #[test]
    fn local_redirects_only() {
        assert!(is_local_redirect("/blog/hello"));
        assert!(!is_local_redirect("//evil.example"));
        assert!(!is_local_redirect("/\\evil.example"));
        assert!(!is_local_redirect("https://evil.example"));
        assert!(!is_local_redirect("/a\r\nSet-Cookie: x"));
    }
}
