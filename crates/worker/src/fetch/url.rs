//! URL resolution for request identity and manifest entries.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a possibly relative URL against `origin` into its canonical form.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references (`/static/app.js`, `page`) onto the origin
/// 3. Require http or https
/// 4. Remove fragment (#...); the host is lowercased by the parser
/// 5. Keep query string intact (do not reorder)
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match url::Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:5000").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "/static/css/style.css").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/static/css/style.css");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.path(), "/");
        assert_eq!(url.host_str(), Some("localhost"));
    }

    #[test]
    fn test_resolve_absolute_keeps_host() {
        let url = resolve(&origin(), "https://CDN.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.min.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.jsdelivr.net"));
        assert_eq!(url.path(), "/npm/chart.js@4.4.0/dist/chart.min.js");
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/dashboard#projects").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/dashboard");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/api/user/recommendations?limit=5").unwrap();
        assert_eq!(url.query(), Some("limit=5"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /api/flows  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/flows");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }
}
