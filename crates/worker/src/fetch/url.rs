//! URL resolution for requests entering the worker.

use url::Url;

/// Browser-internal schemes the worker never intercepts.
pub const INTERNAL_SCHEMES: &[&str] = &["chrome-extension", "moz-extension", "devtools"];

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

pub fn is_internal_scheme(url: &Url) -> bool {
    INTERNAL_SCHEMES.contains(&url.scheme())
}

/// Resolve a request URL the way a page would.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve site-relative input (`/styles.css`) against the origin
/// 3. Lowercase the host
/// 4. Remove the fragment
/// 5. Keep the query string intact
///
/// Internal browser schemes are accepted so the caller can decide to let
/// them through untouched; any other non-http(s) scheme is rejected.
pub fn resolve(input: &str, origin: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        origin.join(trimmed)
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme if INTERNAL_SCHEMES.contains(&scheme) => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://portfolio.test").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve("/styles.css", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://portfolio.test/styles.css");
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve("https://fonts.googleapis.com/css2?family=Inter", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("fonts.googleapis.com"));
        assert_eq!(url.query(), Some("family=Inter"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve("https://CDNJS.Cloudflare.com/a.css", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("cdnjs.cloudflare.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve("  /index.html#projects  ", &origin()).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_resolve_internal_scheme_accepted() {
        let url = resolve("chrome-extension://abcdef/popup.html", &origin()).unwrap();
        assert!(is_internal_scheme(&url));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve("file:///etc/passwd", &origin());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve("", &origin()), Err(UrlError::Empty)));
        assert!(matches!(resolve("   ", &origin()), Err(UrlError::Empty)));
    }

    #[test]
    fn test_http_is_not_internal() {
        assert!(!is_internal_scheme(&origin()));
    }
}
