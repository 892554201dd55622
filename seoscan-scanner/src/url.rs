use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::Url;

/// The site an analysis runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTarget {
    /// Normalized base URL, no trailing slash, no query or fragment
    pub base_url: String,
    /// Host with any leading `www.` removed
    pub domain: String,
}

impl SiteTarget {
    pub fn url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| ScanError::InvalidUrl(e.to_string()))
    }

    /// Append a path to the base URL (`{base}/robots.txt`, `{base}/sitemap.xml`).
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `scheme://host[:port]` of the base URL.
    pub fn origin(&self) -> String {
        site_origin(&self.base_url)
    }
}

/// Normalize user input into a `SiteTarget`.
///
/// Adds `https://` when no scheme is given, drops query and fragment and strips
/// trailing slashes from the path.
pub fn normalize_url(raw: &str) -> Result<SiteTarget> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidUrl("empty URL".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if lower.contains("://") {
        return Err(ScanError::InvalidUrl(format!(
            "unsupported scheme in {}",
            trimmed
        )));
    } else {
        format!("https://{}", trimmed)
    };

    let parsed =
        Url::parse(&candidate).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ScanError::InvalidUrl(format!("{}: missing host", trimmed)))?;

    if !is_plausible_host(host) {
        return Err(ScanError::InvalidUrl(format!(
            "{}: '{}' is not a valid host",
            trimmed, host
        )));
    }

    let mut base_url = site_root(&parsed);
    let path = parsed.path().trim_end_matches('/');
    base_url.push_str(path);

    Ok(SiteTarget {
        base_url,
        domain: strip_www(host).to_string(),
    })
}

fn is_plausible_host(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() || host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Resolve an `href` against the page it appeared on.
///
/// Returns `None` for empty, fragment-only and non-navigational hrefs
/// (`javascript:`, `mailto:`, `tel:`, `data:`) and for non-http schemes.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

pub fn strip_query_and_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}

/// Host equals `domain` or is a subdomain of it, ignoring a `www.` prefix.
pub fn is_same_site(url: &Url, domain: &str) -> bool {
    let domain = strip_www(domain);
    match url.host_str() {
        Some(host) => {
            let host = strip_www(host);
            host.eq_ignore_ascii_case(domain) || host.ends_with(&format!(".{}", domain))
        }
        None => false,
    }
}

/// `scheme://host[:port]`
pub fn site_root(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

fn site_origin(base_url: &str) -> String {
    Url::parse(base_url)
        .map(|u| site_root(&u))
        .unwrap_or_else(|_| base_url.trim_end_matches('/').to_string())
}

/// Extract the path from a URL for display
pub fn url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path.to_string()
            }
        })
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // normalize_url
    // ============================================================================

    #[test]
    fn test_normalize_adds_https_scheme() {
        let target = normalize_url("example.com").unwrap();
        assert_eq!(target.base_url, "https://example.com");
        assert_eq!(target.domain, "example.com");
    }

    #[test]
    fn test_normalize_keeps_http_scheme() {
        let target = normalize_url("http://example.com/").unwrap();
        assert_eq!(target.base_url, "http://example.com");
    }

    #[test]
    fn test_normalize_strips_query_fragment_and_trailing_slash() {
        let target = normalize_url("  https://www.example.com/blog/?utm=1#top ").unwrap();
        assert_eq!(target.base_url, "https://www.example.com/blog");
        assert_eq!(target.domain, "example.com");
    }

    #[test]
    fn test_normalize_keeps_port() {
        let target = normalize_url("http://127.0.0.1:8080/").unwrap();
        assert_eq!(target.base_url, "http://127.0.0.1:8080");
        assert_eq!(target.domain, "127.0.0.1");
    }

    #[test]
    fn test_normalize_accepts_localhost() {
        assert!(normalize_url("localhost:3000").is_ok());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(matches!(normalize_url(""), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(
            normalize_url("not a url"),
            Err(ScanError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_url("ftp://example.com"),
            Err(ScanError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_url("https://intranet"),
            Err(ScanError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_url("Example.com/shop/").unwrap();
        let twice = normalize_url(&once.base_url).unwrap();
        assert_eq!(once, twice);
    }

    // ============================================================================
    // Link helpers
    // ============================================================================

    #[test]
    fn test_resolve_link_skips_non_navigational() {
        let base = Url::parse("https://example.com/a/").unwrap();
        for href in ["", "#top", "javascript:void(0)", "mailto:x@y.z", "tel:123", "data:text/plain,hi"] {
            assert!(resolve_link(&base, href).is_none(), "{} should be skipped", href);
        }
    }

    #[test]
    fn test_resolve_link_relative_and_fragment() {
        let base = Url::parse("https://example.com/a/").unwrap();
        let resolved = resolve_link(&base, "b?x=1#frag").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/b?x=1");
        let stripped = strip_query_and_fragment(&resolved);
        assert_eq!(stripped.as_str(), "https://example.com/a/b");
    }

    #[test]
    fn test_is_same_site() {
        let url = Url::parse("https://www.example.com/x").unwrap();
        assert!(is_same_site(&url, "example.com"));
        let sub = Url::parse("https://blog.example.com/x").unwrap();
        assert!(is_same_site(&sub, "example.com"));
        let other = Url::parse("https://notexample.com/x").unwrap();
        assert!(!is_same_site(&other, "example.com"));
    }

    #[test]
    fn test_site_root_and_join() {
        let target = normalize_url("http://localhost:8080/shop").unwrap();
        assert_eq!(target.join("/robots.txt"), "http://localhost:8080/shop/robots.txt");
        assert_eq!(target.origin(), "http://localhost:8080");
        assert_eq!(url_path("https://example.com"), "/");
        assert_eq!(url_path("https://example.com/about"), "/about");
    }
}
