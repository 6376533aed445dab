use url::Url;

/// Normalized hostname of a url: scheme, path and query stripped, leading
/// "www." removed. Pages without a trackable host (chrome://extensions,
/// about:blank, malformed strings) yield `None`.
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    // Internal browser pages parse fine but have no real hostname.
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
