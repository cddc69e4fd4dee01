use url::Url;

/// Extracts the comparable host of a URL
///
/// The host is lowercased and a single leading `www.` is removed. URLs
/// without a host (`mailto:`, `javascript:`, `data:`) return `None`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use link_matrix::url::host_key;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(host_key(&url), None);
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    if host.is_empty() {
        return None;
    }

    match host.strip_prefix("www.") {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(host),
    }
}

/// Returns true if both URLs live on the same site, ignoring `www.`
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (host_key(a), host_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Returns true if two URL strings live on the same site
///
/// Hosts are compared case-insensitively after stripping a leading `www.`
/// from each. Unparsable input is never same-domain.
///
/// # Examples
///
/// ```
/// use link_matrix::url::same_domain;
///
/// assert!(same_domain("https://ex.com/x", "https://www.ex.com/y"));
/// assert!(!same_domain("https://ex.com/x", "https://other.com/y"));
/// ```
pub fn same_domain(a: &str, b: &str) -> bool {
    match (Url::parse(a.trim()), Url::parse(b.trim())) {
        (Ok(a), Ok(b)) => same_host(&a, &b),
        _ => false,
    }
}
