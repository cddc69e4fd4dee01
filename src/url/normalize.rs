use crate::url::domain::host_key;
use crate::url::NormalizedKey;
use url::Url;

/// Resolves a possibly-relative URL against a base URL
///
/// Returns `None` when either side is malformed. Callers treat `None` as
/// "drop this link"; a bad href is never reported as an error.
///
/// # Examples
///
/// ```
/// use link_matrix::url::resolve;
///
/// let url = resolve("../b", "https://example.com/posts/a").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
///
/// assert!(resolve("http://[broken", "https://example.com/").is_none());
/// ```
pub fn resolve(raw: &str, base: &str) -> Option<Url> {
    let base = Url::parse(base.trim()).ok()?;
    base.join(raw.trim()).ok()
}

/// Derives the identity key of a URL
///
/// # Normalization Steps
///
/// 1. Read input without an `http://` or `https://` scheme as `https://`
/// 2. Lowercase the host and remove every leading `www.` (ports other than 80 and 443 are kept)
/// 3. Append the path
/// 4. Drop query string and fragment
/// 5. Remove trailing slashes and lowercase the result
///
/// Input that still fails to parse falls back to a lowercase copy with any
/// scheme prefix and trailing slashes removed, so every string has a key.
/// Feeding a key back through this function returns the same key.
///
/// # Examples
///
/// ```
/// use link_matrix::url::canonical_key;
///
/// let a = canonical_key("https://www.Example.com/Posts/A/?utm_source=x#top");
/// let b = canonical_key("http://example.com/posts/a");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "example.com/posts/a");
/// ```
pub fn canonical_key(url: &str) -> NormalizedKey {
    let url = url.trim();
    if url.is_empty() {
        return NormalizedKey(String::new());
    }

    let candidate = if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    let key = match Url::parse(&candidate) {
        Ok(parsed) => match host_key(&parsed) {
            Some(host) => {
                // every leading `www.` label, not just the first
                let host = host.trim_start_matches("www.");
                let host = match parsed.port() {
                    Some(port) if port != 80 && port != 443 => format!("{}:{}", host, port),
                    _ => host.to_string(),
                };
                format!("{}{}", host, parsed.path())
            }
            None => fallback_key(url),
        },
        Err(_) => fallback_key(url),
    };

    NormalizedKey(key.trim_end_matches('/').to_lowercase())
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn fallback_key(url: &str) -> String {
    let lower = url.to_lowercase();
    lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower)
        .to_string()
}
