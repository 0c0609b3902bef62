//! Upstream URL construction.

use catcache_core::CacheKey;

/// Error type for upstream URL failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL cannot carry path segments: {0}")]
    CannotBeABase(String),
}

/// Canonicalize the configured upstream base URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...) and query string
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);
    parsed.set_query(None);

    Ok(parsed)
}

/// URL of the resource for `key`: the base with the key appended as one path
/// segment.
///
/// Any path already on the base is kept. Keys are taken from the request
/// path still percent-encoded, so existing `%XX` escapes are forwarded as-is;
/// only characters that are not valid in a path get encoded.
pub fn resource_url(base: &url::Url, key: &CacheKey) -> Result<url::Url, UrlError> {
    if base.cannot_be_a_base() {
        return Err(UrlError::CannotBeABase(base.to_string()));
    }

    let mut url = base.clone();
    let dotted = key.as_str().to_ascii_lowercase().replace("%2e", ".");
    if dotted == "." || dotted == ".." {
        // Would be collapsed as a dot segment; send the escapes literally instead.
        url.path_segments_mut()
            .map_err(|()| UrlError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .push(key.as_str());
    } else {
        url.set_path(&format!("{}/{}", base.path().trim_end_matches('/'), key));
    }
    Ok(url)
}
