use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors from validating the catalog API base URL.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain http to a remote host.
    #[error("Insecure URL: HTTPS required for {0} (plain http is only allowed for localhost)")]
    InsecureRemote(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates the base URL of the catalog API.
///
/// Accepts `https` for any host and plain `http` only for loopback hosts
/// (`localhost`, `127.0.0.0/8`, `::1`), which is where local mock servers
/// and tests run.
///
/// # Examples
///
/// ```
/// use bloom::util::validate_base_url;
///
/// assert!(validate_base_url("https://example.mockapi.io/api/v1/").is_ok());
/// assert!(validate_base_url("http://127.0.0.1:8080/").is_ok());
/// assert!(validate_base_url("http://example.com/").is_err());
/// assert!(validate_base_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;

    match url.scheme() {
        "https" => {}
        "http" if is_loopback_host(host) => {}
        "http" => return Err(UrlValidationError::InsecureRemote(host.to_owned())),
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}
