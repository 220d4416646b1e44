use crate::catalog::Category;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Fixed deadline for one catalog request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_CATALOG_SIZE: usize = 5 * 1024 * 1024; // 5MB

const CATEGORY_PATH: &str = "category";

/// Errors that can occur while fetching the catalog.
///
/// All of these are non-fatal to a session: the caller keeps whatever
/// catalog it already had.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not a JSON array of categories
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 5MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// The base URL could not be turned into an endpoint URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Network access was disabled for this session
    #[error("Offline: network access disabled")]
    Offline,
    /// The background refresh task panicked
    #[error("Refresh task failed: {0}")]
    Task(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// Build the HTTP client shared by every request in a session.
///
/// Requests carry `Content-Type: application/json` and the given timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(concat!("bloom/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

/// Resolve the `category` endpoint against the API base URL.
///
/// The base is treated as a directory whether or not it ends in `/`, so
/// `https://host/api/v1` and `https://host/api/v1/` both yield
/// `https://host/api/v1/category`.
pub fn category_url(base_url: &Url) -> Result<Url, FetchError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(CATEGORY_PATH)?)
}

/// Fetches the full catalog with `GET {base_url}/category`.
///
/// Single attempt, no retry. The whole exchange (connect, headers, and
/// body) must finish within `timeout`.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - deadline exceeded
/// - [`FetchError::Network`] - connection or TLS errors
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body over 5MB
/// - [`FetchError::Parse`] - body is not a JSON array of categories
pub async fn fetch_categories(
    client: &reqwest::Client,
    base_url: &Url,
    timeout: Duration,
) -> Result<Vec<Category>, FetchError> {
    let url = category_url(base_url)?;

    let categories = tokio::time::timeout(timeout, fetch_json(client, &url))
        .await
        .map_err(|_| FetchError::Timeout)??;

    let item_count: usize = categories.iter().map(|c| c.items.len()).sum();
    tracing::debug!(
        url = %url,
        categories = categories.len(),
        items = item_count,
        "Fetched catalog"
    );

    Ok(categories)
}

async fn fetch_json(client: &reqwest::Client, url: &Url) -> Result<Vec<Category>, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_CATALOG_SIZE).await?;

    serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_reqwest)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
