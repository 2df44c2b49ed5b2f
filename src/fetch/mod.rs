mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request never produced a usable response: connection failure,
    /// timeout, or a malformed response body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Fetches the raw bytes of a remote feed.
///
/// # Errors
///
/// Returns [`FetchError::Status`] for a non-2xx answer and
/// [`FetchError::Transport`] when the request itself fails.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let url = url
        .parse::<reqwest::Url>()
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.bytes().await?.to_vec())
}
