// src/services/fetch.rs
use log::{debug, info};
use reqwest::{header, Client, StatusCode};
use thiserror::Error;

pub const DEFAULT_SOURCE_URL: &str = "https://tradingeconomics.com/pakistan/consumer-price-index-cpi";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
}

fn build_client() -> Result<Client, reqwest::Error> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, header::HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
}

/// Download the indicator page as text.
pub async fn fetch_document(url: &str) -> Result<String, FetchError> {
    let transport = |source: reqwest::Error| FetchError::Transport { url: url.to_string(), source };

    info!("Fetching indicator page from URL: {}", url);
    let client = build_client().map_err(transport)?;
    let response = client.get(url).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: url.to_string(), status });
    }

    let body = response.text().await.map_err(transport)?;
    debug!("Received {} bytes", body.len());
    Ok(body)
}
