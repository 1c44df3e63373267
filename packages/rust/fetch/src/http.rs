//! HTTP client shared by the feed fetch and attachment requests.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};

use tenderwatch_shared::{Result, TenderError};

/// The feed only answers browser-like clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Referer sent with every request.
pub const REFERER_URL: &str = "https://canadabuys.canada.ca/en/tender-opportunities";

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Build a client carrying the fixed request headers and the given per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()
        .map_err(|e| TenderError::Network(format!("failed to build HTTP client: {e}")))
}
