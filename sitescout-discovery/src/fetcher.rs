use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Sitescout/0.2; +https://github.com/sitescout/sitescout)";

/// HEAD existence checks get a short leash; content fetches a longer one.
const DEFAULT_HEAD_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_GET_TIMEOUT: Duration = Duration::from_secs(30);

/// Single-shot HTTP fetch primitive for the discovery pipeline.
///
/// One attempt per call, no retries. Anything other than a 200 response
/// (non-200 status, connection error, timeout) is a soft failure: callers
/// get `None`/`false` and the source simply contributes nothing. Gzip
/// response bodies are inflated transparently by reqwest.
///
/// The fetcher is an explicit value handed to the Discoverer and Aggregator
/// at construction time, so tests can point it at a local mock server
/// instead of sharing a module-level client.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    head_timeout: Duration,
    get_timeout: Duration,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(DEFAULT_HEAD_TIMEOUT, DEFAULT_GET_TIMEOUT)
    }

    pub fn with_timeouts(head_timeout: Duration, get_timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/xml, text/xml, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(50)
            .build()?;

        Ok(Self {
            client,
            head_timeout,
            get_timeout,
        })
    }

    /// Fetch a document body with a GET request. Returns `Some(body)` only
    /// for an HTTP 200 response; everything else is absorbed as `None`.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(self.get_timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("GET {} returned {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!("GET {} body read failed: {}", url, e);
                None
            }
        }
    }

    /// Existence check with a HEAD request: `true` iff the server answered
    /// 200. The body, if any, is discarded.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.head_timeout).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }
}
