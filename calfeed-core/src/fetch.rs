//! Feed transport.

use std::future::Future;

use tracing::debug;
use url::Url;

use crate::error::{FeedError, FeedResult};
use crate::source::FetchMethod;

/// Returns the raw bytes of a feed. One attempt, no retries.
pub trait Fetcher {
    fn fetch(
        &self,
        url: &str,
        method: FetchMethod,
    ) -> impl Future<Output = FeedResult<Vec<u8>>> + Send;
}

/// Fetches `http(s)://`, `webcal(s)://` and `file://` URLs.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch_http(&self, url: &str, method: FetchMethod) -> FeedResult<Vec<u8>> {
        let fetch_error = |reason: String| FeedError::Fetch {
            url: url.to_string(),
            reason,
        };

        let request = match method {
            FetchMethod::Get => self.client.get(url),
            FetchMethod::Post => self.client.post(url),
        };

        let response = request.send().await.map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        Ok(body.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, method: FetchMethod) -> FeedResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|_| FeedError::UnsupportedUrl(url.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(url, method).await,
            "webcal" | "webcals" => {
                let http = normalize_webcal(url);
                debug!(from = url, to = %http, "Rewrote webcal URL");
                self.fetch_http(&http, method).await
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| FeedError::UnsupportedUrl(url.to_string()))?;
                tokio::fs::read(&path).await.map_err(|e| FeedError::Fetch {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(FeedError::UnsupportedUrl(url.to_string())),
        }
    }
}

/// Map `webcal://` to `http://` and `webcals://` to `https://`.
pub fn normalize_webcal(url: &str) -> String {
    for (scheme, replacement) in [("webcals://", "https://"), ("webcal://", "http://")] {
        if let Some(prefix) = url.get(..scheme.len())
            && prefix.eq_ignore_ascii_case(scheme)
        {
            return format!("{}{}", replacement, &url[scheme.len()..]);
        }
    }
    url.to_string()
}
