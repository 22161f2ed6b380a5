//! HTTP source for the public data repository.

use cvd_core::{CovidError, Result};
use futures::FutureExt;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

use crate::source::{FileSource, LoadFuture};

/// Root of the published data files.
pub const DEFAULT_DATA_URL: &str = "https://raw.githubusercontent.com/inf-covid19/covid19-data/master";

/// Cache-busting query appended to data file requests.
pub const DATA_QUERY: &str = "?v=2";

const MAX_TRIES: u32 = 3;
const INITIAL_BACKOFF_MILLIS: u64 = 1000;

/// Downloads files relative to a base URL, retrying failed requests with
/// exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
    query: String,
    pinned: HashMap<String, String>,
    max_tries: u32,
    backoff: Duration,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_URL)
    }
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        HttpSource {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            query: DATA_QUERY.to_string(),
            pinned: HashMap::new(),
            max_tries: MAX_TRIES,
            backoff: Duration::from_millis(INITIAL_BACKOFF_MILLIS),
        }
    }

    /// Serve `path` from a full URL instead of the base URL.
    pub fn pin(mut self, path: &str, url: &str) -> Self {
        self.pinned.insert(path.to_string(), url.to_string());
        self
    }

    pub fn with_retries(mut self, max_tries: u32, backoff: Duration) -> Self {
        self.max_tries = max_tries.max(1);
        self.backoff = backoff;
        self
    }

    pub fn url(&self, path: &str) -> String {
        match self.pinned.get(path) {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}{}",
                self.base_url,
                path.trim_start_matches('/'),
                self.query
            ),
        }
    }
}

impl FileSource for HttpSource {
    fn load(&self, path: &str) -> LoadFuture {
        let client = self.client.clone();
        let url = self.url(path);
        let max_tries = self.max_tries;
        let backoff = self.backoff;
        async move { get_with_retry(&client, &url, max_tries, backoff).await }.boxed_local()
    }
}

async fn get_with_retry(client: &Client, url: &str, max_tries: u32, backoff: Duration) -> Result<String> {
    let mut sleep_for = backoff;
    let mut last_error = CovidError::HttpRequest(format!("no attempt made for {}", url));

    for attempt in 1..=max_tries {
        match client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => match response.text().await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: Failed to read response body for {}: {}",
                        attempt, max_tries, url, e
                    );
                    last_error = CovidError::HttpRequest(e.to_string());
                }
            },
            Ok(response) => {
                warn!(
                    "Attempt {}/{}: Bad response status for {}: {}",
                    attempt,
                    max_tries,
                    url,
                    response.status()
                );
                last_error = CovidError::HttpStatus {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                };
                // retrying will not make a missing file appear
                if response.status() == StatusCode::NOT_FOUND {
                    break;
                }
            }
            Err(e) => {
                warn!("Attempt {}/{}: Request failed for {}: {}", attempt, max_tries, url, e);
                last_error = CovidError::HttpRequest(e.to_string());
            }
        }

        if attempt < max_tries {
            info!("Sleeping for {} milliseconds before retry for {}", sleep_for.as_millis(), url);
            tokio::time::sleep(sleep_for).await;
            sleep_for *= 2;
        }
    }

    warn!("All attempts failed for {}", url);
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::METADATA_FILE;

    #[test]
    fn urls_join_base_path_and_query() {
        let source = HttpSource::new("https://example.org/data/");
        assert_eq!(
            source.url("data/brazil.csv"),
            "https://example.org/data/data/brazil.csv?v=2"
        );
    }

    #[test]
    fn pinned_paths_use_their_own_url() {
        let source = HttpSource::default().pin(METADATA_FILE, "https://example.org/meta.json");
        assert_eq!(source.url(METADATA_FILE), "https://example.org/meta.json");
        assert!(source.url("data/italy.csv").starts_with(DEFAULT_DATA_URL));
    }

    #[tokio::test]
    async fn unreachable_host_fails_after_retries() {
        // port 9 (discard) on localhost refuses connections
        let source = HttpSource::new("http://127.0.0.1:9").with_retries(2, Duration::from_millis(1));
        let result = source.load("data/italy.csv").await;
        assert!(matches!(result, Err(CovidError::HttpRequest(_))));
    }
}
