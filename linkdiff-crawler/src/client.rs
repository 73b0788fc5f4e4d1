use crate::error::Result;
use std::time::Duration;

/// User agent sent with every outbound request. Sites can target it in
/// robots.txt rules.
pub const USER_AGENT: &str = concat!(
    "linkdiff/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/linkdiff/linkdiff)"
);

/// Default per-request timeout in seconds, applied to every transport call
/// unless overridden through [`SiteClient::with_timeout`].
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Thin wrapper around [`reqwest::Client`] carrying the crawler's network
/// identity. Exposes the three fetch capabilities the crawl engine needs:
/// a metadata-only request, a full content fetch, and the robots.txt fetch.
pub struct SiteClient {
    client: reqwest::Client,
}

impl SiteClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// HEAD-equivalent request, following redirects.
    pub async fn head(&self, url: &str) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.client.head(url).send().await
    }

    /// Full content fetch.
    pub async fn get(&self, url: &str) -> std::result::Result<reqwest::Response, reqwest::Error> {
        self.client.get(url).send().await
    }

    /// Fetch the robots.txt body for a host. Any HTTP response counts as a
    /// success here; only transport failures are errors. A 404 body parses
    /// into an empty rule set that allows everything.
    pub async fn fetch_robots(
        &self,
        scheme: &str,
        netloc: &str,
    ) -> std::result::Result<String, reqwest::Error> {
        let robots_url = format!("{}://{}/robots.txt", scheme, netloc);
        let response = self.client.get(&robots_url).send().await?;
        response.text().await
    }
}
