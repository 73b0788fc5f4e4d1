use crate::client::{DEFAULT_TIMEOUT_SECS, SiteClient, USER_AGENT};
use crate::error::{CrawlError, Result};
use crate::history::{CrawlReport, History, HistoryRecord};
use crate::page::Page;
use crate::robots::{RobotsGate, RobotsVerdict};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Breadth-first site crawler.
///
/// One crawl runs on a single sequential worker: the frontier is drained one
/// URL at a time and every fetch is awaited before the next begins, so the
/// history and robots cache need no locking. Every transport or robots
/// failure becomes a history entry; nothing raises past `crawl()` once it
/// has started, the only fatal input is an unparseable start URL.
pub struct Crawler {
    client: SiteClient,
    robots: RobotsGate,
    depth_limit: Option<u32>,
    crawl_delay: Duration,
    exclude_external: bool,
    exclude_patterns: Vec<String>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: SiteClient::with_timeout(timeout_secs)?,
            robots: RobotsGate::new(USER_AGENT),
            depth_limit: None,
            crawl_delay: Duration::from_secs(1),
            exclude_external: true,
            exclude_patterns: Vec::new(),
            progress_callback: None,
        })
    }

    /// Stop expanding links from pages at this BFS depth. The page at the
    /// limit is still fetched and recorded, only its outbound links are
    /// ignored.
    pub fn with_depth_limit(mut self, depth: u32) -> Self {
        self.depth_limit = Some(depth);
        self
    }

    /// Global pause inserted before every metadata fetch. Not per-host.
    pub fn with_crawl_delay(mut self, delay: Duration) -> Self {
        self.crawl_delay = delay;
        self
    }

    pub fn with_exclude_external(mut self, exclude: bool) -> Self {
        self.exclude_external = exclude;
        self
    }

    /// Regular expressions for URLs to exclude, checked in declaration
    /// order with first-match-wins semantics.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub async fn crawl(&mut self, start_url: &str) -> Result<CrawlReport> {
        let start = Url::parse(start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let exclude_patterns = compile_patterns(&self.exclude_patterns)?;

        let start_key = start.to_string();
        let start_netloc = start.authority().to_string();

        // fresh state per run; a robots failure poisons a host only for the
        // remainder of this crawl
        self.robots.reset();
        let mut history = History::new();
        history.seed(&start_key);

        info!("starting crawl of {}", start_key);

        while let Some(url) = history.next_url() {
            info!("processing: '{}'", url);
            debug!("urls left to be processed: {}", history.pending());

            if let Some(ref callback) = self.progress_callback {
                callback(url.clone());
            }

            let parsed = match Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(err) => {
                    // only absolute resolved URLs are ever enqueued
                    error!("unparseable URL in frontier: {}", err);
                    history.record_connection_error(&url, err.to_string());
                    continue;
                }
            };
            let netloc = parsed.authority().to_string();

            if netloc != start_netloc && self.exclude_external {
                let msg = "Matched URL exclude external host";
                debug!("{}", msg);
                history.record_exclusion(&url, msg.to_string());
                continue;
            }

            if let Some(pattern) = exclude_patterns.iter().find(|p| p.is_match(&url)) {
                let msg = format!("Matched URL exclude pattern '{}'", pattern.as_str());
                debug!("{}", msg);
                history.record_exclusion(&url, msg);
                continue;
            }

            match self.robots.check(&self.client, &parsed).await {
                RobotsVerdict::Allowed => {}
                RobotsVerdict::Denied => {
                    let msg = "Matched robots.txt exclude rule.";
                    debug!("{}", msg);
                    history.record_exclusion(&url, msg.to_string());
                    continue;
                }
                RobotsVerdict::FetchFailed(err) => {
                    error!("while connecting: {}", err);
                    history.record_connection_error(&url, err);
                    continue;
                }
            }

            // global rate limit, applied only once every gate has passed
            tokio::time::sleep(self.crawl_delay).await;

            info!("visiting: '{}'", url);
            let head = match self.client.head(&url).await {
                Ok(response) => response,
                Err(err) => {
                    error!("while connecting: {}", err);
                    history.record_connection_error(&url, err.to_string());
                    continue;
                }
            };

            let status = i32::from(head.status().as_u16());
            if let Some(record) = history.record_mut(&url) {
                record.response_code = Some(status);
            }

            // decide whether to look for more links on this resource
            let content_type = head
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let Some(content_type) = content_type else {
                debug!("filtered out content with missing Content-Type header");
                continue;
            };
            if !content_type.to_lowercase().contains("text/html") {
                debug!("filtered out non-HTML content: {}", content_type);
                continue;
            }
            if status >= 400 {
                debug!("filtered out error status code: {}", status);
                continue;
            }
            if netloc != start_netloc {
                debug!("filtered out external url: {}", netloc);
                continue;
            }

            let page_depth = history.record(&url).map(|r| r.depth).unwrap_or(0);
            if let Some(limit) = self.depth_limit {
                // a page at exactly the limit is fetched but not expanded
                if limit <= page_depth {
                    debug!("ignoring links for url with depth {}: {}", page_depth, url);
                    continue;
                }
            }

            let response = match self.client.get(&url).await {
                Ok(response) => response,
                Err(err) => {
                    // unexpected, the HEAD for this URL just succeeded
                    error!("while connecting: {}", err);
                    if let Some(record) = history.record_mut(&url) {
                        record.error_text =
                            Some(format!("While retrieving HTML content for {}: {}", url, err));
                    }
                    continue;
                }
            };

            // links resolve against the final post-redirect URL
            let final_url = response.url().clone();
            let get_status = i32::from(response.status().as_u16());
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    error!("while reading body: {}", err);
                    if let Some(record) = history.record_mut(&url) {
                        record.error_text =
                            Some(format!("While retrieving HTML content for {}: {}", url, err));
                    }
                    continue;
                }
            };

            let page = Page::parse(&body);
            for raw_href in page.anchor_hrefs() {
                let href = raw_href.trim();
                debug!("found url: {}", href);

                if href.is_empty() || href.starts_with("mailto:") {
                    continue;
                }

                let full_href = match final_url.join(href) {
                    Ok(resolved) => resolved.to_string(),
                    Err(err) => {
                        debug!("skipping unresolvable href '{}': {}", href, err);
                        continue;
                    }
                };

                if let Some(id) = href.strip_prefix('#') {
                    // same-page fragment: resolved in place, never enqueued,
                    // recorded with the parent's status and depth
                    let error_text = if page.has_element_with_id(id) {
                        debug!("adding URL fragment to history as exists: {}", href);
                        None
                    } else {
                        debug!("adding URL fragment to history as does not exist: {}", href);
                        Some(format!("Element with id '{}' not found in HTML DOM", id))
                    };

                    if history.contains(&full_href) {
                        history.add_referrer(&full_href, &url);
                        // last-checked referrer wins
                        if let Some(record) = history.record_mut(&full_href) {
                            record.error_text = error_text;
                        }
                    } else {
                        history.insert(
                            &full_href,
                            HistoryRecord {
                                response_code: Some(get_status),
                                visited_from: vec![Some(url.clone())],
                                error_text,
                                depth: page_depth,
                            },
                        );
                    }
                    continue;
                }

                if history.contains(&full_href) {
                    debug!("marking '{}' as visited from '{}'", full_href, url);
                    history.add_referrer(&full_href, &url);
                } else {
                    debug!("adding URL to history and frontier: {}", full_href);
                    history.discover(&full_href, &url, page_depth + 1);
                }
            }
        }

        info!("crawl complete, {} urls in history", history.len());
        Ok(history.into_report(start_key))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| CrawlError::InvalidPattern(p.clone(), e)))
        .collect()
}
