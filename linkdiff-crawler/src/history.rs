use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;

/// Response code recorded for a transport-level failure (DNS, TLS, timeout,
/// connection refused).
pub const CODE_CONNECTION_ERROR: i32 = 0;

/// Response code recorded for a URL that policy excluded from fetching
/// (external host, exclude pattern, robots.txt denial).
pub const CODE_EXCLUDED: i32 = -1;

/// The visitation record kept for every URL the crawl ever saw.
///
/// `response_code` is `None` while a URL is discovered but not yet visited,
/// `Some(0)` for a transport failure and `Some(-1)` for a policy exclusion.
/// `visited_from` keeps one entry per inbound link occurrence, in discovery
/// order, with a leading `None` for the start URL. `depth` is the BFS
/// distance at first discovery and is never updated afterwards, even when a
/// shorter path shows up later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub response_code: Option<i32>,
    pub visited_from: Vec<Option<String>>,
    #[serde(default)]
    pub error_text: Option<String>,
    pub depth: u32,
}

impl HistoryRecord {
    /// Record for the start URL itself.
    pub fn seed() -> Self {
        Self {
            response_code: None,
            visited_from: vec![None],
            error_text: None,
            depth: 0,
        }
    }

    /// Record for a URL first discovered through a link on `referrer`.
    pub fn discovered(referrer: &str, depth: u32) -> Self {
        Self {
            response_code: None,
            visited_from: vec![Some(referrer.to_string())],
            error_text: None,
            depth,
        }
    }
}

/// The persisted artifact of one crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub history: BTreeMap<String, HistoryRecord>,
}

impl CrawlReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Visitation history plus the FIFO frontier of URLs pending a fetch.
///
/// Pure data structure: membership, insertion and referrer appends live
/// here, all crawl policy lives in the engine. A URL enters the frontier at
/// most once, gated on history membership, which is what guarantees
/// termination on a finite link graph.
#[derive(Debug, Default)]
pub struct History {
    records: BTreeMap<String, HistoryRecord>,
    frontier: VecDeque<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history and frontier with the start URL at depth 0.
    pub fn seed(&mut self, start_url: &str) {
        self.records.insert(start_url.to_string(), HistoryRecord::seed());
        self.frontier.push_back(start_url.to_string());
    }

    /// Pop the next URL pending a fetch.
    pub fn next_url(&mut self) -> Option<String> {
        self.frontier.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.frontier.len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.records.contains_key(url)
    }

    pub fn record(&self, url: &str) -> Option<&HistoryRecord> {
        self.records.get(url)
    }

    pub fn record_mut(&mut self, url: &str) -> Option<&mut HistoryRecord> {
        self.records.get_mut(url)
    }

    /// Add a newly discovered URL and enqueue it for fetching.
    pub fn discover(&mut self, url: &str, referrer: &str, depth: u32) {
        self.records
            .insert(url.to_string(), HistoryRecord::discovered(referrer, depth));
        self.frontier.push_back(url.to_string());
    }

    /// Insert a record without enqueueing, used for fragment URLs that are
    /// resolved in place rather than fetched.
    pub fn insert(&mut self, url: &str, record: HistoryRecord) {
        self.records.insert(url.to_string(), record);
    }

    /// Append one inbound link occurrence. Duplicate referrers are kept: a
    /// page linking to the same target twice produces two entries.
    pub fn add_referrer(&mut self, url: &str, referrer: &str) {
        if let Some(record) = self.records.get_mut(url) {
            record.visited_from.push(Some(referrer.to_string()));
        }
    }

    pub fn record_exclusion(&mut self, url: &str, reason: String) {
        if let Some(record) = self.records.get_mut(url) {
            record.response_code = Some(CODE_EXCLUDED);
            record.error_text = Some(reason);
        }
    }

    pub fn record_connection_error(&mut self, url: &str, error: String) {
        if let Some(record) = self.records.get_mut(url) {
            record.response_code = Some(CODE_CONNECTION_ERROR);
            record.error_text = Some(error);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_report(self, start_url: String) -> CrawlReport {
        CrawlReport {
            start_url,
            history: self.records,
        }
    }
}
