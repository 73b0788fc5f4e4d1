use crate::crawl::load_report;
use anyhow::{Context, Result, bail};
use linkdiff_crawler::history::{CrawlReport, HistoryRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Numeric summary of one comparison, rebuilt by the passes that produce
/// the corresponding sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub connection_errors: usize,
    pub status_errors: usize,
    pub url_visit_differences_old: usize,
    pub url_visit_differences_new: usize,
    pub link_differences_not_in_old: usize,
    pub link_differences_not_in_new: usize,
}

/// Suppression rule for the status-error pass: a record is ignored when its
/// URL matches `pattern` and its status code is one of `codes`.
#[derive(Debug, Clone)]
pub struct StatusIgnoreRule {
    pub pattern: Regex,
    pub codes: Vec<i32>,
}

impl StatusIgnoreRule {
    /// Parse a rule of the form `url-regex=404,410`.
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((pattern, codes)) = spec.rsplit_once('=') else {
            bail!("invalid status ignore rule '{}': expected 'pattern=code[,code]...'", spec);
        };
        let pattern = Regex::new(pattern)
            .with_context(|| format!("invalid pattern in status ignore rule '{}'", spec))?;
        let codes = codes
            .split(',')
            .map(|code| {
                code.trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid status code '{}' in rule '{}'", code, spec))
            })
            .collect::<Result<Vec<_>>>()?;
        if codes.is_empty() {
            bail!("status ignore rule '{}' lists no status codes", spec);
        }
        Ok(Self { pattern, codes })
    }
}

/// Strip the literal `start_url` text out of `url` so two runs recorded
/// under different hosts or schemes become comparable. Textual removal, not
/// structural path extraction; `None` passes through unchanged.
pub fn normalize_url(start_url: &str, url: Option<&str>) -> Option<String> {
    url.map(|u| u.replace(start_url, ""))
}

/// Multiset difference: every element of `left` minus one occurrence per
/// matching element of `right`. Order of the survivors is preserved.
pub fn list_diff<T: PartialEq + Clone>(left: &[T], right: &[T]) -> Vec<T> {
    let mut remaining = left.to_vec();
    for item in right {
        if let Some(position) = remaining.iter().position(|x| x == item) {
            remaining.remove(position);
        }
    }
    remaining
}

/// `scheme://netloc` of a start URL, the prefix stripped during
/// normalization.
fn site_base(start_url: &str) -> String {
    Url::parse(start_url)
        .map(|u| format!("{}://{}", u.scheme(), u.authority()))
        .unwrap_or_else(|_| start_url.to_string())
}

fn first_referrer(record: &HistoryRecord) -> &str {
    record
        .visited_from
        .first()
        .and_then(|referrer| referrer.as_deref())
        .unwrap_or("None")
}

fn display_link(link: &Option<String>) -> &str {
    link.as_deref().unwrap_or("None")
}

/// Comparison of a new crawl against a golden baseline.
///
/// The four report passes are independent: each appends its own section to
/// the shared text, resets and rebuilds its own counts, and flips the
/// sticky error flag when it finds anything. CI consumers gate on
/// [`DiffReport::has_errors`] alone.
pub struct DiffReport {
    golden_start_url: String,
    golden: BTreeMap<String, HistoryRecord>,
    new_start_url: String,
    new: BTreeMap<String, HistoryRecord>,
    error_flag: bool,
    report: String,
    counts: DiffCounts,
}

impl DiffReport {
    pub fn new(golden: CrawlReport, new: CrawlReport) -> Self {
        Self {
            golden_start_url: golden.start_url,
            golden: golden.history,
            new_start_url: new.start_url,
            new: new.history,
            error_flag: false,
            report: String::new(),
            counts: DiffCounts::default(),
        }
    }

    pub fn from_files(golden: &Path, new: &Path) -> Result<Self> {
        let golden = load_report(golden)?;
        let new = load_report(new)?;
        Ok(Self::new(golden, new))
    }

    pub fn has_errors(&self) -> bool {
        self.error_flag
    }

    pub fn report(&self) -> &str {
        &self.report
    }

    pub fn counts(&self) -> &DiffCounts {
        &self.counts
    }

    /// URLs in the new run that could not be connected to at all
    /// (`response_code == 0`). Often TLS certificate problems and the like,
    /// which is what the ignore patterns exist for: the first pattern
    /// matching a record's error text suppresses it.
    pub fn report_connection_errors(&mut self, ignore_patterns: &[Regex]) -> &mut Self {
        self.report.push_str("CONNECTION ERRORS:\n\n");
        self.counts.connection_errors = 0;

        for (url, record) in &self.new {
            if record.response_code != Some(0) {
                continue;
            }
            debug!("processing connection error for: {}", url);

            // a record with no error text never matches an ignore pattern
            let error_text = record.error_text.as_deref().unwrap_or("");
            if let Some(pattern) = record
                .error_text
                .as_deref()
                .and_then(|text| ignore_patterns.iter().find(|p| p.is_match(text)))
            {
                debug!(
                    "ignoring connection error matching '{}': {} -> '{}'",
                    pattern.as_str(),
                    url,
                    error_text
                );
                continue;
            }

            self.error_flag = true;
            self.report.push_str(&format!("\turl: {}\n", url));
            self.report.push_str(&format!("\terror: {}\n", error_text));
            self.report
                .push_str(&format!("\tlinked to from: {}\n", first_referrer(record)));
            self.report.push('\n');

            self.counts.connection_errors += 1;
        }

        self.report.push_str("\n\n");
        self
    }

    /// URLs in the new run that answered with a status of 400 or higher. A
    /// record is suppressed when an ignore rule matches both its URL and
    /// its status code.
    pub fn report_status_errors(&mut self, ignore_rules: &[StatusIgnoreRule]) -> &mut Self {
        self.report.push_str("STATUS ERRORS:\n\n");
        self.counts.status_errors = 0;

        for (url, record) in &self.new {
            let Some(code) = record.response_code else {
                continue;
            };
            if code < 400 {
                continue;
            }
            if ignore_rules
                .iter()
                .any(|rule| rule.pattern.is_match(url) && rule.codes.contains(&code))
            {
                debug!("ignoring status error: '{}', {}", url, code);
                continue;
            }

            debug!("processing status error for: {} status code: {}", url, code);
            self.error_flag = true;
            self.report.push_str(&format!("\turl: {}\n", url));
            self.report.push_str(&format!("\tstatus_code: {}\n", code));
            self.report
                .push_str(&format!("\tlinked to from: {}\n", first_referrer(record)));
            self.report.push('\n');

            self.counts.status_errors += 1;
        }

        self.report.push_str("\n\n");
        self
    }

    /// Symmetric difference of the two URL sets, after normalizing each
    /// run's keys against its own start URL so staging and production runs
    /// compare by path.
    pub fn report_url_visit_differences(&mut self) -> &mut Self {
        debug!("processing report_url_visit_differences");

        let golden_base = site_base(&self.golden_start_url);
        let golden_keys: BTreeSet<String> = self
            .golden
            .keys()
            .filter_map(|key| normalize_url(&golden_base, Some(key)))
            .collect();

        let new_base = site_base(&self.new_start_url);
        let new_keys: BTreeSet<String> = self
            .new
            .keys()
            .filter_map(|key| normalize_url(&new_base, Some(key)))
            .collect();

        let new_urls_visited: Vec<&String> = new_keys.difference(&golden_keys).collect();
        let urls_not_visited: Vec<&String> = golden_keys.difference(&new_keys).collect();

        self.report.push_str("URL VISIT DIFFERENCES:\n\n");
        self.counts.url_visit_differences_old = urls_not_visited.len();
        self.counts.url_visit_differences_new = new_urls_visited.len();

        if new_urls_visited.is_empty() && urls_not_visited.is_empty() {
            self.report.push_str("\n\n");
            return self;
        }

        self.error_flag = true;

        self.report
            .push_str("These are url's in the golden file that were not visited:\n");
        for (index, url) in urls_not_visited.iter().enumerate() {
            self.report.push_str(&format!("{}: {}\n", index, url));
        }
        self.report.push('\n');

        self.report
            .push_str("These are new url's that were visited:\n");
        for (index, url) in new_urls_visited.iter().enumerate() {
            self.report.push_str(&format!("{}: {}\n", index, url));
        }
        self.report.push_str("\n\n");

        self
    }

    /// Per-page inbound-link comparison for every URL present in both
    /// histories. `visited_from` lists are normalized then diffed as
    /// multisets in both directions; pages that only reordered their
    /// referrers are not reported. URLs absent from the golden file are
    /// skipped here, the set-difference pass already covers them.
    pub fn report_link_differences(&mut self) -> &mut Self {
        debug!("processing report_link_differences");

        self.report.push_str("LINK DIFFERENCES:\n\n");
        self.counts.link_differences_not_in_old = 0;
        self.counts.link_differences_not_in_new = 0;

        let golden_base = site_base(&self.golden_start_url);
        let new_base = site_base(&self.new_start_url);

        for (key, v_new) in &self.new {
            // re-base new-run keys onto the golden start URL when
            // normalization changed them
            let norm_key = normalize_url(&new_base, Some(key)).unwrap_or_default();
            let golden_key = if norm_key != *key {
                Url::parse(&self.golden_start_url)
                    .and_then(|base| base.join(&norm_key))
                    .map(|joined| joined.to_string())
                    .unwrap_or_else(|_| key.clone())
            } else {
                key.clone()
            };

            let Some(v_golden) = self.golden.get(&golden_key) else {
                debug!("skipping url not found in golden history: {}", golden_key);
                continue;
            };

            let golden_visited_from: Vec<Option<String>> = v_golden
                .visited_from
                .iter()
                .map(|referrer| normalize_url(&golden_base, referrer.as_deref()))
                .collect();
            let new_visited_from: Vec<Option<String>> = v_new
                .visited_from
                .iter()
                .map(|referrer| normalize_url(&new_base, referrer.as_deref()))
                .collect();

            let links_not_in_new = list_diff(&golden_visited_from, &new_visited_from);
            let links_not_in_golden = list_diff(&new_visited_from, &golden_visited_from);

            if links_not_in_new.is_empty() && links_not_in_golden.is_empty() {
                continue;
            }

            self.error_flag = true;
            self.report.push_str(&format!("page: {}\n", golden_key));

            self.report.push_str("\n\tlinks that are not in new:\n\t");
            for (index, link) in links_not_in_new.iter().enumerate() {
                self.report
                    .push_str(&format!("{}: {}\n\t", index, display_link(link)));
            }
            self.report.push('\n');

            self.report.push_str("\n\tlinks that are not in golden:\n\t");
            for (index, link) in links_not_in_golden.iter().enumerate() {
                self.report
                    .push_str(&format!("{}: {}\n\t", index, display_link(link)));
            }
            self.report.push('\n');

            self.counts.link_differences_not_in_old += links_not_in_golden.len();
            self.counts.link_differences_not_in_new += links_not_in_new.len();
        }

        self.report.push_str("\n\n");
        self
    }

    /// `key: value` lines for every count, in a fixed order.
    pub fn summary(&self) -> String {
        let c = &self.counts;
        format!(
            "connection_errors: {}\n\
             status_errors: {}\n\
             url_visit_differences_old: {}\n\
             url_visit_differences_new: {}\n\
             link_differences_not_in_old: {}\n\
             link_differences_not_in_new: {}\n",
            c.connection_errors,
            c.status_errors,
            c.url_visit_differences_old,
            c.url_visit_differences_new,
            c.link_differences_not_in_old,
            c.link_differences_not_in_new,
        )
    }
}
