use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use linkdiff_crawler::Crawler;
use linkdiff_crawler::client::DEFAULT_TIMEOUT_SECS;
use linkdiff_crawler::history::CrawlReport;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub start_url: String,
    /// `None` = unlimited depth.
    pub depth_limit: Option<u32>,
    pub crawl_delay_secs: u64,
    pub exclude_external: bool,
    pub exclude_patterns: Vec<String>,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            depth_limit: None,
            crawl_delay_secs: 1,
            exclude_external: true,
            exclude_patterns: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_progress: false,
        }
    }
}

/// Execute a crawl with the given options.
/// Returns the accumulated crawl report.
pub async fn execute_crawl(options: CrawlOptions) -> Result<CrawlReport> {
    let CrawlOptions {
        start_url,
        depth_limit,
        crawl_delay_secs,
        exclude_external,
        exclude_patterns,
        timeout_secs,
        show_progress,
    } = options;

    // Set up a single spinner for overall crawl progress (only if enabled)
    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let mut crawler = Crawler::with_timeout(timeout_secs)?
        .with_crawl_delay(Duration::from_secs(crawl_delay_secs))
        .with_exclude_external(exclude_external)
        .with_exclude_patterns(exclude_patterns);
    if let Some(limit) = depth_limit {
        crawler = crawler.with_depth_limit(limit);
    }
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        let count_clone = processed_count.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!("Crawling... {} URLs processed ({})", count, url));
            pb_clone.tick();
        }));
    }

    let report = crawler
        .crawl(&start_url)
        .await
        .with_context(|| format!("failed to crawl {}", start_url))?;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    Ok(report)
}

pub fn save_report(report: &CrawlReport, path: &Path) -> Result<()> {
    report
        .save(path)
        .with_context(|| format!("failed to write history file {}", path.display()))
}

/// Load a persisted crawl report. A malformed history file fails loudly
/// here rather than producing a partial comparison.
pub fn load_report(path: &Path) -> Result<CrawlReport> {
    CrawlReport::load(path)
        .with_context(|| format!("failed to load history file {}", path.display()))
}
