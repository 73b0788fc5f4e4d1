pub mod crawl;
pub mod report;

pub use crawl::{CrawlOptions, execute_crawl, load_report, save_report};
pub use report::{DiffCounts, DiffReport, StatusIgnoreRule, list_diff, normalize_url};
