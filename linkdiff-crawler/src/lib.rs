pub mod client;
pub mod crawler;
pub mod error;
pub mod history;
pub mod page;
pub mod robots;

pub use client::SiteClient;
pub use crawler::{Crawler, ProgressCallback};
pub use error::CrawlError;
pub use history::{CrawlReport, HistoryRecord};
