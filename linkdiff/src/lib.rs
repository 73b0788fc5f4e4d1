pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{compile_ignore_patterns, parse_status_rules};

// Re-export crawl and comparison functionality from linkdiff-core
pub use linkdiff_core::crawl::{CrawlOptions, execute_crawl, load_report, save_report};
pub use linkdiff_core::report::{DiffReport, StatusIgnoreRule};
