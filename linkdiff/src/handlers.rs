use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use linkdiff_core::crawl::{CrawlOptions, execute_crawl, save_report};
use linkdiff_core::report::{DiffReport, StatusIgnoreRule};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Compile `--ignore-connection-error` patterns, failing on the first bad
/// one rather than silently skipping it.
pub fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("invalid ignore pattern '{}'", pattern))
        })
        .collect()
}

/// Parse `--ignore-status` rules of the form `url-regex=CODE[,CODE...]`.
pub fn parse_status_rules(specs: &[String]) -> Result<Vec<StatusIgnoreRule>> {
    specs.iter().map(|spec| StatusIgnoreRule::parse(spec)).collect()
}

fn collect_values(sub_matches: &ArgMatches, id: &str) -> Vec<String> {
    sub_matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches.get_one::<Url>("url").unwrap();
    let depth_limit = sub_matches.get_one::<u32>("depth").copied();
    let crawl_delay_secs = *sub_matches.get_one::<u64>("delay").unwrap();
    let include_external = sub_matches.get_flag("include-external");
    let exclude_patterns = collect_values(sub_matches, "exclude");
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap();
    let output = sub_matches.get_one::<String>("output").unwrap();

    let expanded_output = shellexpand::tilde(output);
    let output_path = PathBuf::from(expanded_output.as_ref());

    let options = CrawlOptions {
        start_url: url.to_string(),
        depth_limit,
        crawl_delay_secs,
        exclude_external: !include_external,
        exclude_patterns,
        timeout_secs,
        show_progress: !quiet,
    };

    let report = execute_crawl(options).await?;

    let visited = report
        .history
        .values()
        .filter(|record| record.response_code.is_some_and(|code| code > 0))
        .count();
    let connection_errors = report
        .history
        .values()
        .filter(|record| record.response_code == Some(0))
        .count();
    let excluded = report
        .history
        .values()
        .filter(|record| record.response_code == Some(-1))
        .count();

    save_report(&report, &output_path)?;

    if !quiet {
        println!(
            "\n{} Crawl complete: {} visited, {} connection errors, {} excluded",
            "✓".green().bold(),
            visited,
            connection_errors,
            excluded
        );
        println!(
            "{} History written to {}",
            "✓".green().bold(),
            output_path.display().to_string().bright_white()
        );
    }

    Ok(())
}

/// Run all four comparison passes. Returns whether any discrepancy was
/// found so the caller can turn it into a nonzero exit code.
pub fn handle_compare(sub_matches: &ArgMatches, quiet: bool) -> Result<bool> {
    let golden_path = sub_matches.get_one::<PathBuf>("GOLDEN").unwrap();
    let new_path = sub_matches.get_one::<PathBuf>("NEW").unwrap();
    let ignore_patterns = compile_ignore_patterns(&collect_values(
        sub_matches,
        "ignore-connection-error",
    ))?;
    let status_rules = parse_status_rules(&collect_values(sub_matches, "ignore-status"))?;
    let output = sub_matches.get_one::<PathBuf>("output");
    let show_counts = sub_matches.get_flag("counts");

    debug!(
        "comparing '{}' against golden '{}'",
        new_path.display(),
        golden_path.display()
    );

    let mut diff = DiffReport::from_files(golden_path, new_path)?;
    diff.report_connection_errors(&ignore_patterns)
        .report_status_errors(&status_rules)
        .report_url_visit_differences()
        .report_link_differences();

    if let Some(output_path) = output {
        fs::write(output_path, diff.report())
            .with_context(|| format!("failed to write report to {}", output_path.display()))?;
        if !quiet {
            println!(
                "{} Report written to {}",
                "✓".green().bold(),
                output_path.display().to_string().bright_white()
            );
        }
    } else if !quiet {
        print!("{}", diff.report());
    }

    if show_counts {
        print!("{}", diff.summary());
    }

    Ok(diff.has_errors())
}
