// Tests for the golden-vs-new diff reporting engine

use linkdiff_core::report::{DiffReport, StatusIgnoreRule, list_diff, normalize_url};
use linkdiff_crawler::history::{CrawlReport, HistoryRecord};
use regex::Regex;
use std::collections::BTreeMap;

fn record(
    response_code: Option<i32>,
    visited_from: Vec<Option<&str>>,
    error_text: Option<&str>,
    depth: u32,
) -> HistoryRecord {
    HistoryRecord {
        response_code,
        visited_from: visited_from
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        error_text: error_text.map(str::to_string),
        depth,
    }
}

fn report_with(start_url: &str, entries: Vec<(&str, HistoryRecord)>) -> CrawlReport {
    let mut history = BTreeMap::new();
    for (url, rec) in entries {
        history.insert(url.to_string(), rec);
    }
    CrawlReport {
        start_url: start_url.to_string(),
        history,
    }
}

fn simple_site(start: &str) -> CrawlReport {
    report_with(
        start,
        vec![
            (start, record(Some(200), vec![None], None, 0)),
            (
                &format!("{start}a"),
                record(Some(200), vec![Some(start)], None, 1),
            ),
            (
                &format!("{start}b"),
                record(Some(200), vec![Some(start), Some(&format!("{start}a"))], None, 1),
            ),
        ],
    )
}

// ============================================================================
// Self-comparison
// ============================================================================

#[test]
fn test_comparing_a_report_against_itself_finds_nothing() {
    let golden = simple_site("https://example.com/");
    let new = golden.clone();

    let mut diff = DiffReport::new(golden, new);
    diff.report_connection_errors(&[])
        .report_status_errors(&[])
        .report_url_visit_differences()
        .report_link_differences();

    assert!(!diff.has_errors());
    let counts = diff.counts();
    assert_eq!(counts.connection_errors, 0);
    assert_eq!(counts.status_errors, 0);
    assert_eq!(counts.url_visit_differences_old, 0);
    assert_eq!(counts.url_visit_differences_new, 0);
    assert_eq!(counts.link_differences_not_in_old, 0);
    assert_eq!(counts.link_differences_not_in_new, 0);

    // all four sections are present even when empty
    assert!(diff.report().contains("CONNECTION ERRORS:"));
    assert!(diff.report().contains("STATUS ERRORS:"));
    assert!(diff.report().contains("URL VISIT DIFFERENCES:"));
    assert!(diff.report().contains("LINK DIFFERENCES:"));
}

#[test]
fn test_self_comparison_across_different_hosts_finds_nothing() {
    // same site crawled as production and as staging
    let golden = simple_site("https://example.com/");
    let new = simple_site("http://staging.example.net/");

    let mut diff = DiffReport::new(golden, new);
    diff.report_url_visit_differences().report_link_differences();

    assert!(!diff.has_errors(), "report: {}", diff.report());
}

// ============================================================================
// Connection errors
// ============================================================================

#[test]
fn test_connection_errors_are_reported_with_referrer() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/down".to_string(),
        record(
            Some(0),
            vec![Some("https://example.com/")],
            Some("connection refused"),
            1,
        ),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_connection_errors(&[]);

    assert!(diff.has_errors());
    assert_eq!(diff.counts().connection_errors, 1);
    assert!(diff.report().contains("url: https://example.com/down"));
    assert!(diff.report().contains("error: connection refused"));
    assert!(diff.report().contains("linked to from: https://example.com/"));
}

#[test]
fn test_connection_error_ignore_pattern_suppresses_record() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/flaky".to_string(),
        record(
            Some(0),
            vec![Some("https://example.com/")],
            Some("certificate verify failed"),
            1,
        ),
    );

    let ignores = vec![Regex::new("certificate").unwrap()];
    let mut diff = DiffReport::new(golden, new);
    diff.report_connection_errors(&ignores);

    assert!(!diff.has_errors());
    assert_eq!(diff.counts().connection_errors, 0);
}

#[test]
fn test_excluded_records_are_not_connection_errors() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://other.com/".to_string(),
        record(
            Some(-1),
            vec![Some("https://example.com/")],
            Some("Matched URL exclude external host"),
            1,
        ),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_connection_errors(&[]);

    assert!(!diff.has_errors());
    assert_eq!(diff.counts().connection_errors, 0);
}

// ============================================================================
// Status errors
// ============================================================================

#[test]
fn test_status_errors_report_codes_at_or_above_400() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/gone".to_string(),
        record(Some(404), vec![Some("https://example.com/")], None, 1),
    );
    new.history.insert(
        "https://example.com/moved".to_string(),
        record(Some(301), vec![Some("https://example.com/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_status_errors(&[]);

    assert!(diff.has_errors());
    assert_eq!(diff.counts().status_errors, 1);
    assert!(diff.report().contains("url: https://example.com/gone"));
    assert!(diff.report().contains("status_code: 404"));
    assert!(!diff.report().contains("https://example.com/moved"));
}

#[test]
fn test_status_ignore_rule_needs_matching_url_and_code() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/gone".to_string(),
        record(Some(404), vec![Some("https://example.com/")], None, 1),
    );
    new.history.insert(
        "https://example.com/broken".to_string(),
        record(Some(500), vec![Some("https://example.com/")], None, 1),
    );

    // matches /gone with 404 but not /broken with 500
    let rules = vec![StatusIgnoreRule::parse("example.com=404,410").unwrap()];
    let mut diff = DiffReport::new(golden, new);
    diff.report_status_errors(&rules);

    assert!(diff.has_errors());
    assert_eq!(diff.counts().status_errors, 1);
    assert!(!diff.report().contains("https://example.com/gone"));
    assert!(diff.report().contains("https://example.com/broken"));
}

#[test]
fn test_status_ignore_rule_parsing() {
    let rule = StatusIgnoreRule::parse("docs/.*=404, 410").unwrap();
    assert_eq!(rule.codes, vec![404, 410]);
    assert!(rule.pattern.is_match("https://example.com/docs/old"));

    assert!(StatusIgnoreRule::parse("no-codes-here").is_err());
    assert!(StatusIgnoreRule::parse("pattern=abc").is_err());
    assert!(StatusIgnoreRule::parse("[bad=404").is_err());
}

// ============================================================================
// URL visit differences
// ============================================================================

#[test]
fn test_url_missing_from_new_run_is_reported_as_not_visited() {
    let mut golden = simple_site("https://example.com/");
    golden.history.insert(
        "https://example.com/old-page".to_string(),
        record(Some(200), vec![Some("https://example.com/")], None, 1),
    );
    let new = simple_site("https://example.com/");

    let mut diff = DiffReport::new(golden, new);
    diff.report_url_visit_differences();

    assert!(diff.has_errors());
    assert_eq!(diff.counts().url_visit_differences_old, 1);
    assert_eq!(diff.counts().url_visit_differences_new, 0);
    assert!(
        diff.report()
            .contains("These are url's in the golden file that were not visited:")
    );
    assert!(diff.report().contains("/old-page"));
}

#[test]
fn test_new_urls_are_reported_separately() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/fresh".to_string(),
        record(Some(200), vec![Some("https://example.com/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_url_visit_differences();

    assert!(diff.has_errors());
    assert_eq!(diff.counts().url_visit_differences_old, 0);
    assert_eq!(diff.counts().url_visit_differences_new, 1);
    assert!(diff.report().contains("These are new url's that were visited:"));
    assert!(diff.report().contains("/fresh"));
}

#[test]
fn test_url_sets_compare_by_path_across_hosts() {
    let golden = simple_site("https://example.com/");
    // staging run visited the same paths plus one extra
    let mut new = simple_site("http://staging.example.net/");
    new.history.insert(
        "http://staging.example.net/staging-only".to_string(),
        record(Some(200), vec![Some("http://staging.example.net/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_url_visit_differences();

    assert_eq!(diff.counts().url_visit_differences_old, 0);
    assert_eq!(diff.counts().url_visit_differences_new, 1);
    assert!(diff.report().contains("/staging-only"));
}

// ============================================================================
// Link differences
// ============================================================================

#[test]
fn test_removed_inbound_link_is_reported() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    // /b lost its inbound link from /a
    new.history.insert(
        "https://example.com/b".to_string(),
        record(Some(200), vec![Some("https://example.com/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_link_differences();

    assert!(diff.has_errors());
    assert_eq!(diff.counts().link_differences_not_in_new, 1);
    assert_eq!(diff.counts().link_differences_not_in_old, 0);
    assert!(diff.report().contains("page: https://example.com/b"));
    assert!(diff.report().contains("links that are not in new:"));
    assert!(diff.report().contains("/a"));
}

#[test]
fn test_link_diff_is_multiset_aware() {
    // golden has two links from the same page, new has one: exactly one
    // occurrence must survive the diff
    let golden = report_with(
        "https://example.com/",
        vec![(
            "https://example.com/t",
            record(
                Some(200),
                vec![Some("https://example.com/"), Some("https://example.com/")],
                None,
                1,
            ),
        )],
    );
    let new = report_with(
        "https://example.com/",
        vec![(
            "https://example.com/t",
            record(Some(200), vec![Some("https://example.com/")], None, 1),
        )],
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_link_differences();

    assert_eq!(diff.counts().link_differences_not_in_new, 1);
    assert_eq!(diff.counts().link_differences_not_in_old, 0);
}

#[test]
fn test_reordered_links_are_not_reported() {
    let golden = report_with(
        "https://example.com/",
        vec![(
            "https://example.com/t",
            record(
                Some(200),
                vec![Some("https://example.com/a"), Some("https://example.com/b")],
                None,
                1,
            ),
        )],
    );
    let new = report_with(
        "https://example.com/",
        vec![(
            "https://example.com/t",
            record(
                Some(200),
                vec![Some("https://example.com/b"), Some("https://example.com/a")],
                None,
                1,
            ),
        )],
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_link_differences();

    assert!(!diff.has_errors());
    assert_eq!(diff.counts().link_differences_not_in_old, 0);
    assert_eq!(diff.counts().link_differences_not_in_new, 0);
}

#[test]
fn test_urls_absent_from_golden_are_skipped_in_link_diff() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/fresh".to_string(),
        record(Some(200), vec![Some("https://example.com/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_link_differences();

    // the set-difference pass owns this case
    assert!(!diff.has_errors());
}

// ============================================================================
// Summary and counts
// ============================================================================

#[test]
fn test_summary_lists_every_count_key() {
    let golden = simple_site("https://example.com/");
    let new = golden.clone();

    let mut diff = DiffReport::new(golden, new);
    diff.report_connection_errors(&[])
        .report_status_errors(&[])
        .report_url_visit_differences()
        .report_link_differences();

    let summary = diff.summary();
    assert!(summary.contains("connection_errors: 0"));
    assert!(summary.contains("status_errors: 0"));
    assert!(summary.contains("url_visit_differences_old: 0"));
    assert!(summary.contains("url_visit_differences_new: 0"));
    assert!(summary.contains("link_differences_not_in_old: 0"));
    assert!(summary.contains("link_differences_not_in_new: 0"));
}

#[test]
fn test_rerunning_a_pass_resets_its_counts() {
    let golden = simple_site("https://example.com/");
    let mut new = simple_site("https://example.com/");
    new.history.insert(
        "https://example.com/gone".to_string(),
        record(Some(404), vec![Some("https://example.com/")], None, 1),
    );

    let mut diff = DiffReport::new(golden, new);
    diff.report_status_errors(&[]);
    diff.report_status_errors(&[]);

    assert_eq!(diff.counts().status_errors, 1);
}

// ============================================================================
// Normalization helpers
// ============================================================================

#[test]
fn test_normalize_url_strips_the_start_url_text() {
    assert_eq!(
        normalize_url("https://example.com", Some("https://example.com/docs/page")),
        Some("/docs/page".to_string())
    );
    assert_eq!(
        normalize_url("https://example.com", Some("https://other.com/docs")),
        Some("https://other.com/docs".to_string())
    );
}

#[test]
fn test_normalize_url_passes_none_through() {
    assert_eq!(normalize_url("https://example.com", None), None);
}

#[test]
fn test_list_diff_removes_one_occurrence_per_match() {
    let left = vec!["a", "a", "b", "c"];
    let right = vec!["a", "c", "d"];
    assert_eq!(list_diff(&left, &right), vec!["a", "b"]);
}

#[test]
fn test_list_diff_of_equal_lists_is_empty() {
    let left = vec![Some("a".to_string()), None];
    let right = vec![Some("a".to_string()), None];
    assert!(list_diff(&left, &right).is_empty());
}
