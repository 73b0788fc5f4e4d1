use clap::{arg, command};
use linkdiff::CLAP_STYLING;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkdiff")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkdiff")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress and non-essential output").required(false))
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site breadth-first and record every URL visited, its status and \
                its referrers in a history file.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to start crawling from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth to follow (default: unlimited)")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"delay" <SECONDS>)
                        .required(false)
                        .help("Seconds to wait between requests to the same site")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"include-external")
                        .required(false)
                        .help("Visit links pointing at other hosts instead of recording them as excluded")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-x --"exclude" <REGEX>)
                        .required(false)
                        .help("Skip URLs matching this pattern (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the history file")
                        .default_value("history.json"),
                ),
        )
        .subcommand(
            command!("compare")
                .about(
                    "Compare a new crawl history against a golden one and report connection \
                errors, status errors, visit differences and link differences. Exits 1 when \
                anything is found.",
                )
                .arg(
                    arg!(<GOLDEN>)
                        .required(true)
                        .help("The known-good history file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(<NEW>)
                        .required(true)
                        .help("The freshly crawled history file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"ignore-connection-error" <REGEX>)
                        .required(false)
                        .help("Suppress connection errors whose error text matches this pattern (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"ignore-status" <RULE>)
                        .required(false)
                        .help("Suppress status errors matching 'url-regex=CODE[,CODE...]' (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the report to a file instead of stdout")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"counts")
                        .required(false)
                        .help("Print a per-category tally after the report")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
