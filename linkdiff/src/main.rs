use colored::Colorize;
use commands::command_argument_builder;
use linkdiff::handlers;

mod commands;

#[tokio::main]
async fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    let outcome = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handlers::handle_crawl(primary_command, quiet)
            .await
            .map(|_| false),
        Some(("compare", primary_command)) => handlers::handle_compare(primary_command, quiet),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        // differences found: nonzero exit so CI pipelines fail the build
        Ok(true) => std::process::exit(1),
        Ok(false) => {}
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(2);
        }
    }
}
