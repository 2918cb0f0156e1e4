use colored::Colorize;
use commands::command_argument_builder;
use tracing_subscriber::EnvFilter;
use wikigap::handlers::{
    expand_config_path, handle_analyze, handle_crawl, handle_info, handle_init, load_settings,
};
use wikigap_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "error" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = expand_config_path(
        chosen_command
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or("~/.config/wikigap/config.json"),
    );

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command, &config_path),
        Some((name, primary_command)) => match load_settings(&config_path) {
            Ok(settings) => match name {
                "crawl" => handle_crawl(primary_command, &settings, quiet).await,
                "analyze" => handle_analyze(primary_command, &settings, quiet).await,
                "info" => handle_info(primary_command, &settings).await,
                _ => unreachable!("clap should ensure we don't get here"),
            },
            Err(e) => Err(e),
        },
        None => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
