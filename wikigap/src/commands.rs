use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikigap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikigap")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .global(true)
                .help("Settings file")
                .default_value("~/.config/wikigap/config.json"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a settings file holding the defaults to the --config path")
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing settings file")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about("Build the link graph around a seed article and summarise it")
                .arg(seed_arg())
                .arg(depth_arg())
                .arg(workers_arg())
                .arg(legacy_visit_arg())
                .arg(snapshot_arg())
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the graph as JSON to this file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Rank the articles around a seed by in-degree and flag language editions \
                that are missing or short",
                )
                .arg(seed_arg())
                .arg(
                    arg!(-r --"reference" <LANG>)
                        .required(false)
                        .help("Language code the other editions are compared to (default: from settings)"),
                )
                .arg(depth_arg())
                .arg(
                    arg!(-n --"top" <TOP_N>)
                        .required(false)
                        .help("Only analyse the N most linked articles")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-l --"languages" <LANGS>)
                        .required(false)
                        .help("Comma separated language codes to compare (default: all)"),
                )
                .arg(
                    arg!(--"raw")
                        .required(false)
                        .help("Compare character counts instead of compressed sizes")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(workers_arg())
                .arg(legacy_visit_arg())
                .arg(snapshot_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("info")
                .about("Print lengths, link and language counts of a single article")
                .arg(seed_arg())
                .arg(snapshot_arg()),
        )
}

fn seed_arg() -> clap::Arg {
    arg!(-u --"url" <URL>)
        .required(true)
        .help("Article URL, e.g. https://en.wikipedia.org/wiki/Rust")
        .value_parser(clap::value_parser!(Url))
}

fn depth_arg() -> clap::Arg {
    arg!(-d --"depth" <DEPTH>)
        .required(false)
        .help("How many links away from the seed to follow")
        .value_parser(clap::value_parser!(usize))
        .default_value("1")
}

fn workers_arg() -> clap::Arg {
    arg!(-t --"threads" <NUM_WORKERS>)
        .required(false)
        .help("Concurrent fetches (default: from settings)")
        .value_parser(clap::value_parser!(usize))
}

fn legacy_visit_arg() -> clap::Arg {
    arg!(--"legacy-visit")
        .required(false)
        .help(
            "Mark articles visited only after their expansion finished \
            (sequential, may fetch an article more than once)",
        )
        .action(clap::ArgAction::SetTrue)
}

fn snapshot_arg() -> clap::Arg {
    arg!(--"snapshot" <FILE>)
        .required(false)
        .help("Read pages from a JSON {url: html} snapshot instead of the network")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}
