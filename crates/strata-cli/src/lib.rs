//! Strata CLI
//!
//! Argument parsing, logging setup and the command bodies behind the
//! `strata` binary. Commands write their report to any [`std::io::Write`]
//! so they can be driven from tests.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod commands;

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;
use strata_artifact::Attachment;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "strata=info";

fn config_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding one folder per target"),
        )
}

fn parse_attachment(value: &str) -> Result<Attachment, String> {
    Attachment::parse(value)
        .ok_or_else(|| format!("expected NAME=URL or a URL with a file name, got {value:?}"))
}

/// Command line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("strata")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-round generation and merge of self-contained HTML artifacts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(config_args(
            Command::new("round")
                .about("Run one generation round for a task")
                .arg(Arg::new("task").required(true).help("Task name"))
                .arg(Arg::new("brief").required(true).help("Requirements for this round"))
                .arg(
                    Arg::new("round")
                        .long("round")
                        .value_parser(value_parser!(u32))
                        .help("Round number (defaults to the next one in history)"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .help("Target folder name (defaults to a slug of the task)"),
                )
                .arg(Arg::new("model").long("model").help("Model name"))
                .arg(
                    Arg::new("fallback-image")
                        .long("fallback-image")
                        .help("Image shown by the fallback page"),
                )
                .arg(
                    Arg::new("attach")
                        .long("attach")
                        .value_name("NAME=URL")
                        .action(ArgAction::Append)
                        .value_parser(parse_attachment)
                        .help("File written next to the artifact (data: or remote URL)"),
                ),
        ))
        .subcommand(
            Command::new("merge")
                .about("Merge two HTML files without generating anything")
                .arg(
                    Arg::new("old")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Existing artifact"),
                )
                .arg(
                    Arg::new("new")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Newer document"),
                )
                .arg(
                    Arg::new("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write the merged artifact"),
                ),
        )
        .subcommand(config_args(
            Command::new("history")
                .about("Print the round history of a target")
                .arg(Arg::new("target").required(true).help("Target folder or task name"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        ))
}

/// Install the global tracing subscriber, logging to stderr
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A second install (tests) is not an error worth reporting.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_round_flags() {
        let matches = cli()
            .try_get_matches_from([
                "strata", "round", "Todo App", "Add filters", "--round", "3", "--log-json",
            ])
            .unwrap();
        assert!(matches.get_flag("log-json"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "round");
        assert_eq!(args.get_one::<String>("task").unwrap(), "Todo App");
        assert_eq!(*args.get_one::<u32>("round").unwrap(), 3);
    }

    #[test]
    fn attachments_are_repeatable() {
        let matches = cli()
            .try_get_matches_from([
                "strata",
                "round",
                "Gallery",
                "Show photos",
                "--attach",
                "a.txt=data:,hi",
                "--attach",
                "https://example.com/b.png",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let names: Vec<&str> = args
            .get_many::<Attachment>("attach")
            .unwrap()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.png"]);
    }

    #[test]
    fn unnamed_data_attachment_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["strata", "round", "T", "B", "--attach", "data:,hi"])
            .is_err());
    }

    #[test]
    fn merge_requires_three_paths() {
        assert!(cli()
            .try_get_matches_from(["strata", "merge", "a.html", "b.html"])
            .is_err());
    }
}
