//! Command tree.

use clap::{value_parser, Arg, ArgAction, Command};

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = ".strata-tier";

pub fn build_cli() -> Command {
    Command::new("strata-tier")
        .about("Tiered record storage: hot records, verified cold archives")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .global(true)
                .default_value(DEFAULT_DATA_DIR)
                .help("Data directory (hot.jsonl, cold/, quarantine.json)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration file; STRATA_TIER_* variables override it"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of text"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More logging (-v info, -vv debug, -vvv trace)"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Log errors only"),
        )
        .subcommand(
            Command::new("archive")
                .about("Run one archival pass")
                .arg(
                    Arg::new("older-than")
                        .long("older-than")
                        .value_parser(value_parser!(u64))
                        .help("Eligibility threshold in seconds"),
                )
                .arg(
                    Arg::new("batch-size")
                        .long("batch-size")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Resolve records from cache, hot or cold tier")
                .arg(Arg::new("ids").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("put")
                .about("Create a record")
                .arg(Arg::new("payload").required(true).help("JSON payload"))
                .arg(Arg::new("id").long("id").help("Record id (default: new UUID)")),
        )
        .subcommand(
            Command::new("update")
                .about("Replace the payload of a hot record")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("payload").required(true))
                .arg(Arg::new("status").long("status")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a hot record")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("list")
                .about("List hot records, newest first")
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("20"),
                ),
        )
        .subcommand(
            Command::new("quarantine")
                .about("Inspect or release quarantined records")
                .subcommand_required(true)
                .subcommand(Command::new("list"))
                .subcommand(Command::new("clear").arg(Arg::new("id").required(true))),
        )
        .subcommand(
            Command::new("config")
                .about("Configuration")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the effective configuration")),
        )
}
