//! strata-tier: command-line front end for tiered record storage.
//!
//! State lives in a data directory: the hot tier as a JSON-lines
//! snapshot, the cold tier as compressed artifacts, and the quarantine
//! registry as JSON. Every mutating command saves the snapshot back.

mod commands;
mod format;
mod parse;
mod session;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::ArgMatches;
use stratatier::{PassOptions, TieringConfig};
use tracing::{info, warn, Level};

use commands::build_cli;
use format::{
    format_error, format_ok, format_quarantine, format_record, format_records, format_report,
    format_retrieval, OutputMode,
};
use parse::{matches_to_action, CliAction};
use session::Session;

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_flag("quiet"), matches.get_count("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("(error) failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    match runtime.block_on(run(&matches, action, mode)) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("(error) {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(quiet: bool, verbosity: u8) {
    let level = match verbosity {
        _ if quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<TieringConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => TieringConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => TieringConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// Execute one action; returns the process exit code.
async fn run(matches: &ArgMatches, action: CliAction, mode: OutputMode) -> Result<i32> {
    let config = load_config(matches)?;

    if action == CliAction::ConfigShow {
        print!("{}", config.to_toml_string()?);
        return Ok(0);
    }

    let data_dir = matches
        .get_one::<String>("data")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(commands::DEFAULT_DATA_DIR));
    let session = Session::open(&data_dir, config)?;
    let tiering = &session.tiering;

    let code = match action {
        CliAction::Archive {
            threshold,
            batch_size,
            max_concurrency,
        } => {
            let mut options = PassOptions::from_config(tiering.config());
            if let Some(threshold) = threshold {
                options = options.with_threshold(threshold);
            }
            if let Some(batch_size) = batch_size {
                options = options.with_batch_size(batch_size);
            }
            if let Some(max_concurrency) = max_concurrency {
                options = options.with_max_concurrency(max_concurrency);
            }

            let handle = tiering.spawn_archival_pass(options);
            let stopper = tokio::spawn({
                let stop = handle.stop_signal();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("interrupt received, finishing migrations in progress");
                        stop.request_stop();
                    }
                }
            });
            let result = handle.join().await;
            stopper.abort();

            // Whatever the pass completed must reach disk, even on error
            session.persist()?;
            match result {
                Ok(report) => {
                    info!("{}", report.summary());
                    println!("{}", format_report(&report, mode));
                    if report.has_issues() {
                        3
                    } else {
                        0
                    }
                }
                Err(e) => {
                    eprintln!("{}", format_error(&e, mode));
                    1
                }
            }
        }
        CliAction::Get { ids } => {
            let mut failed = false;
            for (id, result) in ids.iter().zip(tiering.get_many(&ids).await) {
                match result {
                    Ok(retrieval) => println!("{}", format_retrieval(&retrieval, mode)),
                    Err(e) => {
                        failed = true;
                        eprintln!("{}: {}", id, format_error(&e, mode));
                    }
                }
            }
            if failed {
                1
            } else {
                0
            }
        }
        CliAction::Put { id, payload } => match tiering.records.create(id, payload).await {
            Ok(record) => {
                session.persist()?;
                println!("{}", format_record(&record, mode));
                0
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                1
            }
        },
        CliAction::Update {
            id,
            payload,
            status,
        } => match tiering.records.update(&id, payload, status).await {
            Ok(record) => {
                session.persist()?;
                println!("{}", format_record(&record, mode));
                0
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                1
            }
        },
        CliAction::Delete { id } => match tiering.records.delete(&id).await {
            Ok(()) => {
                session.persist()?;
                println!("{}", format_ok("deleted", mode));
                0
            }
            Err(e) => {
                eprintln!("{}", format_error(&e, mode));
                1
            }
        },
        CliAction::List { offset, limit } => {
            let records = tiering.records.list(offset, limit).await?;
            let total = tiering.records.count().await?;
            println!("{}", format_records(&records, total, mode));
            0
        }
        CliAction::QuarantineList => {
            println!("{}", format_quarantine(&tiering.archival.quarantined(), mode));
            0
        }
        CliAction::QuarantineClear { id } => match tiering.archival.clear_quarantine(&id) {
            Some(_) => {
                session.persist()?;
                println!("{}", format_ok("cleared", mode));
                0
            }
            None => {
                let err = stratatier::Error::not_found(format!("quarantine entry {}", id));
                eprintln!("{}", format_error(&err, mode));
                1
            }
        },
        CliAction::ConfigShow => 0,
    };

    Ok(code)
}
