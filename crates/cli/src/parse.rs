//! ArgMatches → CliAction conversion.

use clap::ArgMatches;
use serde_json::Value;
use std::time::Duration;
use stratatier::RecordId;

/// What the user asked for.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    Archive {
        threshold: Option<Duration>,
        batch_size: Option<usize>,
        max_concurrency: Option<usize>,
    },
    Get {
        ids: Vec<RecordId>,
    },
    Put {
        id: Option<RecordId>,
        payload: Value,
    },
    Update {
        id: RecordId,
        payload: Value,
        status: Option<String>,
    },
    Delete {
        id: RecordId,
    },
    List {
        offset: usize,
        limit: usize,
    },
    QuarantineList,
    QuarantineClear {
        id: RecordId,
    },
    ConfigShow,
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "archive" => Ok(CliAction::Archive {
            threshold: m.get_one::<u64>("older-than").map(|s| Duration::from_secs(*s)),
            batch_size: m.get_one::<usize>("batch-size").copied(),
            max_concurrency: m.get_one::<usize>("concurrency").copied(),
        }),
        "get" => {
            let ids = m
                .get_many::<String>("ids")
                .ok_or("get needs at least one id")?
                .map(|s| record_id(s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CliAction::Get { ids })
        }
        "put" => Ok(CliAction::Put {
            id: m.get_one::<String>("id").map(|s| record_id(s)).transpose()?,
            payload: payload(required(m, "payload")?)?,
        }),
        "update" => Ok(CliAction::Update {
            id: record_id(required(m, "id")?)?,
            payload: payload(required(m, "payload")?)?,
            status: m.get_one::<String>("status").cloned(),
        }),
        "delete" => Ok(CliAction::Delete {
            id: record_id(required(m, "id")?)?,
        }),
        "list" => Ok(CliAction::List {
            offset: m.get_one::<usize>("offset").copied().unwrap_or(0),
            limit: m.get_one::<usize>("limit").copied().unwrap_or(20),
        }),
        "quarantine" => {
            let (sub, qm) = m.subcommand().ok_or("No quarantine subcommand")?;
            match sub {
                "list" => Ok(CliAction::QuarantineList),
                "clear" => Ok(CliAction::QuarantineClear {
                    id: record_id(required(qm, "id")?)?,
                }),
                other => Err(format!("Unknown quarantine command: {}", other)),
            }
        }
        "config" => match m.subcommand() {
            Some(("show", _)) => Ok(CliAction::ConfigShow),
            _ => Err("No config subcommand".to_string()),
        },
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    m.get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| format!("missing <{}>", name))
}

fn record_id(raw: &str) -> Result<RecordId, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("record id must not be empty".to_string());
    }
    Ok(RecordId::new(trimmed))
}

fn payload(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("payload is not valid JSON: {}", e))
}
