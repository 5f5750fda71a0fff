//! Output formatting for text and JSON modes.

use serde_json::{json, Value};
use stratatier::{Error, PassReport, QuarantineEntry, Record, Retrieval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn format_retrieval(retrieval: &Retrieval, mode: OutputMode) -> String {
    let doc = retrieval
        .to_json()
        .unwrap_or_else(|e| json!({ "error": e.code(), "message": e.to_string() }));
    match mode {
        OutputMode::Json => doc.to_string(),
        OutputMode::Human => format!(
            "{} (from {})\n{}",
            retrieval.record.id,
            retrieval.source,
            pretty(&doc)
        ),
    }
}

pub fn format_record(record: &Record, mode: OutputMode) -> String {
    let doc = serde_json::to_value(record).unwrap_or(Value::Null);
    match mode {
        OutputMode::Json => doc.to_string(),
        OutputMode::Human => pretty(&doc),
    }
}

pub fn format_records(records: &[Record], total: usize, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "total": total, "records": records }).to_string(),
        OutputMode::Human => {
            if records.is_empty() {
                return format!("(empty list, {} hot records)", total);
            }
            let mut out = String::new();
            for (i, record) in records.iter().enumerate() {
                out.push_str(&format!(
                    "{}) {}  {}  created {}\n",
                    i + 1,
                    record.id,
                    record.status,
                    record.created_at.to_rfc3339()
                ));
            }
            out.push_str(&format!("({} of {} hot records)", records.len(), total));
            out
        }
    }
}

pub fn format_report(report: &PassReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "scanned": report.scanned,
            "archived": report.archived,
            "skipped": report.skipped,
            "deferred": report.deferred,
            "quarantined": report.quarantined,
            "cleanup_pending": report.cleanup_pending,
            "cleanup_completed": report.cleanup_completed,
            "cancelled": report.cancelled,
            "elapsed_ms": report.elapsed.as_millis() as u64,
            "quarantine": report.quarantine,
        })
        .to_string(),
        OutputMode::Human => {
            let mut out = report.summary();
            for entry in &report.quarantine {
                out.push('\n');
                out.push_str(&quarantine_line(entry));
            }
            out
        }
    }
}

pub fn format_quarantine(entries: &[QuarantineEntry], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!(entries).to_string(),
        OutputMode::Human if entries.is_empty() => "(no quarantined records)".to_string(),
        OutputMode::Human => entries
            .iter()
            .map(quarantine_line)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn format_ok(message: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "ok": message }).to_string(),
        OutputMode::Human => "OK".to_string(),
    }
}

pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "error": err.code(), "message": err.to_string() }).to_string(),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn quarantine_line(entry: &QuarantineEntry) -> String {
    format!(
        "{}  attempts={}  at {}  {}",
        entry.record_id,
        entry.attempts,
        entry.quarantined_at.to_rfc3339(),
        entry.last_error
    )
}

fn pretty(doc: &Value) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string())
}
