//! Text rendering for CLI output.

use std::fmt::Write as _;

use crate::client::{Feedback, Severity};
use crate::error::Result;
use crate::record::Record;
use crate::storage::StorageStats;

use super::OutputFormat;

/// Render a record listing in `format`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn records(records: &[&Record], format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Plain => records
            .iter()
            .map(|r| format!("{}\t{}\n", r.plate, r.details))
            .collect(),
        OutputFormat::Table => table(records),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(records)?;
            json.push('\n');
            json
        }
    };
    Ok(out)
}

fn table(records: &[&Record]) -> String {
    const PLATE: &str = "PLATE";

    if records.is_empty() {
        return "No plates found.\n".to_string();
    }

    let width = records
        .iter()
        .map(|r| r.plate.chars().count())
        .max()
        .unwrap_or(0)
        .max(PLATE.len());

    let mut out = String::new();
    let _ = writeln!(out, "{PLATE:<width$}  DETAILS");
    let _ = writeln!(out, "{}  {}", "-".repeat(width), "-".repeat(7));
    for record in records {
        let _ = writeln!(out, "{:<width$}  {}", record.plate, record.details);
    }
    let _ = writeln!(out, "\n{} plate(s)", records.len());
    out
}

/// One-line banner for an action outcome.
#[must_use]
pub fn feedback(feedback: &Feedback) -> String {
    match feedback.severity {
        Severity::Success => feedback.message.clone(),
        Severity::Error => format!("error: {}", feedback.message),
    }
}

/// Human-readable storage statistics.
#[must_use]
pub fn stats(stats: &StorageStats, database: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "platebook status");
    let _ = writeln!(out, "----------------");
    let _ = writeln!(out, "Database:      {database}");
    let _ = writeln!(out, "Records:       {}", stats.total_records);
    let _ = writeln!(out, "Size:          {} bytes", stats.db_size_bytes);
    if let Some(oldest) = stats.oldest_record {
        let _ = writeln!(out, "Oldest:        {}", oldest.to_rfc3339());
    }
    if let Some(last) = stats.last_update {
        let _ = writeln!(out, "Last update:   {}", last.to_rfc3339());
    }
    out
}
