use crate::format::format_optional_timestamp;
use crate::models::{BathroomLogEntry, FoodLogEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

pub const CSV_HEADER: [&str; 3] = ["Type", "Details", "Timestamp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unsupported export format '{other}'")),
        }
    }
}

/// Flat, display-ready summary of one log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub category: &'static str,
    pub details: String,
    pub timestamp: String,
    #[serde(skip)]
    pub sort_key: i64,
}

pub fn food_details(entry: &FoodLogEntry) -> String {
    format!("{} - {}", entry.food_type, entry.quantity)
}

pub fn bathroom_details(entry: &BathroomLogEntry) -> String {
    format!(
        "{} - {} - {} - {}",
        entry.kind, entry.location, entry.size, entry.consistency
    )
}

/// Summarizes both collections, newest first. Ties come out in no
/// particular order.
pub fn build_export_records(food: &[FoodLogEntry], bathroom: &[BathroomLogEntry]) -> Vec<ExportRecord> {
    let mut records: Vec<ExportRecord> = food
        .iter()
        .map(|entry| ExportRecord {
            category: "Food",
            details: food_details(entry),
            timestamp: format_optional_timestamp(entry.timestamp),
            sort_key: entry.timestamp_or_zero(),
        })
        .chain(bathroom.iter().map(|entry| ExportRecord {
            category: "Bathroom",
            details: bathroom_details(entry),
            timestamp: format_optional_timestamp(entry.timestamp),
            sort_key: entry.timestamp_or_zero(),
        }))
        .collect();
    records.sort_unstable_by_key(|record| Reverse(record.sort_key));
    records
}

/// Writes the records as CSV.
///
/// Fields are written verbatim with no quoting, so a comma inside a field
/// (a free-text location, or the timestamp's own `, `) splits it across
/// columns. Readers must rejoin everything after the second column.
pub fn to_csv(records: &[ExportRecord]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([record.category, record.details.as_str(), record.timestamp.as_str()])?;
    }
    writer.flush()?;

    let bytes = writer.into_inner().map_err(|err| csv::Error::from(err.into_error()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_end_matches('\n').to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub food_logs: Vec<FoodLogEntry>,
    pub bathroom_logs: Vec<BathroomLogEntry>,
    pub export_date: String,
}

pub fn to_json(
    food: &[FoodLogEntry],
    bathroom: &[BathroomLogEntry],
    exported_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let document = ExportDocument {
        food_logs: food.to_vec(),
        bathroom_logs: bathroom.to_vec(),
        export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    serde_json::to_string_pretty(&document)
}

/// `molly-logs-<YYYY-MM-DD>.<ext>`, dated in UTC.
pub fn export_file_name(exported_at: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "molly-logs-{}.{}",
        exported_at.format("%Y-%m-%d"),
        format.extension()
    )
}
