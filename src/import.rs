use crate::errors::ImportError;
use crate::export::CSV_HEADER;
use crate::format::parse_timestamp;
use crate::models::{BathroomLogEntry, FoodLogEntry};
use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, ImportError> {
        let lower = file_name.trim().to_ascii_lowercase();
        if lower.ends_with(".json") {
            Ok(ImportFormat::Json)
        } else if lower.ends_with(".csv") {
            Ok(ImportFormat::Csv)
        } else {
            Err(ImportError::UnsupportedFile(file_name.to_string()))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedLogs {
    pub food_logs: Vec<FoodLogEntry>,
    pub bathroom_logs: Vec<BathroomLogEntry>,
}

impl ImportedLogs {
    /// Clears every id so the store hands out fresh ones on insert.
    pub fn without_ids(mut self) -> Self {
        for entry in &mut self.food_logs {
            entry.id = None;
        }
        for entry in &mut self.bathroom_logs {
            entry.id = None;
        }
        self
    }
}

pub fn parse(format: ImportFormat, text: &str) -> Result<ImportedLogs, ImportError> {
    match format {
        ImportFormat::Json => parse_json(text),
        ImportFormat::Csv => parse_csv(text),
    }
}

/// Reads a JSON export. Both `foodLogs` and `bathroomLogs` must be arrays.
pub fn parse_json(text: &str) -> Result<ImportedLogs, ImportError> {
    let mut document: Value = serde_json::from_str(text)?;
    let (Some(food), Some(bathroom)) = (
        document.get_mut("foodLogs").filter(|value| value.is_array()).map(Value::take),
        document
            .get_mut("bathroomLogs")
            .filter(|value| value.is_array())
            .map(Value::take),
    ) else {
        return Err(ImportError::InvalidJson);
    };

    Ok(ImportedLogs {
        food_logs: serde_json::from_value(food)?,
        bathroom_logs: serde_json::from_value(bathroom)?,
    })
}

/// Reads a CSV export back into entries.
///
/// The details column only carries what the export wrote, so food entries
/// come back with `stolen = false` and no location, and timestamps lose
/// their milliseconds. Timestamps are read in the local time zone; one
/// written during the repeated hour at the end of daylight saving comes back
/// as the earlier of the two instants, up to an hour early.
pub fn parse_csv(text: &str) -> Result<ImportedLogs, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| ImportError::InvalidCsv("the file is empty".to_string()))?;
    if header.len() != CSV_HEADER.len() || header.iter().zip(CSV_HEADER).any(|(got, want)| got.trim() != want) {
        return Err(ImportError::InvalidCsv(format!(
            "expected the header {}",
            CSV_HEADER.join(",")
        )));
    }

    let mut logs = ImportedLogs::default();
    for (index, record) in records.enumerate() {
        let record = record?;
        let line = index + 2;
        let fields: Vec<&str> = record.iter().collect();
        if fields.len() < CSV_HEADER.len() {
            return Err(ImportError::InvalidCsv(format!(
                "line {line}: expected {} columns, found {}",
                CSV_HEADER.len(),
                fields.len()
            )));
        }

        let timestamp_text = fields[2..].join(",");
        let timestamp = parse_timestamp(&timestamp_text).ok_or_else(|| {
            ImportError::InvalidCsv(format!("line {line}: unreadable timestamp '{timestamp_text}'"))
        })?;

        match fields[0].trim() {
            "Food" => logs.food_logs.push(parse_food(fields[1], timestamp, line)?),
            "Bathroom" => logs
                .bathroom_logs
                .push(parse_bathroom(fields[1], timestamp, line)?),
            other => {
                return Err(ImportError::InvalidCsv(format!(
                    "line {line}: unknown type '{other}'"
                )));
            }
        }
    }

    Ok(logs)
}

fn parse_food(details: &str, timestamp: i64, line: usize) -> Result<FoodLogEntry, ImportError> {
    let (food_type, quantity) = details.split_once(" - ").ok_or_else(|| {
        ImportError::InvalidCsv(format!("line {line}: food details must read 'type - quantity'"))
    })?;

    Ok(FoodLogEntry {
        id: None,
        food_type: food_type.trim().to_string(),
        quantity: quantity.trim().to_string(),
        stolen: false,
        location: None,
        timestamp: Some(timestamp),
    })
}

fn parse_bathroom(details: &str, timestamp: i64, line: usize) -> Result<BathroomLogEntry, ImportError> {
    let parts: Vec<&str> = details.split(" - ").collect();
    if parts.len() < 4 {
        return Err(ImportError::InvalidCsv(format!(
            "line {line}: bathroom details must read 'type - location - size - consistency'"
        )));
    }

    let invalid = |err: crate::errors::ValidationError| ImportError::InvalidCsv(format!("line {line}: {err}"));
    let last = parts.len() - 1;

    Ok(BathroomLogEntry {
        id: None,
        kind: parts[0].parse().map_err(invalid)?,
        location: parts[1..last - 1].join(" - ").trim().to_string(),
        size: parts[last - 1].parse().map_err(invalid)?,
        consistency: parts[last].parse().map_err(invalid)?,
        timestamp: Some(timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{build_export_records, to_csv, to_json};
    use crate::models::{BathroomKind, Consistency, RecordId, Size};
    use chrono::Utc;

    fn food() -> FoodLogEntry {
        FoodLogEntry {
            id: Some(RecordId::new("4")),
            food_type: "kibble".into(),
            quantity: "1 cup".into(),
            stolen: true,
            location: Some("kitchen".into()),
            timestamp: Some(1_751_371_385_123),
        }
    }

    fn bathroom() -> BathroomLogEntry {
        BathroomLogEntry {
            id: Some(RecordId::new("7")),
            kind: BathroomKind::Pee,
            location: "back yard".into(),
            size: Size::Small,
            consistency: Consistency::Normal,
            timestamp: Some(1_751_371_000_000),
        }
    }

    #[test]
    fn file_type_follows_extension() {
        assert_eq!(ImportFormat::from_file_name("molly-logs.JSON").unwrap(), ImportFormat::Json);
        assert_eq!(ImportFormat::from_file_name("a.csv").unwrap(), ImportFormat::Csv);
        assert!(matches!(
            ImportFormat::from_file_name("a.xlsx"),
            Err(ImportError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn json_export_round_trips_without_ids() {
        let json = to_json(&[food()], &[bathroom()], Utc::now()).unwrap();
        let imported = parse_json(&json).unwrap().without_ids();

        let mut expected_food = food();
        expected_food.id = None;
        let mut expected_bathroom = bathroom();
        expected_bathroom.id = None;
        assert_eq!(imported.food_logs, vec![expected_food]);
        assert_eq!(imported.bathroom_logs, vec![expected_bathroom]);
    }

    #[test]
    fn json_without_both_arrays_is_rejected() {
        assert!(matches!(
            parse_json(r#"{"foodLogs": []}"#),
            Err(ImportError::InvalidJson)
        ));
        assert!(matches!(
            parse_json(r#"{"foodLogs": [], "bathroomLogs": {}}"#),
            Err(ImportError::InvalidJson)
        ));
        assert!(matches!(parse_json("[1, 2"), Err(ImportError::Malformed(_))));
    }

    #[test]
    fn csv_export_reads_back_its_fields() {
        let csv = to_csv(&build_export_records(&[food()], &[bathroom()])).unwrap();
        let imported = parse_csv(&csv).unwrap();

        assert_eq!(imported.food_logs.len(), 1);
        let entry = &imported.food_logs[0];
        assert_eq!(entry.food_type, "kibble");
        assert_eq!(entry.quantity, "1 cup");
        assert_eq!(entry.timestamp, Some(1_751_371_385_000));

        assert_eq!(imported.bathroom_logs.len(), 1);
        let entry = &imported.bathroom_logs[0];
        assert_eq!(entry.kind, BathroomKind::Pee);
        assert_eq!(entry.location, "back yard");
        assert_eq!(entry.size, Size::Small);
        assert_eq!(entry.timestamp, Some(1_751_371_000_000));
    }

    #[test]
    fn csv_with_other_shape_is_rejected() {
        assert!(matches!(
            parse_csv("Date,Value\n1,2"),
            Err(ImportError::InvalidCsv(_))
        ));
        assert!(matches!(
            parse_csv("Type,Details,Timestamp\nFood,kibble - 1 cup"),
            Err(ImportError::InvalidCsv(_))
        ));
        assert!(matches!(parse_csv(""), Err(ImportError::InvalidCsv(_))));
    }

    #[test]
    fn csv_location_with_comma_breaks_the_row() {
        let mut entry = bathroom();
        entry.location = "45.12345, -122.54321".into();
        let csv = to_csv(&build_export_records(&[], &[entry])).unwrap();
        assert!(matches!(parse_csv(&csv), Err(ImportError::InvalidCsv(_))));
    }
}
