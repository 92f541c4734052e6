use chrono::{Local, NaiveDateTime, TimeZone};

pub const INVALID_DATE: &str = "Invalid Date";

const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";
const PARSE_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Uppercases the first character and leaves the rest alone.
pub fn capitalize(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders epoch milliseconds as local date and time, e.g.
/// `1/5/2026, 3:04:05 PM`.
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(moment) => moment.format(DISPLAY_FORMAT).to_string(),
        None => INVALID_DATE.to_string(),
    }
}

pub fn format_optional_timestamp(millis: Option<i64>) -> String {
    millis
        .map(format_timestamp)
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Reads back a string produced by [`format_timestamp`]. Sub-second precision
/// is not recoverable, and a time inside the hour repeated when daylight
/// saving ends resolves to its first occurrence.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), PARSE_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|moment| moment.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_all_inputs() {
        assert_eq!(capitalize(Some("test")), "Test");
        assert_eq!(capitalize(Some("hello world")), "Hello world");
        assert_eq!(capitalize(Some("")), "");
        assert_eq!(capitalize(None), "");
    }

    #[test]
    fn formatted_timestamp_has_date_and_time() {
        let formatted = format_timestamp(1_767_225_600_000);
        let (date, time) = formatted.split_once(", ").expect("date and time");
        assert_eq!(date.split('/').count(), 3);
        assert_eq!(time.split(':').count(), 3);
        assert!(time.ends_with("AM") || time.ends_with("PM"));
    }

    #[test]
    fn out_of_range_timestamp_is_invalid() {
        assert_eq!(format_timestamp(i64::MAX), INVALID_DATE);
        assert_eq!(format_optional_timestamp(None), INVALID_DATE);
    }

    #[test]
    fn parse_reverses_format_to_the_second() {
        let millis = 1_751_371_385_000;
        assert_eq!(parse_timestamp(&format_timestamp(millis)), Some(millis));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
