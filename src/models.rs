use crate::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Store-assigned record identifier.
///
/// Hosted tables hand out integers while the local and sheet backends use
/// strings, so both JSON shapes are accepted. The value is only meaningful to
/// the store that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (bool, i64, &str) {
        match self.0.parse::<i64>() {
            Ok(number) => (false, number, &self.0),
            Err(_) => (true, 0, &self.0),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Numeric ids come first in numeric order, then every other id in string
/// order.
impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Scalar::deserialize(deserializer)? {
            Scalar::Int(value) => Ok(Self(value.to_string())),
            Scalar::Float(value) => Ok(Self(value.to_string())),
            Scalar::Text(value) => Ok(Self(value)),
            Scalar::Bool(value) => Err(serde::de::Error::custom(format!(
                "record id cannot be a boolean ({value})"
            ))),
        }
    }
}

/// Spreadsheet cells come back typed, so a "1 cup" column can hold the
/// number 1. Text fields accept any scalar.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Bool(value) => value.to_string(),
            Scalar::Text(value) => value,
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .filter(|value| !value.trim().is_empty()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(value)) => Some(value),
        Some(Scalar::Float(value)) if value.is_finite() => Some(value as i64),
        Some(Scalar::Text(value)) => value.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub food_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default)]
    pub stolen: bool,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

impl FoodLogEntry {
    /// Sort key; an entry without a timestamp sorts as the oldest possible.
    pub fn timestamp_or_zero(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::UnknownOption {
                        field: $field,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

option_enum!(BathroomKind, "type" { Pee => "pee", Poop => "poop" });
option_enum!(Size, "size" { Big => "big", Small => "small" });
option_enum!(Consistency, "consistency" {
    Normal => "normal",
    Soft => "soft",
    Sick => "sick",
});
option_enum!(
    /// Choices offered by the bathroom form's location radio group. Stored
    /// entries keep free text so coordinates fit.
    PlaceOption, "location" { Inside => "inside", Outside => "outside" }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BathroomLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "type")]
    pub kind: BathroomKind,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    pub size: Size,
    pub consistency: Consistency,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

impl BathroomLogEntry {
    pub fn timestamp_or_zero(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

/// Fields the food form submits. Also the full replacement row on edit.
///
/// Missing or null fields read as empty so [`FoodForm::validate`] reports
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodForm {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub food_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub stolen: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

impl FoodForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.food_type.trim().is_empty() {
            return Err(ValidationError::Missing("type"));
        }
        if self.quantity.trim().is_empty() {
            return Err(ValidationError::Missing("quantity"));
        }
        Ok(())
    }

    pub fn into_entry(self, timestamp: i64) -> FoodLogEntry {
        let location = self.location.trim().to_string();
        FoodLogEntry {
            id: None,
            food_type: self.food_type.trim().to_string(),
            quantity: self.quantity.trim().to_string(),
            stolen: self.stolen,
            location: (!location.is_empty()).then_some(location),
            timestamp: Some(timestamp),
        }
    }
}

/// Fields the bathroom form submits, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BathroomForm {
    #[serde(rename = "type", default, deserialize_with = "lenient_optional_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub consistency: Option<String>,
}

impl BathroomForm {
    pub fn validate(self) -> Result<BathroomFields, ValidationError> {
        fn choice<T: FromStr<Err = ValidationError>>(
            value: Option<String>,
            field: &'static str,
        ) -> Result<T, ValidationError> {
            value.ok_or(ValidationError::Missing(field))?.parse()
        }

        Ok(BathroomFields {
            kind: choice(self.kind, "type")?,
            location: self.location.trim().to_string(),
            size: choice(self.size, "size")?,
            consistency: choice(self.consistency, "consistency")?,
        })
    }
}

/// A validated bathroom form. Also the full replacement row on edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BathroomFields {
    #[serde(rename = "type")]
    pub kind: BathroomKind,
    pub location: String,
    pub size: Size,
    pub consistency: Consistency,
}

impl BathroomFields {
    pub fn into_entry(self, timestamp: i64) -> BathroomLogEntry {
        BathroomLogEntry {
            id: None,
            kind: self.kind,
            location: self.location,
            size: self.size,
            consistency: self.consistency,
            timestamp: Some(timestamp),
        }
    }
}

/// A quick-fill shortcut for the bathroom form.
///
/// Field values stay plain strings: stored favorites may hold values outside
/// the form's option sets, and those must degrade instead of failing to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub consistency: Option<String>,
}

impl Favorite {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub food_logs: Vec<FoodLogEntry>,
    pub bathroom_logs: Vec<BathroomLogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: String,
    pub food_logs: usize,
    pub bathroom_logs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_accepts_numbers_and_strings() {
        let numeric: RecordId = serde_json::from_value(json!(42)).unwrap();
        let text: RecordId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(numeric.as_str(), "42");
        assert_eq!(text.as_str(), "abc");
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!("42"));
    }

    #[test]
    fn record_ids_order_numerically_when_possible() {
        let mut ids = vec![RecordId::new("10"), RecordId::new("9"), RecordId::new("b")];
        ids.sort();
        assert_eq!(ids, vec![RecordId::new("9"), RecordId::new("10"), RecordId::new("b")]);
    }

    #[test]
    fn mixed_record_ids_sort_numbers_first() {
        let two = RecordId::new("2");
        let ten = RecordId::new("10");
        let mixed = RecordId::new("10a");
        assert!(two < ten);
        assert!(ten < mixed);
        assert!(two < mixed);

        let mut ids = vec![
            mixed.clone(),
            RecordId::new("5f3c"),
            ten.clone(),
            RecordId::new("-1"),
            two.clone(),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![RecordId::new("-1"), two, ten, mixed, RecordId::new("5f3c")]
        );
    }

    #[test]
    fn food_entry_tolerates_sheet_cells() {
        let entry: FoodLogEntry = serde_json::from_value(json!({
            "id": 3,
            "type": "kibble",
            "quantity": 1,
            "stolen": false,
            "location": "",
            "timestamp": 1_700_000_000_000.0
        }))
        .unwrap();
        assert_eq!(entry.quantity, "1");
        assert_eq!(entry.location, None);
        assert_eq!(entry.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn missing_timestamp_is_explicitly_zero() {
        let entry: BathroomLogEntry = serde_json::from_value(json!({
            "type": "poop",
            "location": "outside",
            "size": "big",
            "consistency": "soft"
        }))
        .unwrap();
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.timestamp_or_zero(), 0);
    }

    #[test]
    fn food_form_requires_type_and_quantity() {
        let form = FoodForm {
            food_type: " ".into(),
            quantity: "1 cup".into(),
            stolen: false,
            location: String::new(),
        };
        assert!(matches!(form.validate(), Err(ValidationError::Missing("type"))));
    }

    #[test]
    fn missing_and_null_form_fields_reach_validation() {
        let food: FoodForm = serde_json::from_value(json!({ "type": "kibble", "quantity": null })).unwrap();
        assert!(matches!(food.validate(), Err(ValidationError::Missing("quantity"))));

        let bathroom: BathroomForm =
            serde_json::from_value(json!({ "type": "pee", "size": null, "consistency": "soft" })).unwrap();
        assert!(matches!(bathroom.validate(), Err(ValidationError::Missing("size"))));

        let bathroom: BathroomForm =
            serde_json::from_value(json!({ "type": "pee", "size": "huge", "consistency": "soft" })).unwrap();
        assert!(matches!(
            bathroom.validate(),
            Err(ValidationError::UnknownOption { field: "size", .. })
        ));
    }

    #[test]
    fn bathroom_form_validates_into_typed_fields() {
        let form: BathroomForm = serde_json::from_value(json!({
            "type": "Poop",
            "location": " park ",
            "size": "big",
            "consistency": "normal"
        }))
        .unwrap();
        let fields = form.validate().unwrap();
        assert_eq!(fields.kind, BathroomKind::Poop);
        assert_eq!(fields.location, "park");
        assert_eq!(fields.into_entry(5).timestamp, Some(5));
    }

    #[test]
    fn option_enums_parse_case_insensitively() {
        assert_eq!("Pee".parse::<BathroomKind>().unwrap(), BathroomKind::Pee);
        assert_eq!("sick".parse::<Consistency>().unwrap(), Consistency::Sick);
        assert!("medium".parse::<Size>().is_err());
    }
}
