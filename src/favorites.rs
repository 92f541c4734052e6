use crate::models::{BathroomKind, Consistency, Favorite, PlaceOption, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Type,
    Location,
    Size,
    Consistency,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Type,
        FormField::Location,
        FormField::Size,
        FormField::Consistency,
    ];
}

/// The valid option values of each bathroom form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    fields: Vec<(FormField, Vec<String>)>,
}

impl FormOptions {
    pub fn new(fields: Vec<(FormField, Vec<String>)>) -> Self {
        Self { fields }
    }

    pub fn options_for(&self, field: FormField) -> &[String] {
        self.fields
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, options)| options.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        fn names<T: Copy>(all: &[T], name: fn(T) -> &'static str) -> Vec<String> {
            all.iter().map(|value| name(*value).to_string()).collect()
        }

        Self::new(vec![
            (FormField::Type, names(BathroomKind::ALL, BathroomKind::as_str)),
            (FormField::Location, names(PlaceOption::ALL, PlaceOption::as_str)),
            (FormField::Size, names(Size::ALL, Size::as_str)),
            (FormField::Consistency, names(Consistency::ALL, Consistency::as_str)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub field: FormField,
    pub value: String,
}

pub fn favorite_value(favorite: &Favorite, field: FormField) -> Option<&str> {
    match field {
        FormField::Type => favorite.kind.as_deref(),
        FormField::Location => favorite.location.as_deref(),
        FormField::Size => favorite.size.as_deref(),
        FormField::Consistency => favorite.consistency.as_deref(),
    }
}

/// Picks the option to mark active in each field for `favorite`.
///
/// A field whose stored value is missing or not one of its options yields no
/// selection, so the form keeps whatever it showed before.
pub fn autofill(favorite: &Favorite, options: &FormOptions) -> Vec<FieldSelection> {
    FormField::ALL
        .into_iter()
        .filter_map(|field| {
            let stored = favorite_value(favorite, field)?;
            options
                .options_for(field)
                .iter()
                .find(|option| option.as_str() == stored)
                .map(|option| FieldSelection {
                    field,
                    value: option.clone(),
                })
        })
        .collect()
}

const DEFAULT_KIND: &str = "pee";
const DEFAULT_LOCATION: &str = "outside";
const DEFAULT_SIZE: &str = "small";
const DEFAULT_CONSISTENCY: &str = "normal";

/// Normalizes a favorites list before it is saved.
///
/// Blank names are dropped, ids are cleared for the store to assign, the
/// label falls back to the name, and name-only favorites get the default
/// bathroom snapshot.
pub fn prepare_favorites(favorites: Vec<Favorite>) -> Vec<Favorite> {
    favorites
        .into_iter()
        .filter_map(|favorite| {
            let name = favorite.name.trim().to_string();
            if name.is_empty() {
                return None;
            }

            let label = favorite
                .label
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| name.clone());

            Some(Favorite {
                id: None,
                label: Some(label),
                kind: favorite.kind.or_else(|| Some(DEFAULT_KIND.to_string())),
                location: favorite.location.or_else(|| Some(DEFAULT_LOCATION.to_string())),
                size: favorite.size.or_else(|| Some(DEFAULT_SIZE.to_string())),
                consistency: favorite
                    .consistency
                    .or_else(|| Some(DEFAULT_CONSISTENCY.to_string())),
                name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn favorite(kind: &str, location: &str, size: &str, consistency: &str) -> Favorite {
        Favorite {
            id: Some(RecordId::new("1")),
            name: "Morning walk".into(),
            label: None,
            kind: Some(kind.into()),
            location: Some(location.into()),
            size: Some(size.into()),
            consistency: Some(consistency.into()),
        }
    }

    #[test]
    fn autofill_selects_each_stored_option() {
        let selections = autofill(
            &favorite("pee", "outside", "small", "normal"),
            &FormOptions::default(),
        );
        assert_eq!(
            selections,
            vec![
                FieldSelection { field: FormField::Type, value: "pee".into() },
                FieldSelection { field: FormField::Location, value: "outside".into() },
                FieldSelection { field: FormField::Size, value: "small".into() },
                FieldSelection { field: FormField::Consistency, value: "normal".into() },
            ]
        );
    }

    #[test]
    fn invalid_or_missing_values_leave_field_alone() {
        let mut fav = favorite("bathroom", "outside", "medium", "normal");
        fav.consistency = None;

        let selections = autofill(&fav, &FormOptions::default());

        assert_eq!(
            selections,
            vec![FieldSelection { field: FormField::Location, value: "outside".into() }]
        );
    }

    #[test]
    fn unknown_field_has_no_options() {
        let options = FormOptions::new(vec![(FormField::Type, vec!["pee".into()])]);
        assert!(options.options_for(FormField::Size).is_empty());
    }

    #[test]
    fn prepare_fills_defaults_and_drops_blank_names() {
        let name_only = Favorite {
            id: Some(RecordId::new("9")),
            name: "  Quick one ".into(),
            label: None,
            kind: None,
            location: None,
            size: None,
            consistency: None,
        };
        let blank = Favorite {
            name: "   ".into(),
            ..name_only.clone()
        };

        let prepared = prepare_favorites(vec![name_only, blank]);

        assert_eq!(prepared.len(), 1);
        let fav = &prepared[0];
        assert_eq!(fav.id, None);
        assert_eq!(fav.name, "Quick one");
        assert_eq!(fav.display_label(), "Quick one");
        assert_eq!(fav.kind.as_deref(), Some("pee"));
        assert_eq!(fav.location.as_deref(), Some("outside"));
        assert_eq!(fav.size.as_deref(), Some("small"));
        assert_eq!(fav.consistency.as_deref(), Some("normal"));
    }
}
