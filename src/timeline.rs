use crate::format::capitalize;
use crate::models::{BathroomLogEntry, FoodLogEntry, RecordId};
use serde::Serialize;
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Food,
    Bathroom,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Food => "food",
            LogKind::Bathroom => "bathroom",
        }
    }
}

/// One row of the merged timeline, serialized as the entry's own fields plus
/// a `logType` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "logType", rename_all = "lowercase")]
pub enum TimelineItem {
    Food(FoodLogEntry),
    Bathroom(BathroomLogEntry),
}

impl TimelineItem {
    pub fn kind(&self) -> LogKind {
        match self {
            TimelineItem::Food(_) => LogKind::Food,
            TimelineItem::Bathroom(_) => LogKind::Bathroom,
        }
    }

    pub fn id(&self) -> Option<&RecordId> {
        match self {
            TimelineItem::Food(entry) => entry.id.as_ref(),
            TimelineItem::Bathroom(entry) => entry.id.as_ref(),
        }
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self {
            TimelineItem::Food(entry) => entry.timestamp,
            TimelineItem::Bathroom(entry) => entry.timestamp,
        }
    }

    pub fn timestamp_or_zero(&self) -> i64 {
        self.timestamp().unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        match self {
            TimelineItem::Food(entry) => format!("Food: {} - {}", entry.food_type, entry.quantity),
            TimelineItem::Bathroom(entry) => format!(
                "Bathroom: {} - {} - {} - {}",
                capitalize(Some(entry.kind.as_str())),
                capitalize(Some(&entry.location)),
                capitalize(Some(entry.size.as_str())),
                capitalize(Some(entry.consistency.as_str())),
            ),
        }
    }
}

/// Merges both log collections into one list, newest first.
///
/// Entries without a timestamp count as 0 and end up last. The sort is not
/// stable, so entries sharing a timestamp may come out in either order.
pub fn merge_timeline(food: &[FoodLogEntry], bathroom: &[BathroomLogEntry]) -> Vec<TimelineItem> {
    let mut items: Vec<TimelineItem> = food
        .iter()
        .cloned()
        .map(TimelineItem::Food)
        .chain(bathroom.iter().cloned().map(TimelineItem::Bathroom))
        .collect();
    items.sort_unstable_by_key(|item| Reverse(item.timestamp_or_zero()));
    items
}

/// Distinct food types in the order they first appear.
pub fn food_types(food: &[FoodLogEntry]) -> Vec<String> {
    let mut seen = Vec::new();
    for entry in food {
        if !entry.food_type.is_empty() && !seen.contains(&entry.food_type) {
            seen.push(entry.food_type.clone());
        }
    }
    seen
}

pub(crate) fn sort_newest_first<T>(entries: &mut [T], timestamp: impl Fn(&T) -> i64) {
    entries.sort_unstable_by_key(|entry| Reverse(timestamp(entry)));
}
