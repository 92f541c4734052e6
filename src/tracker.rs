//! The controller between the HTTP layer and the log store.
//!
//! [`Tracker`] owns the in-memory snapshot of all three collections. Every
//! mutation writes to the store first, then re-fetches the collection it
//! touched and swaps it into the snapshot. A failed write returns before the
//! re-fetch, so the snapshot only ever reflects what the store reported.
//! Mutations are not serialized against each other: when two overlap, the
//! later re-fetch wins.

use crate::errors::{StoreError, TrackerError};
use crate::export::{ExportFormat, build_export_records, export_file_name, to_csv, to_json};
use crate::favorites::{FieldSelection, FormOptions, autofill, prepare_favorites};
use crate::import::{ImportFormat, ImportedLogs, parse};
use crate::models::{BathroomForm, BathroomLogEntry, Favorite, FoodForm, FoodLogEntry, RecordId};
use crate::store::{Collection, LogStore, fetch_records, to_row};
use crate::timeline::{TimelineItem, food_types, merge_timeline, sort_newest_first};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub food_logs: Vec<FoodLogEntry>,
    pub bathroom_logs: Vec<BathroomLogEntry>,
    pub favorites: Vec<Favorite>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub food_logs: usize,
    pub bathroom_logs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

pub struct Tracker {
    store: Arc<dyn LogStore>,
    options: FormOptions,
    snapshot: RwLock<Snapshot>,
}

impl Tracker {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            options: FormOptions::default(),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Builds a tracker and fills its snapshot from the store.
    pub async fn load(store: Arc<dyn LogStore>) -> Self {
        let tracker = Self::new(store);
        tracker.refresh_all().await;
        tracker
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn form_options(&self) -> &FormOptions {
        &self.options
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn timeline(&self) -> Vec<TimelineItem> {
        let snapshot = self.snapshot.read().await;
        merge_timeline(&snapshot.food_logs, &snapshot.bathroom_logs)
    }

    pub async fn food_types(&self) -> Vec<String> {
        food_types(&self.snapshot.read().await.food_logs)
    }

    pub async fn refresh_all(&self) {
        self.refresh_food().await;
        self.refresh_bathroom().await;
        self.refresh_favorites().await;
    }

    async fn refresh_food(&self) {
        let mut entries: Vec<FoodLogEntry> = fetch_records(self.store.as_ref(), Collection::FoodLogs).await;
        sort_newest_first(&mut entries, FoodLogEntry::timestamp_or_zero);
        self.snapshot.write().await.food_logs = entries;
    }

    async fn refresh_bathroom(&self) {
        let mut entries: Vec<BathroomLogEntry> =
            fetch_records(self.store.as_ref(), Collection::BathroomLogs).await;
        sort_newest_first(&mut entries, BathroomLogEntry::timestamp_or_zero);
        self.snapshot.write().await.bathroom_logs = entries;
    }

    async fn refresh_favorites(&self) {
        let mut favorites: Vec<Favorite> = fetch_records(self.store.as_ref(), Collection::Favorites).await;
        favorites.sort_by(|a, b| match (&a.id, &b.id) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        self.snapshot.write().await.favorites = favorites;
    }

    pub async fn add_food(&self, form: FoodForm) -> Result<(), TrackerError> {
        form.validate()?;
        let entry = form.into_entry(now_millis());
        self.store.insert(Collection::FoodLogs, to_row(&entry)?).await?;
        info!(food_type = %entry.food_type, "food logged");
        self.refresh_food().await;
        Ok(())
    }

    /// Replaces every editable field; the stored timestamp is kept.
    pub async fn update_food(&self, id: &RecordId, form: FoodForm) -> Result<(), TrackerError> {
        form.validate()?;
        self.store.update(Collection::FoodLogs, id, to_row(&form)?).await?;
        info!(%id, "food entry updated");
        self.refresh_food().await;
        Ok(())
    }

    pub async fn delete_food(&self, id: &RecordId) -> Result<(), TrackerError> {
        self.store.delete(Collection::FoodLogs, id).await?;
        info!(%id, "food entry deleted");
        self.refresh_food().await;
        Ok(())
    }

    pub async fn add_bathroom(&self, form: BathroomForm) -> Result<(), TrackerError> {
        let entry = form.validate()?.into_entry(now_millis());
        self.store
            .insert(Collection::BathroomLogs, to_row(&entry)?)
            .await?;
        info!(kind = %entry.kind, "bathroom break logged");
        self.refresh_bathroom().await;
        Ok(())
    }

    /// Replaces every editable field; the stored timestamp is kept.
    pub async fn update_bathroom(&self, id: &RecordId, form: BathroomForm) -> Result<(), TrackerError> {
        let fields = form.validate()?;
        self.store
            .update(Collection::BathroomLogs, id, to_row(&fields)?)
            .await?;
        info!(%id, "bathroom entry updated");
        self.refresh_bathroom().await;
        Ok(())
    }

    pub async fn delete_bathroom(&self, id: &RecordId) -> Result<(), TrackerError> {
        self.store.delete(Collection::BathroomLogs, id).await?;
        info!(%id, "bathroom entry deleted");
        self.refresh_bathroom().await;
        Ok(())
    }

    /// Replaces the whole favorites collection with `favorites`.
    ///
    /// The stored collection is cleared before the new list is inserted, so
    /// nothing of the old list survives a successful save, not even rows
    /// stored without an id.
    pub async fn save_favorites(&self, favorites: Vec<Favorite>) -> Result<Vec<Favorite>, TrackerError> {
        let favorites = prepare_favorites(favorites);

        self.store.clear(Collection::Favorites).await?;
        for favorite in &favorites {
            self.store.insert(Collection::Favorites, to_row(favorite)?).await?;
        }

        info!(count = favorites.len(), "favorites replaced");
        self.refresh_favorites().await;
        Ok(self.snapshot.read().await.favorites.clone())
    }

    pub async fn autofill(&self, id: &RecordId) -> Result<Vec<FieldSelection>, TrackerError> {
        let snapshot = self.snapshot.read().await;
        let favorite = snapshot
            .favorites
            .iter()
            .find(|favorite| favorite.id.as_ref() == Some(id))
            .ok_or_else(|| TrackerError::UnknownFavorite(id.clone()))?;
        Ok(autofill(favorite, &self.options))
    }

    pub async fn export(&self, format: ExportFormat) -> Result<ExportFile, TrackerError> {
        let exported_at = Utc::now();
        let snapshot = self.snapshot.read().await;
        let body = match format {
            ExportFormat::Csv => to_csv(&build_export_records(&snapshot.food_logs, &snapshot.bathroom_logs))?,
            ExportFormat::Json => to_json(&snapshot.food_logs, &snapshot.bathroom_logs, exported_at)
                .map_err(StoreError::from)?,
        };

        Ok(ExportFile {
            file_name: export_file_name(exported_at, format),
            content_type: format.content_type(),
            body,
        })
    }

    /// Inserts every entry of an export file, then re-fetches both logs.
    ///
    /// Entries are inserted one at a time; a failure part-way leaves the
    /// earlier ones stored.
    pub async fn import(&self, file_name: &str, text: &str) -> Result<ImportSummary, TrackerError> {
        let format = ImportFormat::from_file_name(file_name)?;
        let ImportedLogs {
            food_logs,
            bathroom_logs,
        } = parse(format, text)?.without_ids();

        for entry in &food_logs {
            self.store.insert(Collection::FoodLogs, to_row(entry)?).await?;
        }
        for entry in &bathroom_logs {
            self.store
                .insert(Collection::BathroomLogs, to_row(entry)?)
                .await?;
        }

        let summary = ImportSummary {
            food_logs: food_logs.len(),
            bathroom_logs: bathroom_logs.len(),
        };
        info!(file_name, food = summary.food_logs, bathroom = summary.bathroom_logs, "logs imported");
        self.refresh_food().await;
        self.refresh_bathroom().await;
        Ok(summary)
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
