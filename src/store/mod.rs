//! The log store contract and its backends.
//!
//! Every backend speaks in [`Row`]s, plain JSON objects, and the typed layer
//! on top ([`fetch_records`], [`to_row`]) converts to and from the models.

mod local;
mod sheet;
mod supabase;

pub use local::{LocalData, LocalStore, load_data, persist_data};
pub use sheet::SheetStore;
pub use supabase::SupabaseStore;

use crate::config::BackendConfig;
use crate::errors::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    FoodLogs,
    BathroomLogs,
    Favorites,
}

impl Collection {
    pub fn table_name(self) -> &'static str {
        match self {
            Collection::FoodLogs => "food_logs",
            Collection::BathroomLogs => "bathroom_logs",
            Collection::Favorites => "favorites",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[async_trait]
pub trait LogStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn try_fetch_all(&self, collection: Collection) -> Result<Vec<Row>, StoreError>;

    /// Like [`LogStore::try_fetch_all`], but a failure reads as an empty
    /// collection.
    async fn fetch_all(&self, collection: Collection) -> Vec<Row> {
        match self.try_fetch_all(collection).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(backend = self.backend_name(), %collection, "failed to fetch records: {err}");
                Vec::new()
            }
        }
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<(), StoreError>;

    /// Overwrites the given fields of the record; fields absent from `row`
    /// keep their stored value.
    async fn update(&self, collection: Collection, id: &RecordId, row: Row) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError>;

    /// Removes every record of the collection, including rows stored
    /// without an id.
    async fn clear(&self, collection: Collection) -> Result<(), StoreError>;
}

pub async fn connect(config: &BackendConfig) -> Result<Arc<dyn LogStore>, StoreError> {
    let store: Arc<dyn LogStore> = match config {
        BackendConfig::Local { data_path } => Arc::new(LocalStore::open(data_path.clone()).await?),
        BackendConfig::Sheet { url } => Arc::new(SheetStore::new(url.clone())),
        BackendConfig::Supabase { url, key } => Arc::new(SupabaseStore::new(url.clone(), key.clone())),
    };
    Ok(store)
}

/// Serializes a record into a row. Records without an id produce rows
/// without an `id` key.
pub fn to_row<T: Serialize>(record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Rejected(format!(
            "records must serialize to objects, got {other}"
        ))),
    }
}

pub fn row_id(row: &Row) -> Option<RecordId> {
    row.get("id")
        .filter(|value| !value.is_null())
        .and_then(|value| RecordId::deserialize(value).ok())
}

/// Converts rows into records, skipping any row that does not fit `T`.
pub fn from_rows<T: DeserializeOwned>(collection: Collection, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row_id(&row);
            match serde_json::from_value(Value::Object(row)) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(%collection, id = ?id, "skipping unreadable record: {err}");
                    None
                }
            }
        })
        .collect()
}

pub async fn fetch_records<T: DeserializeOwned>(store: &dyn LogStore, collection: Collection) -> Vec<T> {
    from_rows(collection, store.fetch_all(collection).await)
}
