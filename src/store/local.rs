use super::{Collection, LogStore, Row, row_id};
use crate::errors::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::error;

/// Everything the local backend keeps on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalData {
    #[serde(default)]
    pub food_logs: Vec<Row>,
    #[serde(default)]
    pub bathroom_logs: Vec<Row>,
    #[serde(default)]
    pub favorites: Vec<Row>,
    #[serde(default)]
    pub next_id: u64,
}

impl LocalData {
    fn rows(&self, collection: Collection) -> &Vec<Row> {
        match collection {
            Collection::FoodLogs => &self.food_logs,
            Collection::BathroomLogs => &self.bathroom_logs,
            Collection::Favorites => &self.favorites,
        }
    }

    fn rows_mut(&mut self, collection: Collection) -> &mut Vec<Row> {
        match collection {
            Collection::FoodLogs => &mut self.food_logs,
            Collection::BathroomLogs => &mut self.bathroom_logs,
            Collection::Favorites => &mut self.favorites,
        }
    }
}

/// JSON-file backed store. Without a path it lives only in memory.
pub struct LocalStore {
    path: Option<PathBuf>,
    data: Mutex<LocalData>,
}

impl LocalStore {
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = load_data(&path).await;
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(LocalData::default()),
        }
    }

    /// Applies `change` to a copy of the data and keeps it only once it has
    /// been written out.
    async fn commit<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut LocalData) -> Result<(), StoreError>,
    {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        change(&mut next)?;

        if let Some(path) = &self.path {
            persist_data(path, &next).await?;
        }

        *data = next;
        Ok(())
    }
}

#[async_trait]
impl LogStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn try_fetch_all(&self, collection: Collection) -> Result<Vec<Row>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.rows(collection).clone())
    }

    async fn insert(&self, collection: Collection, mut row: Row) -> Result<(), StoreError> {
        self.commit(|data| {
            data.next_id += 1;
            row.insert("id".to_string(), Value::String(data.next_id.to_string()));
            data.rows_mut(collection).push(row);
            Ok(())
        })
        .await
    }

    async fn update(&self, collection: Collection, id: &RecordId, row: Row) -> Result<(), StoreError> {
        self.commit(|data| {
            let existing = data
                .rows_mut(collection)
                .iter_mut()
                .find(|existing| row_id(existing).as_ref() == Some(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.clone(),
                })?;

            for (key, value) in row {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError> {
        self.commit(|data| {
            let rows = data.rows_mut(collection);
            let before = rows.len();
            rows.retain(|existing| row_id(existing).as_ref() != Some(id));
            if rows.len() == before {
                return Err(StoreError::NotFound {
                    collection,
                    id: id.clone(),
                });
            }
            Ok(())
        })
        .await
    }

    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        self.commit(|data| {
            data.rows_mut(collection).clear();
            Ok(())
        })
        .await
    }
}

pub async fn load_data(path: &Path) -> LocalData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                LocalData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LocalData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            LocalData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &LocalData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}
