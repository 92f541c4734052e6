//! Spreadsheet-backed store.
//!
//! The endpoint is a published spreadsheet script with two verbs:
//! `GET ?sheet=<name>` answers every row as an array of objects keyed by the
//! header row, and `POST ?sheet=<name>` with an array body replaces every row
//! below the header. Single-record writes are therefore read-modify-write.

use super::{Collection, LogStore, Row, row_id};
use crate::errors::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub struct SheetStore {
    url: String,
    client: Client,
    write_lock: Mutex<()>,
}

impl SheetStore {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            write_lock: Mutex::new(()),
        }
    }

    async fn replace_all(&self, collection: Collection, rows: &[Row]) -> Result<(), StoreError> {
        debug!(%collection, rows = rows.len(), "writing sheet");
        let response = self
            .client
            .post(&self.url)
            .query(&[("sheet", collection.table_name())])
            .json(rows)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn modify<F>(&self, collection: Collection, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Row>) -> Result<(), StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.try_fetch_all(collection).await?;
        change(&mut rows)?;
        self.replace_all(collection, &rows).await
    }
}

#[async_trait]
impl LogStore for SheetStore {
    fn backend_name(&self) -> &'static str {
        "sheet"
    }

    async fn try_fetch_all(&self, collection: Collection) -> Result<Vec<Row>, StoreError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("sheet", collection.table_name())])
            .send()
            .await?;
        let rows: Vec<Row> = check_status(response).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, mut row: Row) -> Result<(), StoreError> {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        self.modify(collection, |rows| {
            rows.push(row);
            Ok(())
        })
        .await
    }

    async fn update(&self, collection: Collection, id: &RecordId, row: Row) -> Result<(), StoreError> {
        self.modify(collection, |rows| {
            let existing = rows
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
        self.modify(collection, |rows| {
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
        let _guard = self.write_lock.lock().await;
        self.replace_all(collection, &[]).await
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        backend: "sheet",
        status: status.as_u16(),
        body,
    })
}
