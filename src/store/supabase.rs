//! Hosted table store speaking the PostgREST dialect served under
//! `<project>/rest/v1/<table>`.

use super::{Collection, LogStore, Row};
use crate::errors::StoreError;
use crate::models::RecordId;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table_name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Runs a write filtered to one id and fails when it touched nothing.
    async fn write_one(
        &self,
        collection: Collection,
        id: &RecordId,
        request: RequestBuilder,
    ) -> Result<(), StoreError> {
        let response = self
            .authorized(request)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let touched: Vec<Row> = check_status(response).await?.json().await?;
        if touched.is_empty() {
            return Err(StoreError::NotFound {
                collection,
                id: id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for SupabaseStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn try_fetch_all(&self, collection: Collection) -> Result<Vec<Row>, StoreError> {
        let order = match collection {
            Collection::Favorites => "id.asc",
            Collection::FoodLogs | Collection::BathroomLogs => "timestamp.desc",
        };
        let response = self
            .authorized(self.client.get(self.table_url(collection)))
            .query(&[("select", "*"), ("order", order)])
            .send()
            .await?;
        let rows: Vec<Row> = check_status(response).await?.json().await?;
        debug!(%collection, rows = rows.len(), "fetched table");
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url(collection)))
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn update(&self, collection: Collection, id: &RecordId, mut row: Row) -> Result<(), StoreError> {
        row.remove("id");
        let request = self.client.patch(self.table_url(collection)).json(&row);
        self.write_one(collection, id, request).await
    }

    async fn delete(&self, collection: Collection, id: &RecordId) -> Result<(), StoreError> {
        let request = self.client.delete(self.table_url(collection));
        self.write_one(collection, id, request).await
    }

    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.delete(self.table_url(collection)))
            .query(&[("id", "not.is.null")])
            .send()
            .await?;
        check_status(response).await?;
        debug!(%collection, "cleared table");
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        backend: "supabase",
        status: status.as_u16(),
        body,
    })
}
