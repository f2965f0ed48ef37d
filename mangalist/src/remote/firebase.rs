//! Firebase Realtime Database collection
//!
//! Talks to the REST API:
//! - `GET    {base}/{collection}.json`                   fetch all
//! - `PUT    {base}/{collection}/{id}/{field}.json`      write one field
//! - `POST   {base}/{collection}.json`                   create, returns `{"name": id}`
//! - `DELETE {base}/{collection}/{id}.json`              delete
//! - `GET    {base}/{collection}.json?orderBy=..&equalTo=..` query

use super::CollectionClient;
use crate::database::{MangaDocument, MangaField, RawCollection};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Response body of a Firebase push
#[derive(Deserialize, Debug)]
struct PushResponse {
    name: String,
}

/// Collection stored in a Firebase Realtime Database
#[derive(Clone)]
pub struct FirebaseCollection {
    client: Client,
    base_url: String,
    collection: String,
    auth_token: Option<String>,
}

impl FirebaseCollection {
    pub fn new(
        base_url: &str,
        collection: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mangalist/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.trim_matches('/').to_string(),
            auth_token,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}.json", self.base_url, self.collection)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, self.collection, id)
    }

    fn field_url(&self, id: &str, field: MangaField) -> String {
        format!("{}/{}/{}/{}.json", self.base_url, self.collection, id, field)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    /// Send and map non-success statuses to `AppError::Remote`
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Remote store returned status: {}", status);
            return Err(AppError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Parse a collection body; `null` is an empty collection and entries that
/// are not manga documents are skipped.
pub(crate) fn parse_collection(body: Value) -> Result<RawCollection> {
    let entries: Option<BTreeMap<String, Value>> = serde_json::from_value(body)?;

    let mut collection = RawCollection::new();
    for (id, raw) in entries.unwrap_or_default() {
        if !raw.is_object() {
            tracing::warn!("Skipping malformed record {}: not an object", id);
            continue;
        }
        match serde_json::from_value::<MangaDocument>(raw) {
            Ok(doc) => {
                collection.insert(id, doc);
            }
            Err(e) => tracing::warn!("Skipping malformed record {}: {}", id, e),
        }
    }
    Ok(collection)
}

#[async_trait]
impl CollectionClient for FirebaseCollection {
    async fn fetch_all(&self) -> Result<RawCollection> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        let body: Value = response.json().await?;
        parse_collection(body)
    }

    async fn write_field(&self, id: &str, field: MangaField, value: Value) -> Result<()> {
        self.send(self.client.put(self.field_url(id, field)).json(&value))
            .await?;

        tracing::debug!("Wrote {} on manga: {}", field, id);
        Ok(())
    }

    async fn write_record(&self, record: &MangaDocument) -> Result<String> {
        let response = self
            .send(self.client.post(self.collection_url()).json(record))
            .await?;
        let pushed: PushResponse = response.json().await?;

        tracing::debug!("Pushed manga: {}", pushed.name);
        Ok(pushed.name)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.record_url(id))).await?;

        tracing::debug!("Deleted manga: {}", id);
        Ok(())
    }

    async fn query_by_field(&self, field: MangaField, value: &Value) -> Result<RawCollection> {
        // Firebase expects JSON-encoded query parameters
        let order_by = serde_json::to_string(field.as_str())?;
        let equal_to = serde_json::to_string(value)?;

        let response = self
            .send(
                self.client
                    .get(self.collection_url())
                    .query(&[("orderBy", order_by), ("equalTo", equal_to)]),
            )
            .await?;
        let body: Value = response.json().await?;
        parse_collection(body)
    }
}
