//! JSON-over-HTTP document store client.
//!
//! `PATCH {base}/v1/documents/{path}` shallow-merges a JSON object into a
//! document, and a `null` field removes it; `GET {base}/v1/documents/{collection}` returns
//! `{"documents": [...]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteSyncFailure;
use crate::sync::remote::{CollectionPath, DocumentPath, Fields, RemoteDocumentStore};

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Value>,
}

pub struct RestDocumentStore {
    config: RemoteConfig,
    client: Client,
}

impl RestDocumentStore {
    pub fn new(config: RemoteConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|err| anyhow::anyhow!("invalid API key header: {err}"))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    fn transport_failure(&self, err: reqwest::Error) -> RemoteSyncFailure {
        if err.is_timeout() {
            RemoteSyncFailure::Timeout(Duration::from_secs(self.config.timeout_secs))
        } else if err.is_decode() {
            RemoteSyncFailure::Decode(err.to_string())
        } else {
            RemoteSyncFailure::Unavailable(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteSyncFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteSyncFailure::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteDocumentStore for RestDocumentStore {
    async fn upsert_merge(
        &self,
        path: &DocumentPath,
        fields: Fields,
    ) -> Result<(), RemoteSyncFailure> {
        let response = self
            .client
            .patch(self.url(&path.to_string()))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&Value::Object(fields))
            .send()
            .await
            .map_err(|err| self.transport_failure(err))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Value>, RemoteSyncFailure> {
        let response = self
            .client
            .get(self.url(&collection.to_string()))
            .send()
            .await
            .map_err(|err| self.transport_failure(err))?;

        // An owner with no documents yet is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body: ListDocumentsResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| RemoteSyncFailure::Decode(err.to_string()))?;
        Ok(body.documents)
    }
}
