use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledCheck {
    pub all_disabled: bool,
    pub query_type: Option<String>,
    #[serde(default)]
    pub queries: Vec<String>,
}

pub struct QueryServiceClient {
    client: Client,
    base_url: String,
}

impl QueryServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        decode(resp).await
    }

    /// Ask the service whether every sub-query of `composite_query` is disabled.
    /// `Value::Null` is accepted and always answers `false`.
    pub async fn is_all_disabled(&self, composite_query: &Value) -> Result<DisabledCheck, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/v1/queries/disabled"))
            .json(composite_query)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn list_rules(&self) -> Result<Vec<Value>, ClientError> {
        let resp = self.client.get(self.url("/api/v1/rules")).send().await?;
        decode(resp).await
    }

    pub async fn create_rule(&self, rule: &Value) -> Result<Value, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/v1/rules"))
            .json(rule)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn delete_rule(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.url(&format!("/api/v1/rules/{id}")))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check(resp).await?;
    Ok(resp.json::<T>().await?)
}
