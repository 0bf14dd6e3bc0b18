use crate::config::Config;
use crate::error::ServiceError;
use crate::models::{ProcessQueriesResponse, Response};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Duration;

/// Backend answering natural-language questions about basketball data
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Ask a single question
    async fn ask(&self, query: &str) -> Result<Response, ServiceError>;

    /// Run the stored-query batch job
    async fn process_queries(&self) -> Result<ProcessQueriesResponse, ServiceError>;
}

/// HTTP client for the query service
#[derive(Clone)]
pub struct HttpQueryService {
    client: reqwest::Client,
    chat_url: String,
    process_url: String,
}

impl HttpQueryService {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
            process_url: config.process_url(),
        })
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, payload: &Value) -> Result<T, ServiceError> {
        let response = self.client.post(url).json(payload).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "Query service returned an error");
            return Err(ServiceError::Server {
                url: url.to_string(),
                status: status.as_u16(),
                message: server_message(&body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn ask(&self, query: &str) -> Result<Response, ServiceError> {
        tracing::debug!(query, url = %self.chat_url, "Sending query");
        self.post_json(&self.chat_url, &serde_json::json!({ "query": query }))
            .await
    }

    async fn process_queries(&self) -> Result<ProcessQueriesResponse, ServiceError> {
        tracing::debug!(url = %self.process_url, "Starting query processing");
        self.post_json(&self.process_url, &serde_json::json!({})).await
    }
}

/// Pull a human-readable message out of an error body: `message`, then `error.message`
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error")?.get("message")?.as_str())?;

    Some(message.to_string())
}
