use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::ChatError;
use crate::models::response::{classify, ChatResponse};
use crate::models::result::QueryResult;

use super::{BackendClient, ChunkStream};

/// reqwest-backed implementation of the backend contract.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct VisualizationReply {
    #[serde(default)]
    visualization_html: Option<String>,
}

impl HttpBackendClient {
    pub fn new(config: &Config) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChatError::NetworkFailure(e.to_string()))?;
        Ok(Self::from_parts(client, &config.backend_url))
    }

    pub fn from_parts(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn submit_query(&self, question: &str) -> Result<ChatResponse, ChatError> {
        info!("submitting question to {}", self.url("/query"));
        let response = self
            .client
            .post(self.url("/query"))
            .json(&json!({ "question": question }))
            .send()
            .await
            .map_err(|e| ChatError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::HttpStatusFailure(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ChatError::MalformedPayload(e.to_string()))?;
        classify(body)
    }

    async fn generate_visualization(&self, results: &QueryResult) -> Result<String, ChatError> {
        info!(
            "requesting visualization for {} rows",
            results.len()
        );
        let response = self
            .client
            .post(self.url("/generate-visualization"))
            .json(&json!({ "results": results }))
            .send()
            .await
            .map_err(|e| ChatError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::HttpStatusFailure(status.as_u16()));
        }

        let reply: VisualizationReply = response
            .json()
            .await
            .map_err(|e| ChatError::MalformedPayload(e.to_string()))?;
        reply
            .visualization_html
            .ok_or_else(|| ChatError::MalformedPayload("reply missing visualization_html".into()))
    }

    async fn open_chat_stream(&self, message: &str) -> Result<ChunkStream, ChatError> {
        debug!("opening chat stream at {}", self.url("/api/chat"));
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| ChatError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // short-circuit, never read a failed response as a stream
            return Err(ChatError::HttpStatusFailure(status.as_u16()));
        }

        let chunks = response.bytes_stream().map(|item| {
            item.map(|bytes| bytes.to_vec())
                .map_err(|e| ChatError::StreamReadFailure(e.to_string()))
        });
        Ok(Box::pin(chunks))
    }
}
