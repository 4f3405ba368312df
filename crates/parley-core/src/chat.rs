//! Chat endpoint client
//!
//! Opens the streamed response for a query. Record parsing is left to
//! [`crate::framing`]; this module only moves bytes.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use parley_common::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Raw response body, chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Body sent to the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub query: String,
}

/// Something that answers a query with a streamed body
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send `query` and return the response body once a success status is seen
    async fn open_stream(&self, query: &str) -> Result<ByteStream>;
}

/// Chat client backed by the remote `/chat` endpoint
pub struct HttpChatClient {
    client: reqwest::Client,
    url: String,
}

impl HttpChatClient {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::with_client(build_http_client(timeout)?, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim().to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn open_stream(&self, query: &str) -> Result<ByteStream> {
        let request = ChatRequest {
            query: query.to_string(),
        };

        debug!("POST {} ({} chars)", self.url, query.chars().count());
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::HttpStatus {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        info!("Chat stream opened: {}", status);
        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ParleyError::Stream(e.to_string()))
            })
            .boxed();
        Ok(stream)
    }
}

/// Shared reqwest client construction; `timeout` bounds each whole request
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ParleyError::Config(format!("failed to build HTTP client: {}", e)))
}
