//! Generic HTTP adapter consuming the embedder service's `embed_batch` RPC
//! (§6): `embed_batch(texts) -> {embeddings: {values, dimensions}[]}`,
//! order-preserving. The service itself is an external collaborator; this
//! is only the consuming side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wessley_core::{Error, Result};

use crate::embedder::Embedder;

#[derive(Debug, Serialize)]
struct EmbedBatchRequest<'a> {
    texts: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedBatchResponse {
    embeddings: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    values: Vec<f32>,
    #[allow(dead_code)]
    dimensions: Option<u32>,
}

/// Calls a configured `POST {base_url}/embed_batch` endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        HttpEmbedder { client: reqwest::Client::new(), base_url: base_url.into(), model: model.into() }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed_batch", self.base_url);
        let request = EmbedBatchRequest { texts: &texts, model: &self.model };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::TransientIo(format!("embedder request to {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::TerminalIo(format!("embedder returned {} from {url}", response.status())));
        }

        let decoded: EmbedBatchResponse = response
            .json()
            .await
            .map_err(|e| Error::TerminalIo(format!("decode embedder response from {url}: {e}")))?;

        Ok(decoded.embeddings.into_iter().map(|e| e.values).collect())
    }
}
