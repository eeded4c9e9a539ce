//! Generic HTTP adapter consuming the embedder service's unary `embed` RPC
//! (§6): `embed(text) -> {values, dimensions}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wessley_core::{Error, Result};

use crate::embedder::Embedder;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    values: Vec<f32>,
    #[allow(dead_code)]
    dimensions: Option<u32>,
}

/// Calls a configured `POST {base_url}/embed` endpoint.
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
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest { text, model: &self.model };
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

        let decoded: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::TerminalIo(format!("decode embedder response from {url}: {e}")))?;
        Ok(decoded.values)
    }
}
