//! The external embedder contract the orchestrator's query-embed step
//! consumes (§6, §4.9).

use async_trait::async_trait;
use wessley_core::Result;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
