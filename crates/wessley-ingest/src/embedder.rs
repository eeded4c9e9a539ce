//! The external embedder contract the pipeline's Embed stage consumes (§6).

use async_trait::async_trait;
use wessley_core::Result;

/// Order-preserving batch embedding. `embed_batch(texts).len() ==
/// texts.len()` is a caller-enforced invariant, not one this trait checks.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(vec![text.to_string()]).await?;
        Ok(vectors.pop().unwrap_or_default())
    }
}
