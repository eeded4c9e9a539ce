//! Qdrant-backed vector index adapter (C6, §4.6).

mod payload;
mod store;

pub use store::QdrantVectorStore;

use async_trait::async_trait;
use wessley_core::{Context, Result};
use wessley_domain::{SearchResult, VectorRecord};

/// The vector-index contract every adapter implements (§4.6).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent: creates the collection with cosine distance and `dims`
    /// dimensions if it does not already exist.
    async fn ensure_collection(&self, ctx: &Context, dims: u64) -> Result<()>;

    /// Removes the collection entirely.
    async fn delete_collection(&self, ctx: &Context) -> Result<()>;

    /// Idempotent upsert under each record's id. Empty input is a no-op.
    async fn upsert(&self, ctx: &Context, records: Vec<VectorRecord>) -> Result<()>;

    /// Removes every point whose payload `doc_id` matches.
    async fn delete_by_doc_id(&self, ctx: &Context, doc_id: &str) -> Result<()>;

    /// Cosine-similarity k-NN, unfiltered.
    async fn search(
        &self,
        ctx: &Context,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Cosine-similarity k-NN with a conjunctive exact-match payload filter.
    async fn search_filtered(
        &self,
        ctx: &Context,
        query_embedding: &[f32],
        top_k: usize,
        filter: std::collections::HashMap<String, String>,
    ) -> Result<Vec<SearchResult>>;
}
