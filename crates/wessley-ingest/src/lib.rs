//! Ingestion pipeline (C8, §4.8): validate → parse → chunk → embed →
//! persist, plus the NATS consumer that drives it with dead-letter
//! handling.

pub mod consumer;
pub mod dedup;
pub mod embedder;
mod http_embedder;
mod parse;
mod pipeline;
mod point_id;

pub use consumer::run_consumer;
pub use dedup::{DedupGate, InMemoryDedupGate};
pub use embedder::Embedder;
pub use http_embedder::HttpEmbedder;
pub use parse::parse_document;
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
pub use point_id::chunk_point_id;
