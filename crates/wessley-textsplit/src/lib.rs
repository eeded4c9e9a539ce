//! Sentence splitting and word-budget chunking (C8's Parse/Chunk stages,
//! §4.8).

pub mod chunker;
pub mod sentence;

pub use chunker::{chunk_document, chunk_document_default};
pub use sentence::split_sentences;
