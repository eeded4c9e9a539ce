//! Retrieval orchestrator (C9, §4.9): embed-query → filtered vector
//! search → graph enrichment → LLM call.

pub mod chat;
pub mod embedder;
mod http_chat;
mod http_embedder;
mod keywords;
mod orchestrator;

pub use chat::{ChatClient, ChatReply, ChatRequest};
pub use embedder::Embedder;
pub use http_chat::HttpChatClient;
pub use http_embedder::HttpEmbedder;
pub use keywords::extract_keywords;
pub use orchestrator::{AnswerResult, OrchestratorConfig, RetrievalOrchestrator, Source};
