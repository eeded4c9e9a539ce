//! The external chat service contract the orchestrator's final step
//! consumes (§6, §4.9). The core only uses the unary form; a streaming
//! variant is out of scope.

use async_trait::async_trait;
use wessley_core::Result;

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub context_parts: Vec<String>,
    pub system_prompt: String,
    pub temperature: f64,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub tokens_used: u32,
    pub model: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply>;
}
