//! Generic HTTP adapter consuming the chat service's unary RPC (§6):
//! `chat(message, context, system_prompt, temperature, model, max_tokens)
//! -> {reply, tokens_used, model}`. The streaming variant is out of scope;
//! the core only uses this unary form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wessley_core::{Error, Result};

use crate::chat::{ChatClient, ChatReply, ChatRequest};

#[derive(Debug, Serialize)]
struct ChatWireRequest<'a> {
    message: &'a str,
    context: &'a [String],
    system_prompt: &'a str,
    temperature: f64,
    model: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatWireResponse {
    reply: String,
    tokens_used: u32,
    model: String,
}

/// Calls a configured `POST {base_url}/chat` endpoint.
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpChatClient { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let url = format!("{}/chat", self.base_url);
        let wire = ChatWireRequest {
            message: &request.message,
            context: &request.context_parts,
            system_prompt: &request.system_prompt,
            temperature: request.temperature,
            model: &request.model,
            max_tokens: request.max_tokens,
        };
        let response = self
            .client
            .post(&url)
            .json(&wire)
            .send()
            .await
            .map_err(|e| Error::TransientIo(format!("chat request to {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::TerminalIo(format!("chat service returned {} from {url}", response.status())));
        }

        let decoded: ChatWireResponse = response
            .json()
            .await
            .map_err(|e| Error::TerminalIo(format!("decode chat response from {url}: {e}")))?;
        Ok(ChatReply { reply: decoded.reply, tokens_used: decoded.tokens_used, model: decoded.model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_the_request_and_decodes_the_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "Torque the lug nuts to spec.",
                "tokens_used": 17,
                "model": "test-model"
            })))
            .mount(&server)
            .await;

        let client = HttpChatClient::new(server.uri());
        let request = ChatRequest {
            message: "how do I change a tire?".into(),
            context_parts: vec!["[p1] jack up the car".into()],
            system_prompt: "be helpful".into(),
            temperature: 0.3,
            model: "test-model".into(),
            max_tokens: 512,
        };
        let reply = client.chat(request).await.unwrap();
        assert_eq!(reply.reply, "Torque the lug nuts to spec.");
        assert_eq!(reply.tokens_used, 17);
    }
}
