//! Retrieval orchestrator (C9, §4.9): embed → filtered vector search →
//! optional graph enrichment → prompt assembly → chat call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use wessley_core::constants::{
    DEFAULT_CHAT_TEMPERATURE, DEFAULT_MAX_TOKENS, DEFAULT_SEARCH_TIMEOUT, DEFAULT_TOP_K,
};
use wessley_core::{Context, Error, Result};
use wessley_domain::validate_query;
use wessley_graphstore::GraphStore;
use wessley_vectorstore::VectorStore;

use crate::chat::{ChatClient, ChatRequest};
use crate::embedder::Embedder;
use crate::keywords::extract_keywords;

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an automotive repair assistant. Answer using only the provided context. \
     If the context does not contain the answer, say so.";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub top_k: usize,
    pub search_timeout: Duration,
    pub system_prompt: String,
    pub temperature: f64,
    pub model: String,
    pub max_tokens: u32,
    pub graph_enrichment_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            top_k: DEFAULT_TOP_K,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: DEFAULT_CHAT_TEMPERATURE,
            model: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            graph_enrichment_enabled: true,
        }
    }
}

/// A retrieved chunk, returned alongside the answer for citation (§4.9).
#[derive(Debug, Clone)]
pub struct Source {
    pub id: String,
    pub content: String,
    pub doc_id: String,
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub text: String,
    pub sources: Vec<Source>,
    pub tokens_used: u32,
    pub model: String,
}

pub struct RetrievalOrchestrator {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    graph_store: Option<Arc<dyn GraphStore>>,
    chat_client: Arc<dyn ChatClient>,
    config: OrchestratorConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Option<Arc<dyn GraphStore>>,
        chat_client: Arc<dyn ChatClient>,
        config: OrchestratorConfig,
    ) -> Self {
        RetrievalOrchestrator { embedder, vector_store, graph_store, chat_client, config }
    }

    pub async fn ask(&self, ctx: &Context, question: &str, vehicle: Option<&str>) -> Result<AnswerResult> {
        validate_query(question, None)?;

        let embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| Error::Other(format!("rag: embed query: {e}")))?;

        let search_ctx = ctx.with_timeout(self.config.search_timeout);
        let hits = match vehicle.filter(|v| !v.is_empty()) {
            Some(vehicle) => {
                let filter = HashMap::from([("vehicle".to_string(), vehicle.to_string())]);
                self.vector_store
                    .search_filtered(&search_ctx, &embedding, self.config.top_k, filter)
                    .await
            }
            None => self.vector_store.search(&search_ctx, &embedding, self.config.top_k).await,
        }
        .map_err(|e| Error::Other(format!("rag: semantic search: {e}")))?;

        let mut context_parts: Vec<String> = hits
            .iter()
            .map(|hit| format!("[{}] (source: {}, score: {:.3})\n{}", hit.id, hit.source, hit.score, hit.content))
            .collect();

        if self.config.graph_enrichment_enabled {
            if let Some(graph_store) = &self.graph_store {
                match build_graph_block(ctx, question, graph_store.as_ref()).await {
                    Ok(Some(block)) => context_parts.push(block),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "graph enrichment failed, continuing without it"),
                }
            }
        }

        let request = ChatRequest {
            message: question.to_string(),
            context_parts,
            system_prompt: self.config.system_prompt.clone(),
            temperature: self.config.temperature,
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
        };
        let reply = self
            .chat_client
            .chat(request)
            .await
            .map_err(|e| Error::Other(format!("rag: chat: {e}")))?;

        let sources = hits
            .into_iter()
            .map(|hit| Source { id: hit.id, content: hit.content, doc_id: hit.doc_id, source: hit.source, score: hit.score })
            .collect();

        Ok(AnswerResult { text: reply.reply, sources, tokens_used: reply.tokens_used, model: reply.model })
    }
}

/// Keyword-driven graph lookup. The adapter's only generic query is
/// type-keyed (`find_by_type`), so a keyword is matched against
/// `node_type` directly; `neighbors` doesn't surface edge type, so
/// neighbours are rendered with the same component line format rather
/// than the spec's distinct edge-arrow format.
async fn build_graph_block(ctx: &Context, question: &str, graph_store: &dyn GraphStore) -> Result<Option<String>> {
    let keywords = extract_keywords(question);
    let mut seen_ids = HashSet::new();
    let mut lines = Vec::new();

    for keyword in &keywords {
        let components = graph_store.find_by_type(ctx, keyword).await?;
        for component in components {
            if seen_ids.insert(component.id.clone()) {
                lines.push(format!("- {} ({}): {}", component.name, component.node_type, component.id));
            }
            let neighbors = graph_store.neighbors(ctx, &component.id, 1).await?;
            for neighbor in neighbors {
                if seen_ids.insert(neighbor.id.clone()) {
                    lines.push(format!("- {} ({}): {}", neighbor.name, neighbor.node_type, neighbor.id));
                }
            }
        }
    }

    if lines.is_empty() {
        Ok(None)
    } else {
        Ok(Some(lines.join("\n")))
    }
}
