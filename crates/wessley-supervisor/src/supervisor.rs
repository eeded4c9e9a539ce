//! Crawler supervisor (C11, §4.11): watches a file-drop directory on a
//! ticker, decodes dropped files into documents, enriches the ones missing
//! structured vehicle info, and feeds the ingestion pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use wessley_core::constants::{DEFAULT_SUPERVISOR_SCAN_INTERVAL, DEFAULT_SUPERVISOR_STATE_FILENAME};
use wessley_core::{Context, Error, Result};
use wessley_domain::best_vehicle_match;
use wessley_ingest::Pipeline;

use crate::decode::decode_file_documents;
use crate::state::{load_state, processed_key, save_state, ProcessedState};

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Directory scanned for dropped `*.json` files.
    pub directory: PathBuf,
    /// Where the `processed` state file lives. Defaults to
    /// `<directory>/processed.json` when built via [`SupervisorConfig::new`].
    pub state_path: PathBuf,
    pub scan_interval: Duration,
}

impl SupervisorConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let state_path = directory.join(DEFAULT_SUPERVISOR_STATE_FILENAME);
        SupervisorConfig { directory, state_path, scan_interval: DEFAULT_SUPERVISOR_SCAN_INTERVAL }
    }
}

pub struct Supervisor {
    config: SupervisorConfig,
    pipeline: Arc<Pipeline>,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, pipeline: Arc<Pipeline>) -> Self {
        Supervisor { config, pipeline }
    }

    /// Runs the scan loop until `ctx` is cancelled. Scans immediately, then
    /// every `scan_interval`; exits within one tick of cancellation.
    pub async fn run(&self, ctx: &Context) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.directory)
            .await
            .map_err(|e| Error::TerminalIo(format!("create output directory: {e}")))?;

        let mut state = load_state(&self.config.state_path).await;

        loop {
            if ctx.is_cancelled() {
                return Ok(());
            }
            self.scan_once(ctx, &mut state).await;
            if ctx.is_cancelled() {
                return Ok(());
            }
            tokio::select! {
                () = tokio::time::sleep(self.config.scan_interval) => {}
                () = ctx.cancelled() => return Ok(()),
            }
        }
    }

    async fn scan_once(&self, ctx: &Context, state: &mut ProcessedState) {
        let mut entries = match tokio::fs::read_dir(&self.config.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to list supervisor directory");
                return;
            }
        };

        let mut candidates = Vec::new();
        loop {
            let next = entries.next_entry().await;
            match next {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if is_candidate_file(&path) {
                        candidates.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "error walking supervisor directory");
                    break;
                }
            }
        }

        for path in candidates {
            if ctx.is_cancelled() {
                return;
            }
            self.maybe_process_file(ctx, &path, state).await;
        }
    }

    async fn maybe_process_file(&self, ctx: &Context, path: &std::path::Path, state: &mut ProcessedState) {
        let Ok(metadata) = tokio::fs::metadata(path).await else { return };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return };
        let key = processed_key(name, metadata.len());
        if state.contains_key(&key) {
            return;
        }

        match self.process_file(ctx, path).await {
            Ok(count) => {
                debug!(file = %path.display(), documents = count, "file processed");
                state.insert(key, true);
                if let Err(e) = save_state(&self.config.state_path, state).await {
                    warn!(error = %e, "failed to persist supervisor state");
                }
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "processing failed, leaving for next scan");
            }
        }
    }

    async fn process_file(&self, ctx: &Context, path: &std::path::Path) -> Result<usize> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::TerminalIo(format!("read {}: {e}", path.display())))?;

        let mut documents = decode_file_documents(&contents);
        for doc in &mut documents {
            if doc.metadata.vehicle_info.is_none() {
                let text = format!("{} {}", doc.title, doc.content);
                if let Some(m) = best_vehicle_match(&text) {
                    doc.metadata.vehicle_info = Some(wessley_domain::VehicleInfo {
                        make: Some(m.make),
                        model: m.model,
                        year: m.year,
                        trim: None,
                    });
                }
            }
        }

        let count = documents.len();
        for doc in documents {
            ctx.check()?;
            self.pipeline.process(ctx, doc).await?;
        }
        info!(file = %path.display(), documents = count, "ingested file");
        Ok(count)
    }
}

fn is_candidate_file(path: &std::path::Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return false };
    if name.starts_with('.') {
        return false;
    }
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use wessley_core::Result as CoreResult;
    use wessley_domain::{ComponentNode, Edge, ScrapedDocument, SearchResult, VehicleInfo};
    use wessley_graphstore::GraphStore;
    use wessley_ingest::{DedupGate, Embedder, InMemoryDedupGate, PipelineConfig};
    use wessley_vectorstore::VectorStore;

    struct FakeEmbedder;
    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> CoreResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[derive(Default)]
    struct FakeVectorStore {
        upserted: std::sync::Mutex<usize>,
    }
    #[async_trait]
    impl VectorStore for FakeVectorStore {
        async fn ensure_collection(&self, _ctx: &Context, _dims: u64) -> CoreResult<()> {
            Ok(())
        }
        async fn delete_collection(&self, _ctx: &Context) -> CoreResult<()> {
            Ok(())
        }
        async fn upsert(&self, _ctx: &Context, records: Vec<wessley_domain::VectorRecord>) -> CoreResult<()> {
            #[allow(clippy::unwrap_used)]
            {
                *self.upserted.lock().unwrap() += records.len();
            }
            Ok(())
        }
        async fn delete_by_doc_id(&self, _ctx: &Context, _doc_id: &str) -> CoreResult<()> {
            Ok(())
        }
        async fn search(&self, _ctx: &Context, _query: &[f32], _top_k: usize) -> CoreResult<Vec<SearchResult>> {
            Ok(vec![])
        }
        async fn search_filtered(
            &self,
            _ctx: &Context,
            _query: &[f32],
            _top_k: usize,
            _filter: HashMap<String, String>,
        ) -> CoreResult<Vec<SearchResult>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeGraphStore {
        saved: std::sync::Mutex<Vec<ComponentNode>>,
    }
    #[async_trait]
    impl GraphStore for FakeGraphStore {
        async fn save_component(&self, _ctx: &Context, component: &ComponentNode) -> CoreResult<()> {
            #[allow(clippy::unwrap_used)]
            self.saved.lock().unwrap().push(component.clone());
            Ok(())
        }
        async fn save_edge(&self, _ctx: &Context, _edge: &Edge) -> CoreResult<()> {
            Ok(())
        }
        async fn ensure_vehicle_hierarchy(&self, _ctx: &Context, _vehicle_info: &VehicleInfo) -> CoreResult<()> {
            Ok(())
        }
        async fn find_by_type(&self, _ctx: &Context, _node_type: &str) -> CoreResult<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn neighbors(&self, _ctx: &Context, _id: &str, _depth: u32) -> CoreResult<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn trace_path(&self, _ctx: &Context, _from_id: &str, _to_id: &str) -> CoreResult<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn save_batch(&self, _ctx: &Context, _components: &[ComponentNode], _edges: &[Edge]) -> CoreResult<()> {
            Ok(())
        }
    }

    fn build_pipeline() -> (Arc<Pipeline>, Arc<FakeVectorStore>, Arc<FakeGraphStore>) {
        let vector_store = Arc::new(FakeVectorStore::default());
        let graph_store = Arc::new(FakeGraphStore::default());
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(FakeEmbedder),
            vector_store.clone(),
            graph_store.clone(),
            Arc::new(InMemoryDedupGate::new()),
            PipelineConfig::default(),
        ));
        (pipeline, vector_store, graph_store)
    }

    #[tokio::test]
    async fn ingests_a_dropped_file_and_records_it_as_processed() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ScrapedDocument {
            source: "manuals".into(),
            source_id: "a".into(),
            title: "Brake pad replacement".into(),
            content: "My 2019 Honda Civic needs new brake pads up front.".into(),
            author: None,
            url: None,
            published_at: None,
            scraped_at: chrono::Utc::now(),
            metadata: Default::default(),
        };
        let line = serde_json::to_string(&doc).unwrap();
        tokio::fs::write(dir.path().join("batch.json"), format!("{line}\n")).await.unwrap();

        let (pipeline, vector_store, graph_store) = build_pipeline();
        let config = SupervisorConfig::new(dir.path());
        let supervisor = Supervisor::new(config.clone(), pipeline);
        let ctx = Context::background();

        let mut state = load_state(&config.state_path).await;
        supervisor.scan_once(&ctx, &mut state).await;

        assert_eq!(graph_store.saved.lock().unwrap().len(), 1);
        assert!(*vector_store.upserted.lock().unwrap() > 0);
        assert!(!state.is_empty());
    }

    #[tokio::test]
    async fn a_file_already_in_processed_state_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        tokio::fs::write(&path, "{}\n").await.unwrap();
        let metadata = tokio::fs::metadata(&path).await.unwrap();

        let (pipeline, _vector_store, graph_store) = build_pipeline();
        let config = SupervisorConfig::new(dir.path());
        let supervisor = Supervisor::new(config, pipeline);
        let ctx = Context::background();

        let mut state = ProcessedState::new();
        state.insert(processed_key("batch.json", metadata.len()), true);
        supervisor.scan_once(&ctx, &mut state).await;

        assert!(graph_store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hidden_and_non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join(".hidden.json");
        let non_json = dir.path().join("notes.txt");
        tokio::fs::write(&hidden, "{}").await.unwrap();
        tokio::fs::write(&non_json, "text").await.unwrap();
        assert!(!is_candidate_file(&hidden));
        assert!(!is_candidate_file(&non_json));
    }
}
