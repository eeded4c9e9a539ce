//! `Validate ∘ Parse ∘ Chunk ∘ Embed ∘ Persist`, composed from the C1
//! stage combinators with a dedup gate in front and a tap-style logger
//! wrapping each stage (§4.8).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use wessley_core::{
    constants::{DEFAULT_CHUNK_OVERLAP_WORDS, DEFAULT_CHUNK_SIZE_WORDS, DEFAULT_EMBED_BATCH_SIZE},
    BatchStage, Context, Error, Result, Stage, Tap, Then,
};
use wessley_domain::{
    validate_scraped_document, Chunk, ComponentNode, EmbeddedChunk, ParsedDocument, PayloadValue,
    ScrapedDocument, VectorRecord,
};
use wessley_graphstore::GraphStore;
use wessley_vectorstore::VectorStore;

use crate::dedup::DedupGate;
use crate::embedder::Embedder;
use crate::parse::parse_document;
use crate::point_id::chunk_point_id;

/// Outcome of running a single document through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Processed,
    Skipped,
}

/// Tunable pipeline parameters; all default to the spec's constants.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub chunk_size: i64,
    pub overlap: i64,
    pub embed_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            chunk_size: DEFAULT_CHUNK_SIZE_WORDS as i64,
            overlap: DEFAULT_CHUNK_OVERLAP_WORDS as i64,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    graph_store: Arc<dyn GraphStore>,
    dedup: Arc<dyn DedupGate>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
        dedup: Arc<dyn DedupGate>,
        config: PipelineConfig,
    ) -> Self {
        Pipeline { embedder, vector_store, graph_store, dedup, config }
    }

    /// Runs the full dedup-gated pipeline over one document.
    pub async fn process(&self, ctx: &Context, doc: ScrapedDocument) -> Result<PipelineOutcome> {
        let doc_id = doc.doc_id();
        if self.dedup.contains(&doc_id).await {
            debug!(doc_id, "document already ingested, skipping");
            return Ok(PipelineOutcome::Skipped);
        }

        let embedder = self.embedder.clone();
        let vector_store = self.vector_store.clone();
        let graph_store = self.graph_store.clone();
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.overlap;
        let embed_batch_size = self.config.embed_batch_size.max(1);

        let validate_stage = |_ctx: Context, doc: ScrapedDocument| async move {
            validate_scraped_document(&doc)?;
            Ok(doc)
        };
        let validate_tap = Tap::new(|_ctx: &Context, doc: &ScrapedDocument| {
            debug!(doc_id = %doc.doc_id(), "validated");
        });

        let parse_stage = |_ctx: Context, doc: ScrapedDocument| async move { Ok(parse_document(doc)) };
        let parse_tap = Tap::new(|_ctx: &Context, parsed: &ParsedDocument| {
            debug!(doc_id = %parsed.doc_id, sentences = parsed.sentences.len(), "parsed");
        });

        let chunk_stage = move |_ctx: Context, parsed: ParsedDocument| async move {
            let chunks = wessley_textsplit::chunk_document(&parsed.doc_id, &parsed.doc.content, chunk_size, overlap);
            Ok((parsed, chunks))
        };
        let chunk_tap = Tap::new(|_ctx: &Context, (parsed, chunks): &(ParsedDocument, Vec<Chunk>)| {
            debug!(doc_id = %parsed.doc_id, chunks = chunks.len(), "chunked");
        });

        let embed_stage = move |ctx: Context, (parsed, chunks): (ParsedDocument, Vec<Chunk>)| {
            let embedder = embedder.clone();
            async move {
                let batch_embedder = embedder.clone();
                let batch = BatchStage::new(embed_batch_size, move |_ctx: Context, batch_chunks: Vec<Chunk>| {
                    let embedder = batch_embedder.clone();
                    async move {
                        let texts: Vec<String> = batch_chunks.iter().map(|c| c.text.clone()).collect();
                        let vectors = embedder
                            .embed_batch(texts)
                            .await
                            .map_err(|e| Error::Pipeline(format!("embed batch: {e}")))?;
                        if vectors.len() != batch_chunks.len() {
                            return Err(Error::Pipeline(format!(
                                "embed batch: expected {} vectors, got {}",
                                batch_chunks.len(),
                                vectors.len()
                            )));
                        }
                        Ok(batch_chunks
                            .into_iter()
                            .zip(vectors)
                            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
                            .collect::<Vec<_>>())
                    }
                });
                let embedded = batch.call(ctx, chunks).await?;
                Ok((parsed, embedded))
            }
        };
        let embed_tap = Tap::new(|_ctx: &Context, (parsed, embedded): &(ParsedDocument, Vec<EmbeddedChunk>)| {
            debug!(doc_id = %parsed.doc_id, embedded = embedded.len(), "embedded");
        });

        let persist_stage = move |ctx: Context, (parsed, embedded): (ParsedDocument, Vec<EmbeddedChunk>)| {
            let vector_store = vector_store.clone();
            let graph_store = graph_store.clone();
            async move { persist(&ctx, &*vector_store, &*graph_store, parsed, embedded).await }
        };

        let stage = Then::new(
            Then::new(
                Then::new(
                    Then::new(Then::new(validate_stage, validate_tap), Then::new(parse_stage, parse_tap)),
                    Then::new(chunk_stage, chunk_tap),
                ),
                Then::new(embed_stage, embed_tap),
            ),
            persist_stage,
        );

        stage.call(ctx.clone(), doc).await?;
        self.dedup.insert(&doc_id).await;
        Ok(PipelineOutcome::Processed)
    }
}

async fn persist(
    ctx: &Context,
    vector_store: &dyn VectorStore,
    graph_store: &dyn GraphStore,
    parsed: ParsedDocument,
    embedded: Vec<EmbeddedChunk>,
) -> Result<()> {
    let doc_id = parsed.doc_id.clone();
    let vehicle = parsed.attributes.get("vehicle").cloned();

    let node = ComponentNode {
        id: doc_id.clone(),
        name: parsed.doc.title.clone(),
        node_type: "document".to_string(),
        vehicle: vehicle.clone(),
        properties: HashMap::from([("source".to_string(), parsed.doc.source.clone())]),
    };
    graph_store.save_component(ctx, &node).await?;

    if let Some(vehicle_info) = &parsed.doc.metadata.vehicle_info {
        if let Err(e) = graph_store.ensure_vehicle_hierarchy(ctx, vehicle_info).await {
            warn!(doc_id = %doc_id, error = %e, "vehicle hierarchy upsert failed, continuing");
        }
    }

    let records = embedded
        .into_iter()
        .enumerate()
        .map(|(i, ec)| build_vector_record(&doc_id, &parsed.doc.source, vehicle.as_deref(), &parsed.doc.metadata.vehicle_info, i, ec))
        .collect::<Vec<_>>();

    vector_store.upsert(ctx, records).await
}

fn build_vector_record(
    doc_id: &str,
    source: &str,
    vehicle: Option<&str>,
    vehicle_info: &Option<wessley_domain::VehicleInfo>,
    index: usize,
    embedded_chunk: EmbeddedChunk,
) -> VectorRecord {
    let mut payload: HashMap<String, PayloadValue> = HashMap::new();
    payload.insert("content".into(), embedded_chunk.chunk.text.clone().into());
    payload.insert("doc_id".into(), doc_id.to_string().into());
    payload.insert("source".into(), source.to_string().into());
    payload.insert("chunk_index".into(), (index as i64).into());
    if let Some(vehicle) = vehicle {
        payload.insert("vehicle".into(), vehicle.to_string().into());
    }
    if let Some(vi) = vehicle_info {
        if let Some(make) = &vi.make {
            payload.insert("vehicle_make".into(), make.clone().into());
        }
        if let Some(model) = &vi.model {
            payload.insert("vehicle_model".into(), model.clone().into());
        }
        if let Some(year) = vi.year {
            payload.insert("vehicle_year".into(), (year as i64).into());
        }
        if let Some(trim) = &vi.trim {
            payload.insert("vehicle_trim".into(), trim.clone().into());
        }
    }

    VectorRecord {
        id: chunk_point_id(doc_id, index),
        embedding: embedded_chunk.embedding,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use wessley_domain::{DocumentMetadata, SearchResult, VehicleInfo};

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[derive(Default)]
    struct FakeVectorStore {
        upserted: Mutex<Vec<VectorRecord>>,
    }

    #[async_trait]
    impl VectorStore for FakeVectorStore {
        async fn ensure_collection(&self, _ctx: &Context, _dims: u64) -> Result<()> {
            Ok(())
        }
        async fn delete_collection(&self, _ctx: &Context) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _ctx: &Context, records: Vec<VectorRecord>) -> Result<()> {
            #[allow(clippy::unwrap_used)]
            self.upserted.lock().unwrap().extend(records);
            Ok(())
        }
        async fn delete_by_doc_id(&self, _ctx: &Context, _doc_id: &str) -> Result<()> {
            Ok(())
        }
        async fn search(&self, _ctx: &Context, _query: &[f32], _top_k: usize) -> Result<Vec<SearchResult>> {
            Ok(vec![])
        }
        async fn search_filtered(
            &self,
            _ctx: &Context,
            _query: &[f32],
            _top_k: usize,
            _filter: HashMap<String, String>,
        ) -> Result<Vec<SearchResult>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeGraphStore {
        saved: Mutex<Vec<ComponentNode>>,
    }

    #[async_trait]
    impl GraphStore for FakeGraphStore {
        async fn save_component(&self, _ctx: &Context, component: &ComponentNode) -> Result<()> {
            #[allow(clippy::unwrap_used)]
            self.saved.lock().unwrap().push(component.clone());
            Ok(())
        }
        async fn save_edge(&self, _ctx: &Context, _edge: &wessley_domain::Edge) -> Result<()> {
            Ok(())
        }
        async fn ensure_vehicle_hierarchy(&self, _ctx: &Context, _vehicle_info: &VehicleInfo) -> Result<()> {
            Ok(())
        }
        async fn find_by_type(&self, _ctx: &Context, _node_type: &str) -> Result<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn neighbors(&self, _ctx: &Context, _id: &str, _depth: u32) -> Result<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn trace_path(&self, _ctx: &Context, _from_id: &str, _to_id: &str) -> Result<Vec<ComponentNode>> {
            Ok(vec![])
        }
        async fn save_batch(&self, _ctx: &Context, _components: &[ComponentNode], _edges: &[wessley_domain::Edge]) -> Result<()> {
            Ok(())
        }
    }

    fn sample_doc() -> ScrapedDocument {
        ScrapedDocument {
            source: "reddit:cars".into(),
            source_id: "abc".into(),
            title: "Clicking noise".into(),
            content: "The car makes a clicking noise on cold start. It stops once warmed up.".into(),
            author: None,
            url: None,
            published_at: None,
            scraped_at: Utc::now(),
            metadata: DocumentMetadata::default(),
        }
    }

    #[tokio::test]
    async fn processes_a_fresh_document_end_to_end() {
        let vector_store = Arc::new(FakeVectorStore::default());
        let graph_store = Arc::new(FakeGraphStore::default());
        let pipeline = Pipeline::new(
            Arc::new(FakeEmbedder),
            vector_store.clone(),
            graph_store.clone(),
            Arc::new(crate::dedup::InMemoryDedupGate::new()),
            PipelineConfig::default(),
        );

        let ctx = Context::background();
        let outcome = pipeline.process(&ctx, sample_doc()).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Processed);

        #[allow(clippy::unwrap_used)]
        let saved = graph_store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "reddit:cars:abc");

        #[allow(clippy::unwrap_used)]
        let upserted = vector_store.upserted.lock().unwrap();
        assert!(!upserted.is_empty());
    }

    #[tokio::test]
    async fn skips_a_document_already_seen_by_the_dedup_gate() {
        let dedup = Arc::new(crate::dedup::InMemoryDedupGate::new());
        dedup.insert("reddit:cars:abc").await;
        let pipeline = Pipeline::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeVectorStore::default()),
            Arc::new(FakeGraphStore::default()),
            dedup,
            PipelineConfig::default(),
        );

        let ctx = Context::background();
        let outcome = pipeline.process(&ctx, sample_doc()).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Skipped);
    }

    #[tokio::test]
    async fn rejects_a_document_that_fails_validation() {
        let pipeline = Pipeline::new(
            Arc::new(FakeEmbedder),
            Arc::new(FakeVectorStore::default()),
            Arc::new(FakeGraphStore::default()),
            Arc::new(crate::dedup::InMemoryDedupGate::new()),
            PipelineConfig::default(),
        );
        let mut doc = sample_doc();
        doc.content = String::new();

        let ctx = Context::background();
        let result = pipeline.process(&ctx, doc).await;
        assert!(result.is_err());
    }
}
