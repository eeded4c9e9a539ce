//! Composition root: wires the library crates together behind a handful of
//! subcommands. Out of scope per the design brief ("one-off CLI wiring");
//! kept intentionally thin — every real decision lives in the crates it
//! calls.

mod config;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use wessley_collectors::Collector;
use wessley_core::Context;
use wessley_domain::ScrapedDocument;
use wessley_ingest::{HttpEmbedder as IngestHttpEmbedder, InMemoryDedupGate, Pipeline, PipelineConfig};
use wessley_rag::{HttpChatClient, HttpEmbedder as RagHttpEmbedder, OrchestratorConfig, RetrievalOrchestrator};
use wessley_supervisor::{install_shutdown_handler, Supervisor, SupervisorConfig};

#[derive(Parser)]
#[command(name = "wessley", about = "Automotive repair RAG system")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the NATS-driven ingestion pipeline consumer until interrupted.
    ServeIngest,
    /// Runs the crawler supervisor over a file-drop directory until interrupted.
    Supervise,
    /// Collects local manuals into the file-drop directory for the supervisor to pick up.
    Crawl,
    /// Asks a one-shot question against the retrieval orchestrator.
    Ask {
        question: String,
        #[arg(long)]
        vehicle: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = config::AppConfig::from_env();

    match cli.command {
        Command::ServeIngest => serve_ingest(&config).await,
        Command::Supervise => supervise(&config).await,
        Command::Crawl => crawl(&config).await,
        Command::Ask { question, vehicle } => ask(&config, &question, vehicle.as_deref()).await,
    }
}

async fn build_pipeline(config: &config::AppConfig) -> anyhow::Result<Arc<Pipeline>> {
    let embedder = Arc::new(IngestHttpEmbedder::new(&config.embedder_url, &config.embed_model));
    let vector_store = Arc::new(wessley_vectorstore::QdrantVectorStore::connect(&config.qdrant_url, &config.qdrant_collection)?);
    let graph_store =
        Arc::new(wessley_graphstore::Neo4jGraphStore::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await?);
    let dedup = Arc::new(InMemoryDedupGate::new());
    Ok(Arc::new(Pipeline::new(embedder, vector_store, graph_store, dedup, PipelineConfig::default())))
}

async fn serve_ingest(config: &config::AppConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let client = async_nats::connect(&config.nats_url).await?;
    info!(url = %config.nats_url, "connected to message bus");
    wessley_ingest::run_consumer(client, pipeline, config.max_retries).await?;
    Ok(())
}

async fn supervise(config: &config::AppConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let ctx = Context::background();
    install_shutdown_handler(ctx.clone());
    let supervisor = Supervisor::new(SupervisorConfig::new(&config.drop_directory), pipeline);
    info!(directory = %config.drop_directory, "crawler supervisor starting");
    supervisor.run(&ctx).await?;
    Ok(())
}

async fn crawl(config: &config::AppConfig) -> anyhow::Result<()> {
    let collector = wessley_collectors::ManualsCollector::new(&config.manuals_directory);
    let ctx = Context::background();
    let documents: Vec<ScrapedDocument> = collector.fetch_all(&ctx).await?;

    tokio::fs::create_dir_all(&config.drop_directory).await?;
    let filename = format!("manuals-{}.json", documents.len());
    let path = std::path::Path::new(&config.drop_directory).join(filename);
    let mut lines = String::new();
    for doc in &documents {
        lines.push_str(&serde_json::to_string(doc)?);
        lines.push('\n');
    }
    tokio::fs::write(&path, lines).await?;
    info!(count = documents.len(), path = %path.display(), "wrote collected documents to the drop directory");
    Ok(())
}

async fn ask(config: &config::AppConfig, question: &str, vehicle: Option<&str>) -> anyhow::Result<()> {
    let embedder = Arc::new(RagHttpEmbedder::new(&config.embedder_url, &config.embed_model));
    let vector_store = Arc::new(wessley_vectorstore::QdrantVectorStore::connect(&config.qdrant_url, &config.qdrant_collection)?);
    let graph_store =
        Arc::new(wessley_graphstore::Neo4jGraphStore::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await?);
    let chat_client = Arc::new(HttpChatClient::new(&config.chat_url));

    let mut orchestrator_config = OrchestratorConfig::default();
    orchestrator_config.model = config.chat_model.clone();

    let orchestrator = RetrievalOrchestrator::new(embedder, vector_store, Some(graph_store), chat_client, orchestrator_config);
    let ctx = Context::background();
    let result = orchestrator.ask(&ctx, question, vehicle).await?;

    println!("{}", result.text);
    for source in &result.sources {
        println!("  - [{}] {} (score {:.3})", source.id, source.doc_id, source.score);
    }
    Ok(())
}
