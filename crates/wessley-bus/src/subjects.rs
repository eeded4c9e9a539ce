//! Subject names used by the ingestion pipeline (§4.8, §4.10).

pub const INGEST: &str = "engine.ingest";
pub const INGEST_DLQ: &str = "engine.ingest.dlq";
