//! Centralised defaults referenced across crates, following this workspace's
//! convention of a single `constants` module rather than scattering magic
//! numbers through call sites.

use std::time::Duration;

/// Per-collector HTTP client timeout (§4.4).
pub const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chunker defaults (§4.8).
pub const DEFAULT_CHUNK_SIZE_WORDS: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP_WORDS: usize = 50;

/// Ingestion pipeline defaults.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retrieval orchestrator defaults (§4.9).
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CHAT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Vehicle validation range (§4.3).
pub const MIN_SUPPORTED_YEAR: i32 = 1980;
pub const MAX_SUPPORTED_YEAR: i32 = 2027;

/// Vehicle NLP year range (§4.5) — intentionally wider than the validator's
/// supported range, since free text may mention years the catalogue
/// doesn't validate purchases for.
pub const NLP_MIN_YEAR: i32 = 1980;
pub const NLP_MAX_YEAR: i32 = 2030;

/// Crawler supervisor defaults (§4.11).
pub const DEFAULT_SUPERVISOR_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_SUPERVISOR_STATE_FILENAME: &str = "processed.json";
