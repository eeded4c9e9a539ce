//! Environment-driven configuration for the composition root. Each field
//! has a sane local-dev default so the binary runs against docker-compose
//! service names out of the box.

use tracing::warn;

const EMBEDDER_URL: &str = "WESSLEY_EMBEDDER_URL";
const EMBED_MODEL: &str = "WESSLEY_EMBED_MODEL";
const QDRANT_URL: &str = "WESSLEY_QDRANT_URL";
const QDRANT_COLLECTION: &str = "WESSLEY_QDRANT_COLLECTION";
const NEO4J_URI: &str = "WESSLEY_NEO4J_URI";
const NEO4J_USER: &str = "WESSLEY_NEO4J_USER";
const NEO4J_PASSWORD: &str = "WESSLEY_NEO4J_PASSWORD";
const NATS_URL: &str = "WESSLEY_NATS_URL";
const MAX_RETRIES: &str = "WESSLEY_MAX_RETRIES";
const DROP_DIRECTORY: &str = "WESSLEY_DROP_DIRECTORY";
const MANUALS_DIRECTORY: &str = "WESSLEY_MANUALS_DIRECTORY";
const CHAT_URL: &str = "WESSLEY_CHAT_URL";
const CHAT_MODEL: &str = "WESSLEY_CHAT_MODEL";

/// Reads a string env var, falling back to `default` when unset.
fn env_string_or_default(var_name: &str, default: &str) -> String {
    std::env::var(var_name).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses an env var, warning and falling back to `default` when
/// unset or unparsable.
fn env_parse_or_default<T: std::str::FromStr>(var_name: &str, default: T) -> T {
    match std::env::var(var_name) {
        Err(_) => default,
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!(var = var_name, value, "invalid value, using default");
            default
        }),
    }
}

pub struct AppConfig {
    pub embedder_url: String,
    pub embed_model: String,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub nats_url: String,
    pub max_retries: u32,
    pub drop_directory: String,
    pub manuals_directory: String,
    pub chat_url: String,
    pub chat_model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            embedder_url: env_string_or_default(EMBEDDER_URL, "http://localhost:8081"),
            embed_model: env_string_or_default(EMBED_MODEL, "default"),
            qdrant_url: env_string_or_default(QDRANT_URL, "http://localhost:6334"),
            qdrant_collection: env_string_or_default(QDRANT_COLLECTION, "wessley_documents"),
            neo4j_uri: env_string_or_default(NEO4J_URI, "bolt://localhost:7687"),
            neo4j_user: env_string_or_default(NEO4J_USER, "neo4j"),
            neo4j_password: env_string_or_default(NEO4J_PASSWORD, "neo4j"),
            nats_url: env_string_or_default(NATS_URL, "nats://localhost:4222"),
            max_retries: env_parse_or_default(MAX_RETRIES, 3),
            drop_directory: env_string_or_default(DROP_DIRECTORY, "./data/drop"),
            manuals_directory: env_string_or_default(MANUALS_DIRECTORY, "./data/manuals"),
            chat_url: env_string_or_default(CHAT_URL, "http://localhost:8082"),
            chat_model: env_string_or_default(CHAT_MODEL, "default"),
        }
    }
}
