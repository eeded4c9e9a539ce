//! Dead-letter message shape published to `engine.ingest.dlq` (§4.8).

use serde::{Deserialize, Serialize};

/// Published once a message has exhausted its retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqMessage {
    /// The original message payload, verbatim.
    pub post: serde_json::Value,
    /// The terminal error that caused the message to be dead-lettered.
    pub error: String,
    /// How many redelivery attempts were made before giving up.
    pub retries: u32,
}
