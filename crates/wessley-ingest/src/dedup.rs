//! The pipeline's entry dedup gate (§4.8, §5): "safe for concurrent
//! access; the reference in-memory implementation uses a mutex-guarded
//! set."

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

/// Authoritative by-`doc_id` dedup, consulted before a document enters the
/// pipeline.
#[async_trait]
pub trait DedupGate: Send + Sync {
    /// True if `doc_id` has already been ingested.
    async fn contains(&self, doc_id: &str) -> bool;

    /// Records `doc_id` as ingested.
    async fn insert(&self, doc_id: &str);
}

/// Mutex-guarded in-memory set. Process-lifetime only; a production
/// deployment would back this with a shared key-value store.
#[derive(Default)]
pub struct InMemoryDedupGate {
    seen: Mutex<HashSet<String>>,
}

impl InMemoryDedupGate {
    pub fn new() -> Self {
        InMemoryDedupGate::default()
    }
}

#[async_trait]
impl DedupGate for InMemoryDedupGate {
    async fn contains(&self, doc_id: &str) -> bool {
        #[allow(clippy::unwrap_used)]
        self.seen.lock().unwrap().contains(doc_id)
    }

    async fn insert(&self, doc_id: &str) {
        #[allow(clippy::unwrap_used)]
        self.seen.lock().unwrap().insert(doc_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_gate_has_not_seen_anything() {
        let gate = InMemoryDedupGate::new();
        assert!(!gate.contains("reddit:cars:abc").await);
    }

    #[tokio::test]
    async fn inserted_id_is_subsequently_seen() {
        let gate = InMemoryDedupGate::new();
        gate.insert("reddit:cars:abc").await;
        assert!(gate.contains("reddit:cars:abc").await);
    }
}
