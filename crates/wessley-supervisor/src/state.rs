//! `processed: map["<name>:<size>" -> true]` state file (§4.11). Loading is
//! tolerant of a missing or corrupt file: both decay to an empty map rather
//! than failing the supervisor's startup.

use std::collections::HashMap;
use std::path::Path;

pub type ProcessedState = HashMap<String, bool>;

/// The key identifying a scanned file: its name is opaque, so identity for
/// dedup is `(name, size)` rather than content hash.
pub fn processed_key(name: &str, size: u64) -> String {
    format!("{name}:{size}")
}

pub async fn load_state(path: &Path) -> ProcessedState {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => ProcessedState::new(),
    }
}

pub async fn save_state(path: &Path, state: &ProcessedState) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string());
    tokio::fs::write(path, json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_name_and_size() {
        assert_eq!(processed_key("batch.json", 42), "batch.json:42");
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("processed.json")).await;
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let state = load_state(&path).await;
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");
        let mut state = ProcessedState::new();
        state.insert(processed_key("a.json", 10), true);
        save_state(&path, &state).await.unwrap();
        let loaded = load_state(&path).await;
        assert_eq!(loaded, state);
    }
}
