//! Deterministic vector-point IDs (§4.8): `uuid_v5(NameSpaceURL,
//! "<doc_id>-<i>")`, so re-ingesting the same document upserts the same
//! points instead of duplicating them.

use uuid::Uuid;

pub fn chunk_point_id(doc_id: &str, index: usize) -> String {
    let name = format!("{doc_id}-{index}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}
