//! Conversions between Wessley's `PayloadValue` and Qdrant's wire payload.

use std::collections::HashMap;

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::Value as QdrantValue;
use qdrant_client::Payload;
use wessley_domain::{PayloadValue, SearchResult};

pub fn to_qdrant_payload(payload: &HashMap<String, PayloadValue>) -> Payload {
    let mut out = Payload::new();
    for (key, value) in payload {
        match value {
            PayloadValue::String(s) => out.insert(key.clone(), s.clone()),
            PayloadValue::Int(i) => out.insert(key.clone(), *i),
            PayloadValue::Float(f) => out.insert(key.clone(), *f),
            PayloadValue::Bool(b) => out.insert(key.clone(), *b),
        }
    }
    out
}

fn value_to_string(value: &QdrantValue) -> String {
    match &value.kind {
        Some(Kind::StringValue(s)) => s.clone(),
        Some(Kind::IntegerValue(i)) => i.to_string(),
        Some(Kind::DoubleValue(f)) => f.to_string(),
        Some(Kind::BoolValue(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Builds a [`SearchResult`] from a point's id, score, and payload,
/// extracting `content`, `doc_id`, `source` and leaving everything else in
/// `meta`.
pub fn search_result_from_payload(
    id: String,
    score: f32,
    payload: HashMap<String, QdrantValue>,
) -> SearchResult {
    let mut meta = HashMap::new();
    let mut content = String::new();
    let mut doc_id = String::new();
    let mut source = String::new();

    for (key, value) in payload {
        let s = value_to_string(&value);
        match key.as_str() {
            "content" => content = s,
            "doc_id" => doc_id = s,
            "source" => source = s,
            _ => {
                meta.insert(key, s);
            }
        }
    }

    SearchResult {
        id,
        score,
        content,
        doc_id,
        source,
        meta,
    }
}
