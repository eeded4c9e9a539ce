//! The data model shared by every stage of the pipeline (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structured vehicle attributes attached to a document or a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
}

impl VehicleInfo {
    /// The glossary's "vehicle key": `"<year>-<make>-<model>"`.
    pub fn vehicle_key(&self) -> Option<String> {
        match (&self.year, &self.make, &self.model) {
            (Some(year), Some(make), Some(model)) => Some(format!("{year}-{make}-{model}")),
            _ => None,
        }
    }
}

/// Source-agnostic metadata sub-record attached to a [`ScrapedDocument`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Source-agnostic normalised record produced by a collector (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl ScrapedDocument {
    /// The canonical document identity: `source + ":" + source_id`.
    pub fn doc_id(&self) -> String {
        format!("{}:{}", self.source, self.source_id)
    }
}

/// `ScrapedDocument` plus a sentence list and a flat attribute map, produced
/// by the ingestion pipeline's Parse stage (§4.8).
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub doc: ScrapedDocument,
    pub doc_id: String,
    pub sentences: Vec<String>,
    pub attributes: HashMap<String, String>,
}

/// A contiguous text window derived from a document (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub doc_id: String,
    pub index: usize,
    pub text: String,
}

/// A [`Chunk`] plus its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A scalar payload value, coerced from the caller's native type according
/// to its primitive kind (§4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::String(s.to_string())
    }
}
impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::String(s)
    }
}
impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        PayloadValue::Int(v)
    }
}
impl From<usize> for PayloadValue {
    fn from(v: usize) -> Self {
        PayloadValue::Int(v as i64)
    }
}
impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}
impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        PayloadValue::Bool(v)
    }
}

/// The on-disk unit in the vector index (§3).
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub payload: HashMap<String, PayloadValue>,
}

/// A vector-search hit (§4.6).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub content: String,
    pub doc_id: String,
    pub source: String,
    pub meta: HashMap<String, String>,
}

/// A graph node (§3).
#[derive(Debug, Clone, Default)]
pub struct ComponentNode {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub vehicle: Option<String>,
    pub properties: HashMap<String, String>,
}

/// A graph relationship (§3). `edge_type` is sanitised to
/// `[A-Za-z0-9_]` on persistence, never on construction.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from_id: String,
    pub to_id: String,
    pub edge_type: String,
}
