//! Wessley's data model (§3), domain validator (C3), and heuristic
//! Make/Model/Year extractor (C5).

pub mod model;
pub mod validate;
pub mod vehicle_nlp;

pub use model::{
    Chunk, ComponentNode, DocumentMetadata, Edge, EmbeddedChunk, ParsedDocument, PayloadValue,
    ScrapedDocument, SearchResult, VectorRecord, VehicleInfo,
};
pub use validate::{known_makes_and_models, validate_query, validate_scraped_document, validate_vehicle, validate_vehicle_info};
pub use vehicle_nlp::{best_vehicle_match, extract_vehicle_matches, VehicleMatch};
