//! Parse stage (§4.8): `ScrapedDocument` → `ParsedDocument`.

use std::collections::HashMap;

use wessley_domain::{ParsedDocument, ScrapedDocument};

pub fn parse_document(doc: ScrapedDocument) -> ParsedDocument {
    let doc_id = doc.doc_id();
    let sentences = wessley_textsplit::split_sentences(&doc.content);

    let mut attributes = HashMap::new();
    attributes.insert("source".to_string(), doc.source.clone());
    if let Some(author) = &doc.author {
        attributes.insert("author".to_string(), author.clone());
    }
    if let Some(url) = &doc.url {
        attributes.insert("url".to_string(), url.clone());
    }
    if let Some(vehicle) = &doc.metadata.vehicle_string {
        attributes.insert("vehicle".to_string(), vehicle.clone());
    }
    if let Some(components) = &doc.metadata.components {
        attributes.insert("components".to_string(), components.clone());
    }
    if let Some(section) = &doc.metadata.section {
        attributes.insert("section".to_string(), section.clone());
    }

    ParsedDocument { doc, doc_id, sentences, attributes }
}
