//! Two-phase file decoding (§4.11): a dropped file is first read as a
//! sequence of `ScrapedDocument`s (one JSON object per line, per the
//! file-drop sink's format); if that yields none, each line is retried as a
//! raw per-source record and coerced.

use wessley_domain::ScrapedDocument;

use crate::coerce::coerce_raw_record;

pub fn decode_file_documents(contents: &str) -> Vec<ScrapedDocument> {
    let mut documents = Vec::new();
    for line in non_empty_lines(contents) {
        if let Ok(doc) = serde_json::from_str::<ScrapedDocument>(line) {
            documents.push(doc);
        }
    }
    if !documents.is_empty() {
        return documents;
    }

    for line in non_empty_lines(contents) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            if let Some(doc) = coerce_raw_record(&value) {
                documents.push(doc);
            }
        }
    }
    documents
}

fn non_empty_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().map(str::trim).filter(|line| !line.is_empty())
}
