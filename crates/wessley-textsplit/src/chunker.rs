//! Word-budget chunker (§4.8).
//!
//! Groups sentences into overlapping chunks under a soft word budget.
//! Forward progress is guaranteed: a chunk that can't accumulate `overlap`
//! words without retreating to its own start simply starts the next chunk
//! where the previous one ended.

use wessley_core::constants::{DEFAULT_CHUNK_OVERLAP_WORDS, DEFAULT_CHUNK_SIZE_WORDS};
use wessley_domain::Chunk;

use crate::sentence::split_sentences;

fn word_count(s: &str) -> usize {
    s.split_whitespace().count().max(1)
}

/// Splits `content` into [`Chunk`]s for `doc_id`.
///
/// `chunk_size <= 0` falls back to the default word budget; `overlap < 0`
/// is treated as zero. If `content` has no sentences (e.g. only
/// whitespace), a single chunk containing `content` verbatim is emitted.
pub fn chunk_document(doc_id: &str, content: &str, chunk_size: i64, overlap: i64) -> Vec<Chunk> {
    let chunk_size = if chunk_size <= 0 {
        DEFAULT_CHUNK_SIZE_WORDS
    } else {
        chunk_size as usize
    };
    let overlap = overlap.max(0) as usize;

    let sentences = split_sentences(content);
    if sentences.is_empty() {
        return vec![Chunk {
            doc_id: doc_id.to_string(),
            index: 0,
            text: content.to_string(),
        }];
    }

    let texts: Vec<String> = chunk_sentences(&sentences, chunk_size, overlap);
    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            doc_id: doc_id.to_string(),
            index,
            text,
        })
        .collect()
}

/// Splits `content` using the default chunk size and overlap (§4.8).
pub fn chunk_document_default(doc_id: &str, content: &str) -> Vec<Chunk> {
    chunk_document(
        doc_id,
        content,
        DEFAULT_CHUNK_SIZE_WORDS as i64,
        DEFAULT_CHUNK_OVERLAP_WORDS as i64,
    )
}

fn chunk_sentences(sentences: &[String], chunk_size: usize, overlap: usize) -> Vec<String> {
    let word_counts: Vec<usize> = sentences.iter().map(|s| word_count(s)).collect();
    let n = sentences.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < n {
        let mut end = start;
        let mut total = 0usize;
        while end < n {
            let w = word_counts[end];
            if total > 0 && total + w > chunk_size {
                break;
            }
            total += w;
            end += 1;
        }
        if end == start {
            // A single sentence alone exceeds the budget; take it anyway
            // so the chunker always makes forward progress.
            end = start + 1;
        }

        chunks.push(sentences[start..end].join(" "));

        if end >= n {
            break;
        }

        let mut new_start = end;
        let mut accumulated = 0usize;
        while new_start > start && accumulated < overlap {
            new_start -= 1;
            accumulated += word_counts[new_start];
        }

        start = if new_start > start { new_start } else { end };
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_overlap_matches_reference_scenario() {
        let chunks = chunk_document("doc-1", "S1. S2. S3. S4.", 2, 1);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["S1. S2.", "S2. S3.", "S3. S4."]);
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let chunks = chunk_document("doc-1", "S1. S2. S3. S4.", 2, 1);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn non_positive_chunk_size_falls_back_to_default() {
        let chunks = chunk_document("doc-1", "one sentence here.", 0, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one sentence here.");
    }

    #[test]
    fn negative_overlap_is_treated_as_zero() {
        let chunks = chunk_document("doc-1", "S1. S2. S3. S4.", 2, -5);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["S1. S2.", "S3. S4."]);
    }

    #[test]
    fn whitespace_only_content_falls_back_to_single_verbatim_chunk() {
        let chunks = chunk_document("doc-1", "   ", 512, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "   ");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn oversized_single_sentence_still_produces_one_chunk() {
        let long_sentence = "word ".repeat(100) + ".";
        let chunks = chunk_document("doc-1", &long_sentence, 5, 2);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn every_document_yields_at_least_one_chunk() {
        let chunks = chunk_document("doc-1", "Just one.", 512, 50);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn all_chunks_reference_the_same_doc_id() {
        let chunks = chunk_document("doc-42", "S1. S2. S3. S4. S5. S6.", 2, 1);
        assert!(chunks.iter().all(|c| c.doc_id == "doc-42"));
    }
}
