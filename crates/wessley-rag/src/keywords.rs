//! Keyword extraction for graph enrichment (§4.9): lowercase, split on
//! whitespace, drop tokens ≤2 chars, drop stop words, strip edge
//! punctuation.

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "to", "of", "in", "on",
    "at", "by", "with", "is", "are", "was", "were", "be", "been", "being", "it", "its", "this",
    "that", "these", "those", "my", "your", "his", "her", "their", "our", "i", "you", "he",
    "she", "they", "we", "do", "does", "did", "can", "could", "will", "would", "should", "has",
    "have", "had", "not", "no", "what", "why", "how", "when", "where", "who", "which",
];

fn strip_edge_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| "?.,!;:'\"".contains(c))
}

/// Extracts the distinct, order-preserving set of content keywords from
/// free text.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();
    for raw in text.to_lowercase().split_whitespace() {
        let stripped = strip_edge_punctuation(raw);
        if stripped.chars().count() <= 2 {
            continue;
        }
        if STOP_WORDS.contains(&stripped) {
            continue;
        }
        if seen.insert(stripped.to_string()) {
            keywords.push(stripped.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_tokens_and_stop_words() {
        let keywords = extract_keywords("Why is my car making a clicking noise on cold start?");
        assert_eq!(keywords, vec!["car", "making", "clicking", "noise", "cold", "start"]);
    }

    #[test]
    fn strips_edge_punctuation() {
        let keywords = extract_keywords("brakes, rotors; calipers!");
        assert_eq!(keywords, vec!["brakes", "rotors", "calipers"]);
    }

    #[test]
    fn deduplicates_repeated_keywords() {
        let keywords = extract_keywords("brakes brakes brakes");
        assert_eq!(keywords, vec!["brakes"]);
    }
}
