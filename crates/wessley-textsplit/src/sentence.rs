//! Sentence splitter (§4.8).
//!
//! Emits a boundary when a terminator `.!?` is immediately followed by
//! whitespace or end-of-input, or on a newline. Known limitation, carried
//! over from the spec rather than "fixed": abbreviations like `Dr.` produce
//! a false boundary — no attempt is made to special-case them.

/// Splits `text` into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        current.push(c);

        if c == '\n' {
            push_if_non_empty(&mut sentences, &current);
            current.clear();
        } else if c == '.' || c == '!' || c == '?' {
            let next_is_boundary = match chars.get(i + 1) {
                None => true,
                Some(next) => next.is_whitespace(),
            };
            if next_is_boundary {
                push_if_non_empty(&mut sentences, &current);
                current.clear();
            }
        }
        i += 1;
    }
    push_if_non_empty(&mut sentences, &current);

    sentences
}

fn push_if_non_empty(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
