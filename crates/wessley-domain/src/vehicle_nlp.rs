//! Heuristic Make/Model/Year extractor (C5, §4.5).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use wessley_core::constants::{NLP_MAX_YEAR, NLP_MIN_YEAR};

use crate::validate::known_makes_and_models;

/// A single candidate vehicle mention found in free text.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleMatch {
    pub make: String,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub confidence: f32,
    pub span: (usize, usize),
}

/// make name plus any aliases that should resolve to it.
fn make_aliases() -> &'static [(&'static str, &'static [&'static str])] {
    static ALIASES: &[(&str, &[&str])] = &[
        ("Chevrolet", &["chevy", "chevrolet"]),
        ("Volkswagen", &["vw", "volkswagen"]),
        ("Honda", &["honda"]),
        ("Toyota", &["toyota"]),
        ("Ford", &["ford"]),
        ("Subaru", &["subaru"]),
        ("BMW", &["bmw"]),
        ("Nissan", &["nissan"]),
        ("Jeep", &["jeep"]),
        ("Ram", &["ram"]),
    ];
    ALIASES
}

fn make_alternation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let mut aliases: Vec<&str> = make_aliases().iter().flat_map(|(_, a)| a.iter().copied()).collect();
        // Longest-first so "chevrolet" matches before a hypothetical
        // shorter prefix alias would.
        aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
        let pattern = format!(r"(?i)\b({})\b", aliases.join("|"));
        #[allow(clippy::unwrap_used)]
        Regex::new(&pattern).unwrap()
    })
}

fn canonical_make(alias: &str) -> Option<&'static str> {
    let lower = alias.to_ascii_lowercase();
    make_aliases()
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| *a == lower))
        .map(|(canonical, _)| *canonical)
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"\b((?:19|20)\d{2})\b|'(\d{2})\b").unwrap()
    })
}

fn parse_year(caps: &regex::Captures<'_>) -> Option<i32> {
    if let Some(full) = caps.get(1) {
        full.as_str().parse::<i32>().ok()
    } else if let Some(short) = caps.get(2) {
        let yy: i32 = short.as_str().parse().ok()?;
        Some(if (80..=99).contains(&yy) { 1900 + yy } else { 2000 + yy })
    } else {
        None
    }
}

fn year_in_range(year: i32) -> bool {
    (NLP_MIN_YEAR..=NLP_MAX_YEAR).contains(&year)
}

/// Largest char boundary in `s` at or before `index`, clamped to `s.len()`.
/// Arbitrary byte-offset arithmetic (adding/subtracting a fixed window size)
/// can land inside a multibyte character; every window bound is routed
/// through this before it is used to slice `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Finds the longest known model of `make` within `window`, respecting word
/// boundaries.
fn find_model_in_window<'a>(make: &str, window: &'a str) -> Option<(&'a str, usize, usize)> {
    let table = known_makes_and_models();
    let models = table.iter().find(|(m, _)| *m == make)?.1;
    let mut sorted: Vec<&str> = models.to_vec();
    sorted.sort_by_key(|m| std::cmp::Reverse(m.len()));

    let lower_window = window.to_ascii_lowercase();
    for model in sorted {
        let lower_model = model.to_ascii_lowercase();
        if let Some(pos) = lower_window.find(&lower_model) {
            let before_ok = pos == 0
                || !lower_window.as_bytes()[pos - 1].is_ascii_alphanumeric();
            let end = pos + lower_model.len();
            let after_ok = end == lower_window.len()
                || !lower_window.as_bytes()[end].is_ascii_alphanumeric();
            if before_ok && after_ok {
                return Some((model, pos, end));
            }
        }
    }
    None
}

/// Finds a year mention within `window`.
fn find_year_in_window(window: &str) -> Option<i32> {
    year_regex()
        .captures_iter(window)
        .filter_map(|c| parse_year(&c))
        .find(|y| year_in_range(*y))
}

/// Extracts every candidate vehicle mention in `text`, deduplicated by
/// `(make, model, year)` and sorted by descending confidence.
pub fn extract_vehicle_matches(text: &str) -> Vec<VehicleMatch> {
    let mut matches = Vec::new();
    let mut seen = HashSet::new();

    for m in make_alternation_regex().find_iter(text) {
        let Some(make) = canonical_make(m.as_str()) else { continue };

        let model_window_end = floor_char_boundary(text, m.end() + 40);
        let model_window = &text[m.end()..model_window_end];
        let model_hit = find_model_in_window(make, model_window);

        let before_start = floor_char_boundary(text, m.start().saturating_sub(10));
        let before_window = &text[before_start..m.start()];
        let mut year = find_year_in_window(before_window);

        let (span_end, model_name) = if let Some((model, _start, end)) = model_hit {
            if year.is_none() {
                let after_start = floor_char_boundary(text, m.end() + end);
                let after_window_end = floor_char_boundary(text, after_start + 10);
                if after_start <= text.len() {
                    year = find_year_in_window(&text[after_start..after_window_end]);
                }
            }
            (m.end() + end, Some(model.to_string()))
        } else {
            (m.end(), None)
        };

        let confidence = match (year.is_some(), model_name.is_some()) {
            (true, true) => 0.95,
            (false, true) => 0.80,
            (true, false) => 0.70,
            (false, false) => 0.60,
        };

        let key = (make.to_string(), model_name.clone(), year);
        if seen.insert(key) {
            matches.push(VehicleMatch {
                make: make.to_string(),
                model: model_name,
                year,
                confidence,
                span: (m.start(), span_end),
            });
        }
    }

    // Standalone-model matches: a known model mentioned without its make
    // nearby, where the model name is unique across the whole catalogue.
    for (make, models) in known_makes_and_models() {
        for model in *models {
            if model_is_ambiguous(model) {
                continue;
            }
            let lower_text = text.to_ascii_lowercase();
            let lower_model = model.to_ascii_lowercase();
            if let Some(pos) = lower_text.find(&lower_model) {
                let already_covered = matches.iter().any(|vm| vm.model.as_deref() == Some(*model));
                if already_covered {
                    continue;
                }
                let end = pos + lower_model.len();
                let before_start = floor_char_boundary(text, pos.saturating_sub(10));
                let after_end = floor_char_boundary(text, end + 10);
                let nearby_year = find_year_in_window(&text[before_start..pos])
                    .or_else(|| find_year_in_window(&text[end..after_end]));
                let confidence = if nearby_year.is_some() { 0.75 } else { 0.50 };
                let key = (make.to_string(), Some(model.to_string()), nearby_year);
                if seen.insert(key) {
                    matches.push(VehicleMatch {
                        make: make.to_string(),
                        model: Some(model.to_string()),
                        year: nearby_year,
                        confidence,
                        span: (pos, end),
                    });
                }
            }
        }
    }

    matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

fn model_is_ambiguous(model: &str) -> bool {
    known_makes_and_models()
        .iter()
        .filter(|(_, models)| models.iter().any(|m| m.eq_ignore_ascii_case(model)))
        .count()
        > 1
}

/// The single highest-confidence match, if any.
pub fn best_vehicle_match(text: &str) -> Option<VehicleMatch> {
    extract_vehicle_matches(text).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_make_model_year_with_high_confidence() {
        let best = best_vehicle_match("My 2019 Honda Civic is making a clicking noise").unwrap();
        assert_eq!(best.make, "Honda");
        assert_eq!(best.model.as_deref(), Some("Civic"));
        assert_eq!(best.year, Some(2019));
        assert!((best.confidence - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn extracts_alias_and_abbreviated_year() {
        let best = best_vehicle_match("'18 Chevy Silverado won't start").unwrap();
        assert_eq!(best.make, "Chevrolet");
        assert_eq!(best.model.as_deref(), Some("Silverado"));
        assert_eq!(best.year, Some(2018));
    }

    #[test]
    fn make_only_has_lower_confidence() {
        let best = best_vehicle_match("my toyota keeps stalling").unwrap();
        assert_eq!(best.make, "Toyota");
        assert_eq!(best.model, None);
        assert!((best.confidence - 0.60).abs() < f32::EPSILON);
    }

    #[test]
    fn make_mention_with_nearby_model_but_no_year() {
        let best = best_vehicle_match("my honda Civic has a rattling dashboard").unwrap();
        assert_eq!(best.make, "Honda");
        assert_eq!(best.model.as_deref(), Some("Civic"));
        assert_eq!(best.year, None);
        assert!((best.confidence - 0.80).abs() < f32::EPSILON);
    }

    #[test]
    fn standalone_model_without_make_has_low_confidence() {
        let best = best_vehicle_match("the Civic has a rattling dashboard").unwrap();
        assert_eq!(best.make, "Honda");
        assert_eq!(best.model.as_deref(), Some("Civic"));
        assert!((best.confidence - 0.50).abs() < f32::EPSILON);
    }

    #[test]
    fn no_match_returns_none() {
        assert!(best_vehicle_match("the weather is nice today").is_none());
    }

    #[test]
    fn deduplicates_repeated_mentions() {
        let matches = extract_vehicle_matches("2019 Honda Civic, my Honda Civic 2019 again");
        let count = matches
            .iter()
            .filter(|m| m.make == "Honda" && m.model.as_deref() == Some("Civic") && m.year == Some(2019))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn does_not_panic_on_multibyte_text_near_match_windows() {
        let text = "My 2019 Honda Civic \u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697}\u{1F697} keeps stalling \u{30CF}\u{30F3}\u{30C0} \u{30B7}\u{30D3}\u{30C3}\u{30AF}";
        let matches = extract_vehicle_matches(text);
        assert!(!matches.is_empty());
    }

    #[test]
    fn sorted_by_confidence_descending() {
        let matches = extract_vehicle_matches("2019 Honda Civic and also a ford");
        for pair in matches.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}
