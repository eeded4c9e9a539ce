//! Domain validation (C3, §4.3).

use std::sync::OnceLock;

use regex::Regex;
use wessley_core::constants::{MAX_SUPPORTED_YEAR, MIN_SUPPORTED_YEAR};
use wessley_core::error::ValidationKind;
use wessley_core::{Error, Result};

use crate::model::{ScrapedDocument, VehicleInfo};

/// The recognised `source` prefixes (§3, §4.3). `manuals` extends the
/// spec's literal prefix sentence to cover `ManualsCollector` (§4.4), which
/// the distillation names as a collector variant without restating it in
/// the prefix set.
const RECOGNISED_SOURCE_PREFIXES: &[&str] = &["reddit", "youtube", "forum", "nhtsa", "ifixit", "manuals"];

/// A small static make/model catalogue. In a real deployment this would be
/// loaded from configuration; the spec calls it "the static table" without
/// prescribing its contents, so this is a representative seed.
pub fn known_makes_and_models() -> &'static [(&'static str, &'static [&'static str])] {
    static TABLE: &[(&str, &[&str])] = &[
        ("Honda", &["Civic", "Accord", "CR-V", "Pilot", "Odyssey", "Fit"]),
        ("Toyota", &["Camry", "Corolla", "RAV4", "Tacoma", "Highlander", "Prius"]),
        ("Ford", &["F-150", "Escape", "Explorer", "Mustang", "Focus"]),
        ("Chevrolet", &["Silverado", "Malibu", "Equinox", "Tahoe", "Camaro"]),
        ("Volkswagen", &["Jetta", "Golf", "Passat", "Tiguan", "Atlas"]),
        ("Subaru", &["Outback", "Forester", "Impreza", "Crosstrek", "Legacy"]),
        ("BMW", &["3 Series", "5 Series", "X3", "X5"]),
        ("Nissan", &["Altima", "Sentra", "Rogue", "Pathfinder"]),
        ("Jeep", &["Wrangler", "Grand Cherokee", "Cherokee"]),
        ("Ram", &["1500", "2500", "3500"]),
    ];
    TABLE
}

fn vin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)^[A-HJ-NPR-Z0-9]{17}$").unwrap()
    })
}

/// Validates `{make, model, year, vin?}` against the known vehicle
/// catalogue and the supported year range.
pub fn validate_vehicle(make: &str, model: &str, year: i32, vin: Option<&str>) -> Result<()> {
    let table = known_makes_and_models();
    let matched_make = table
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(make))
        .ok_or_else(|| Error::validation("make", make, ValidationKind::UnsupportedMake))?;

    let model_known = matched_make.1.iter().any(|m| m.eq_ignore_ascii_case(model));
    if !model_known {
        return Err(Error::validation("model", model, ValidationKind::UnsupportedModel));
    }

    if year < MIN_SUPPORTED_YEAR || year > MAX_SUPPORTED_YEAR {
        return Err(Error::validation(
            "year",
            year.to_string(),
            ValidationKind::YearOutOfRange,
        ));
    }

    if let Some(vin) = vin {
        if !vin.is_empty() && !vin_regex().is_match(vin) {
            return Err(Error::validation("vin", vin, ValidationKind::InvalidVin));
        }
    }

    Ok(())
}

fn injection_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        vec![
            Regex::new(r"(?i)(DROP|DELETE|INSERT|UPDATE|ALTER|EXEC|UNION).{0,20}(TABLE|FROM|INTO|SELECT|SET)").unwrap(),
            Regex::new(r"(?i)(--|;)\s*(DROP|DELETE|SELECT)").unwrap(),
            Regex::new(r"\$\{.*\}").unwrap(),
            Regex::new(r#"\{"\$\w+"\s*:"#).unwrap(),
        ]
    })
}

fn default_profanity_list() -> &'static [&'static str] {
    // A deliberately small placeholder list; real deployments configure
    // this from an external word list.
    &["damn", "hell", "crap"]
}

/// Validates a user question plus its embedded vehicle. Delegates to
/// [`validate_vehicle`] only once the text itself passes.
pub fn validate_query(question: &str, vehicle: Option<(&str, &str, i32)>) -> Result<()> {
    let trimmed = question.trim();
    if trimmed.chars().count() < 5 {
        return Err(Error::validation("question", trimmed, ValidationKind::QueryTooShort));
    }

    for pattern in injection_patterns() {
        if pattern.is_match(trimmed) {
            return Err(Error::validation("question", trimmed, ValidationKind::QueryInjection));
        }
    }

    let profanity = default_profanity_list();
    for token in trimmed.split_whitespace() {
        let cleaned = token.trim_matches(|c: char| ".,!?;:'\"()-".contains(c));
        if profanity.iter().any(|w| w.eq_ignore_ascii_case(cleaned)) {
            return Err(Error::validation("question", cleaned, ValidationKind::QueryProfanity));
        }
    }

    if let Some((make, model, year)) = vehicle {
        validate_vehicle(make, model, year, None)?;
    }

    Ok(())
}

/// Validates a [`ScrapedDocument`] per §4.3/§3.
pub fn validate_scraped_document(doc: &ScrapedDocument) -> Result<()> {
    if doc.content.is_empty() {
        return Err(Error::validation("content", "", ValidationKind::EmptyContent));
    }
    if doc.source_id.is_empty() {
        return Err(Error::validation("source_id", "", ValidationKind::EmptySourceId));
    }
    if doc.title.is_empty() {
        return Err(Error::validation("title", "", ValidationKind::EmptyTitle));
    }

    let prefix = doc.source.split(':').next().unwrap_or(&doc.source);
    if !RECOGNISED_SOURCE_PREFIXES.contains(&prefix) {
        return Err(Error::validation(
            "source",
            doc.source.clone(),
            ValidationKind::UnrecognisedSource,
        ));
    }

    Ok(())
}

/// Convenience: validate a [`VehicleInfo`] that may have missing fields,
/// used by callers that only have partially-structured data.
pub fn validate_vehicle_info(info: &VehicleInfo) -> Result<()> {
    match (&info.make, &info.model, &info.year) {
        (Some(make), Some(model), Some(year)) => validate_vehicle(make, model, *year, None),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentMetadata;
    use chrono::Utc;

    fn doc(source: &str, source_id: &str, title: &str, content: &str) -> ScrapedDocument {
        ScrapedDocument {
            source: source.into(),
            source_id: source_id.into(),
            title: title.into(),
            content: content.into(),
            author: None,
            url: None,
            published_at: None,
            scraped_at: Utc::now(),
            metadata: DocumentMetadata::default(),
        }
    }

    #[test]
    fn validate_vehicle_accepts_known_combo_case_insensitive() {
        assert!(validate_vehicle("honda", "civic", 2019, None).is_ok());
    }

    #[test]
    fn validate_vehicle_rejects_unknown_make() {
        let err = validate_vehicle("Yugo", "GV", 2000, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { kind: ValidationKind::UnsupportedMake, .. }
        ));
    }

    #[test]
    fn validate_vehicle_rejects_unknown_model_for_known_make() {
        let err = validate_vehicle("Honda", "Mustang", 2019, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { kind: ValidationKind::UnsupportedModel, .. }
        ));
    }

    #[test]
    fn validate_vehicle_rejects_year_out_of_range() {
        assert!(validate_vehicle("Honda", "Civic", 1975, None).is_err());
        assert!(validate_vehicle("Honda", "Civic", 2050, None).is_err());
    }

    #[test]
    fn validate_vehicle_rejects_vin_with_forbidden_letters() {
        // VINs never contain I, O, Q.
        let bad = "1HGCM82633A00000I";
        assert!(validate_vehicle("Honda", "Civic", 2019, Some(bad)).is_err());
    }

    #[test]
    fn validate_vehicle_accepts_well_formed_vin() {
        let good = "1HGCM82633A004352";
        assert!(validate_vehicle("Honda", "Civic", 2019, Some(good)).is_ok());
    }

    #[test]
    fn validate_vehicle_empty_vin_is_skipped() {
        assert!(validate_vehicle("Honda", "Civic", 2019, Some("")).is_ok());
    }

    #[test]
    fn validate_query_rejects_too_short() {
        assert!(validate_query("hi", None).is_err());
    }

    #[test]
    fn validate_query_rejects_sql_injection() {
        let err = validate_query("car problem; DROP TABLE users", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { kind: ValidationKind::QueryInjection, .. }
        ));
    }

    #[test]
    fn validate_query_rejects_template_injection() {
        assert!(validate_query("tell me about ${env.SECRET} please", None).is_err());
    }

    #[test]
    fn validate_query_rejects_nosql_operator_shape() {
        assert!(validate_query(r#"{"$where": "1=1"} what now"#, None).is_err());
    }

    #[test]
    fn validate_query_rejects_profane_token() {
        assert!(validate_query("this damn engine won't start", None).is_err());
    }

    #[test]
    fn validate_query_accepts_clean_question() {
        assert!(validate_query("why does my engine make a clicking noise", None).is_ok());
    }

    #[test]
    fn validate_query_delegates_to_vehicle_validation() {
        let err = validate_query("clicking noise please help", Some(("Yugo", "GV", 2000))).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { kind: ValidationKind::UnsupportedMake, .. }
        ));
    }

    #[test]
    fn validate_scraped_document_rejects_empty_content() {
        let d = doc("reddit:cars", "id1", "title", "");
        assert!(validate_scraped_document(&d).is_err());
    }

    #[test]
    fn validate_scraped_document_rejects_unrecognised_source() {
        let d = doc("twitter", "id1", "title", "content");
        let err = validate_scraped_document(&d).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation { kind: ValidationKind::UnrecognisedSource, .. }
        ));
    }

    #[test]
    fn validate_scraped_document_accepts_namespaced_source() {
        let d = doc("forum:vwvortex", "id1", "title", "content");
        assert!(validate_scraped_document(&d).is_ok());
    }

    #[test]
    fn validate_scraped_document_accepts_all_recognised_prefixes() {
        for prefix in RECOGNISED_SOURCE_PREFIXES {
            let d = doc(prefix, "id1", "title", "content");
            assert!(validate_scraped_document(&d).is_ok(), "prefix {prefix} should validate");
        }
    }
}
