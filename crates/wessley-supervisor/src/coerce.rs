//! Raw per-source record coercion (§4.11): when a dropped file doesn't
//! decode as a sequence of `ScrapedDocument`s, it's retried as a raw record
//! straight from one of the upstream APIs the collectors talk to
//! (Reddit, NHTSA, iFixit) and coerced by hand (`raw.to_scraped`).

use chrono::{TimeZone, Utc};
use serde_json::Value;
use wessley_domain::{DocumentMetadata, ScrapedDocument, VehicleInfo};

/// Attempts to coerce one raw JSON record into a [`ScrapedDocument`],
/// recognising the handful of upstream shapes the collectors consume.
/// Returns `None` if the record matches none of them.
pub fn coerce_raw_record(value: &Value) -> Option<ScrapedDocument> {
    coerce_reddit_raw(value)
        .or_else(|| coerce_nhtsa_raw(value))
        .or_else(|| coerce_ifixit_raw(value))
}

fn coerce_reddit_raw(value: &Value) -> Option<ScrapedDocument> {
    let id = value.get("id")?.as_str()?;
    let permalink = value.get("permalink")?.as_str()?;
    let title = value.get("title")?.as_str()?.to_string();
    let subreddit = value.get("subreddit").and_then(Value::as_str).unwrap_or("unknown");
    let selftext = value.get("selftext").and_then(Value::as_str).unwrap_or("");
    let author = value.get("author").and_then(Value::as_str).map(str::to_string);
    let published_at = value
        .get("created_utc")
        .and_then(Value::as_f64)
        .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single());

    Some(ScrapedDocument {
        source: format!("reddit:{subreddit}"),
        source_id: id.to_string(),
        title: title.clone(),
        content: if selftext.trim().is_empty() { title } else { selftext.to_string() },
        author,
        url: Some(format!("https://www.reddit.com{permalink}")),
        published_at,
        scraped_at: Utc::now(),
        metadata: DocumentMetadata::default(),
    })
}

fn coerce_nhtsa_raw(value: &Value) -> Option<ScrapedDocument> {
    let odi_number = value.get("odiNumber").and_then(as_i64)?;
    let make = value.get("make")?.as_str()?.to_string();
    let model = value.get("model")?.as_str()?.to_string();
    let model_year = value.get("modelYear").and_then(as_i64)? as i32;
    let summary = value.get("summary").and_then(Value::as_str).unwrap_or("").to_string();

    Some(ScrapedDocument {
        source: "nhtsa".to_string(),
        source_id: odi_number.to_string(),
        title: format!("{model_year} {make} {model} - NHTSA Complaint"),
        content: summary,
        author: None,
        url: None,
        published_at: None,
        scraped_at: Utc::now(),
        metadata: DocumentMetadata {
            vehicle_info: Some(VehicleInfo { make: Some(make), model: Some(model), year: Some(model_year), trim: None }),
            ..Default::default()
        },
    })
}

fn coerce_ifixit_raw(value: &Value) -> Option<ScrapedDocument> {
    let guideid = value.get("guideid").and_then(as_i64)?;
    let title = value.get("title")?.as_str()?.to_string();
    let summary = value.get("summary").and_then(Value::as_str).unwrap_or("").to_string();
    let url = value.get("url").and_then(Value::as_str).map(str::to_string);

    Some(ScrapedDocument {
        source: "ifixit".to_string(),
        source_id: format!("ifixit-{guideid}"),
        title,
        content: summary,
        author: None,
        url,
        published_at: None,
        scraped_at: Utc::now(),
        metadata: DocumentMetadata::default(),
    })
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str()?.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_reddit_raw_with_selftext() {
        let raw = json!({
            "id": "abc", "permalink": "/r/cars/comments/abc/foo", "title": "Clicking noise",
            "subreddit": "cars", "selftext": "It clicks on cold start.", "author": "u1",
            "created_utc": 1_700_000_000.0
        });
        let doc = coerce_raw_record(&raw).unwrap();
        assert_eq!(doc.source, "reddit:cars");
        assert_eq!(doc.source_id, "abc");
        assert_eq!(doc.content, "It clicks on cold start.");
        assert!(doc.url.unwrap().starts_with("https://www.reddit.com"));
    }

    #[test]
    fn coerces_nhtsa_raw() {
        let raw = json!({"odiNumber": 123456, "make": "HONDA", "model": "CIVIC", "modelYear": 2019, "summary": "Brakes failed."});
        let doc = coerce_raw_record(&raw).unwrap();
        assert_eq!(doc.source, "nhtsa");
        assert_eq!(doc.source_id, "123456");
        assert_eq!(doc.title, "2019 HONDA CIVIC - NHTSA Complaint");
        assert_eq!(doc.metadata.vehicle_info.unwrap().year, Some(2019));
    }

    #[test]
    fn coerces_ifixit_raw() {
        let raw = json!({"guideid": 999, "title": "Replace brake pads", "summary": "Step by step guide.", "url": "https://ifixit.com/g/999"});
        let doc = coerce_raw_record(&raw).unwrap();
        assert_eq!(doc.source, "ifixit");
        assert_eq!(doc.source_id, "ifixit-999");
    }

    #[test]
    fn unrecognised_shape_returns_none() {
        let raw = json!({"foo": "bar"});
        assert!(coerce_raw_record(&raw).is_none());
    }
}
