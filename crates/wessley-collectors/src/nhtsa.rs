//! NHTSA complaints collector (§4.4): `source = "nhtsa"`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use wessley_core::{Context, Error, Result, RetryOptions};
use wessley_domain::{DocumentMetadata, ScrapedDocument, VehicleInfo};

use crate::harness::CollectorHttp;
use crate::Collector;

#[derive(Debug, Deserialize)]
struct ComplaintsResponse {
    #[serde(default)]
    results: Vec<ComplaintRecord>,
}

#[derive(Debug, Deserialize)]
struct ComplaintRecord {
    #[serde(rename = "odiNumber")]
    odi_number: i64,
    make: String,
    model: String,
    #[serde(rename = "modelYear")]
    model_year: i32,
    #[serde(default)]
    summary: String,
    #[serde(rename = "dateOfIncident", default)]
    date_of_incident: Option<String>,
}

/// A single make/model/year query against the complaints API.
#[derive(Debug, Clone)]
pub struct NhtsaQuery {
    pub make: String,
    pub model: String,
    pub model_year: i32,
}

pub struct NhtsaCollector {
    http: CollectorHttp,
    queries: Vec<NhtsaQuery>,
}

impl NhtsaCollector {
    pub fn new(queries: Vec<NhtsaQuery>) -> Result<Self> {
        let http = CollectorHttp::new(
            "wessley-bot/0.1 (automotive repair knowledge collector)",
            Duration::from_millis(2000),
            RetryOptions {
                max_attempts: 3,
                initial_wait: Duration::from_secs(3),
                max_wait: Duration::from_secs(30),
                jitter: true,
            },
        )?;
        Ok(NhtsaCollector { http, queries })
    }

    async fn fetch_query(&self, ctx: &Context, query: &NhtsaQuery) -> Result<Vec<ScrapedDocument>> {
        let url = format!(
            "https://api.nhtsa.gov/complaints/complaintsByVehicle?make={}&model={}&modelYear={}",
            urlencoding::encode(&query.make),
            urlencoding::encode(&query.model),
            query.model_year
        );
        let body = self.http.get_text(ctx, &url).await?;
        let parsed: ComplaintsResponse =
            serde_json::from_str(&body).map_err(|e| Error::TerminalIo(format!("parse nhtsa response: {e}")))?;

        let docs = parsed
            .results
            .into_iter()
            .map(|record| {
                let vehicle_info = VehicleInfo {
                    make: Some(record.make.clone()),
                    model: Some(record.model.clone()),
                    year: Some(record.model_year),
                    trim: None,
                };
                let published_at = record
                    .date_of_incident
                    .as_deref()
                    .and_then(parse_incident_date);
                ScrapedDocument {
                    source: "nhtsa".to_string(),
                    source_id: record.odi_number.to_string(),
                    title: format!("{} {} {} - NHTSA Complaint", record.model_year, record.make, record.model),
                    content: record.summary,
                    author: None,
                    url: None,
                    published_at,
                    scraped_at: Utc::now(),
                    metadata: DocumentMetadata {
                        vehicle_info: Some(vehicle_info),
                        ..Default::default()
                    },
                }
            })
            .collect();
        Ok(docs)
    }
}

fn parse_incident_date(raw: &str) -> Option<chrono::DateTime<Utc>> {
    chrono::NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl Collector for NhtsaCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut docs = Vec::new();
        for query in &self.queries {
            ctx.check()?;
            match self.fetch_query(ctx, query).await {
                Ok(mut fetched) => docs.append(&mut fetched),
                Err(e) => warn!(make = %query.make, model = %query.model, year = query.model_year, error = %e, "skipping nhtsa query after fetch failure"),
            }
        }
        Ok(docs)
    }
}
