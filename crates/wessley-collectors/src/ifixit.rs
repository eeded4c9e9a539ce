//! iFixit guide collector (§4.4): `source = "ifixit"`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use wessley_core::{Context, Error, Result, RetryOptions};
use wessley_domain::{DocumentMetadata, ScrapedDocument};

use crate::harness::CollectorHttp;
use crate::Collector;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<GuideResult>,
}

#[derive(Debug, Deserialize)]
struct GuideResult {
    guideid: i64,
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    author: Option<AuthorRef>,
    #[serde(rename = "dataType", default)]
    data_type: String,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    lines: Vec<StepLine>,
}

#[derive(Debug, Deserialize)]
struct StepLine {
    #[serde(default)]
    text_raw: String,
}

pub struct IFixitCollector {
    http: CollectorHttp,
    queries: Vec<String>,
}

impl IFixitCollector {
    pub fn new(queries: Vec<String>) -> Result<Self> {
        let http = CollectorHttp::new(
            "wessley-bot/0.1 (automotive repair knowledge collector)",
            Duration::from_millis(1000),
            RetryOptions {
                max_attempts: 3,
                initial_wait: Duration::from_secs(3),
                max_wait: Duration::from_secs(30),
                jitter: true,
            },
        )?;
        Ok(IFixitCollector { http, queries })
    }

    async fn fetch_query(&self, ctx: &Context, query: &str) -> Result<Vec<GuideResult>> {
        let url = format!(
            "https://www.ifixit.com/api/2.0/search/{}?doctypes=guide",
            urlencoding::encode(query)
        );
        let body = self.http.get_text(ctx, &url).await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| Error::TerminalIo(format!("parse ifixit response: {e}")))?;
        Ok(parsed
            .results
            .into_iter()
            .filter(|r| r.data_type == "guide")
            .collect())
    }
}

fn guide_to_document(guide: GuideResult) -> ScrapedDocument {
    let step_text = guide
        .steps
        .iter()
        .flat_map(|s| s.lines.iter().map(|l| l.text_raw.as_str()))
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let content = if guide.summary.trim().is_empty() {
        step_text
    } else if step_text.is_empty() {
        guide.summary
    } else {
        format!("{} {}", guide.summary, step_text)
    };

    ScrapedDocument {
        source: "ifixit".to_string(),
        source_id: format!("ifixit-{}", guide.guideid),
        title: guide.title,
        content,
        author: guide.author.map(|a| a.username),
        url: guide.url,
        published_at: None,
        scraped_at: Utc::now(),
        metadata: DocumentMetadata::default(),
    }
}

#[async_trait]
impl Collector for IFixitCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut seen = HashSet::new();
        let mut docs = Vec::new();
        for query in &self.queries {
            ctx.check()?;
            match self.fetch_query(ctx, query).await {
                Ok(guides) => {
                    for guide in guides {
                        let doc = guide_to_document(guide);
                        if seen.insert(doc.source_id.clone()) {
                            docs.push(doc);
                        }
                    }
                }
                Err(e) => warn!(query, error = %e, "skipping ifixit query after fetch failure"),
            }
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_is_prefixed_with_ifixit() {
        let guide = GuideResult {
            guideid: 42,
            title: "Replace brake pads".into(),
            summary: "A short guide".into(),
            url: None,
            author: None,
            data_type: "guide".into(),
            steps: vec![],
        };
        let doc = guide_to_document(guide);
        assert_eq!(doc.source_id, "ifixit-42");
    }

    #[test]
    fn content_combines_summary_and_step_text() {
        let guide = GuideResult {
            guideid: 1,
            title: "t".into(),
            summary: "Summary.".into(),
            url: None,
            author: None,
            data_type: "guide".into(),
            steps: vec![Step {
                lines: vec![StepLine { text_raw: "Remove the bolt.".into() }],
            }],
        };
        let doc = guide_to_document(guide);
        assert_eq!(doc.content, "Summary. Remove the bolt.");
    }
}
