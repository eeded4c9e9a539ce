//! Vehicle forum collector (§4.4): `source = "forum:<name>"`.
//!
//! Conservative regex scrape of thread-listing HTML rather than a DOM
//! walk, matching the teacher's link-extraction style.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tracing::warn;
use wessley_core::{Context, Result, RetryOptions};
use wessley_domain::{DocumentMetadata, ScrapedDocument};

use crate::harness::CollectorHttp;
use crate::Collector;

fn thread_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"(?i)<a\s+href="([^"]*(?:threads|topic|showthread)[^"]*)"[^>]*>([^<]*)</a>"#).unwrap()
    })
}

/// One forum to poll: a display name and the listing URL to scrape.
#[derive(Debug, Clone)]
pub struct ForumSource {
    pub name: String,
    pub listing_url: String,
}

pub struct ForumCollector {
    http: CollectorHttp,
    sources: Vec<ForumSource>,
}

impl ForumCollector {
    pub fn new(sources: Vec<ForumSource>) -> Result<Self> {
        let http = CollectorHttp::new(
            "wessley-bot/0.1 (automotive repair knowledge collector)",
            Duration::from_millis(2000),
            RetryOptions {
                max_attempts: 2,
                initial_wait: Duration::from_secs(5),
                max_wait: Duration::from_secs(20),
                jitter: true,
            },
        )?;
        Ok(ForumCollector { http, sources })
    }

    async fn fetch_source(&self, ctx: &Context, source: &ForumSource) -> Result<Vec<ScrapedDocument>> {
        let html = self.http.get_text(ctx, &source.listing_url).await?;
        let mut seen = HashSet::new();
        let mut docs = Vec::new();

        for captures in thread_link_regex().captures_iter(&html) {
            let href = captures[1].to_string();
            let title = html_escape::decode_html_entities(captures[2].trim()).to_string();
            if title.is_empty() {
                continue;
            }
            if !seen.insert(href.clone()) {
                continue;
            }
            docs.push(ScrapedDocument {
                source: format!("forum:{}", source.name),
                source_id: href.clone(),
                title: title.clone(),
                content: title,
                author: None,
                url: Some(href),
                published_at: None,
                scraped_at: Utc::now(),
                metadata: DocumentMetadata::default(),
            });
        }
        Ok(docs)
    }
}

#[async_trait]
impl Collector for ForumCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut docs = Vec::new();
        for source in &self.sources {
            ctx.check()?;
            match self.fetch_source(ctx, source).await {
                Ok(mut fetched) => docs.append(&mut fetched),
                Err(e) => warn!(forum = %source.name, error = %e, "skipping forum after fetch failure"),
            }
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_thread_links_and_drops_empty_titles() {
        let html = r#"
            <a href="/forum/showthread.php?t=1">Clunking noise on turns</a>
            <a href="/forum/showthread.php?t=2"></a>
            <a href="/forum/other.php?t=3">Not a thread link</a>
        "#;
        let mut found = Vec::new();
        for captures in thread_link_regex().captures_iter(html) {
            let href = captures[1].to_string();
            let title = captures[2].trim().to_string();
            if !title.is_empty() {
                found.push((href, title));
            }
        }
        assert_eq!(found, vec![("/forum/showthread.php?t=1".to_string(), "Clunking noise on turns".to_string())]);
    }

    #[test]
    fn dedups_by_href_within_a_forum() {
        let html = r#"
            <a href="/forum/threads/1">First</a>
            <a href="/forum/threads/1">First again</a>
        "#;
        let mut seen = HashSet::new();
        let mut count = 0;
        for captures in thread_link_regex().captures_iter(html) {
            if seen.insert(captures[1].to_string()) {
                count += 1;
            }
        }
        assert_eq!(count, 1);
    }
}
