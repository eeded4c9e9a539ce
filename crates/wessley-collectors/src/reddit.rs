//! Reddit collector (§4.4): `source = "reddit:<sub>"`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;
use wessley_core::{Context, Error, Result, RetryOptions};
use wessley_domain::{DocumentMetadata, ScrapedDocument};

use crate::harness::CollectorHttp;
use crate::Collector;

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: String,
    title: String,
    author: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    created_utc: f64,
}

pub struct RedditCollector {
    http: CollectorHttp,
    subreddits: Vec<String>,
    query: String,
}

impl RedditCollector {
    pub fn new(subreddits: Vec<String>, query: impl Into<String>) -> Result<Self> {
        let http = CollectorHttp::new(
            "wessley-bot/0.1 (automotive repair knowledge collector)",
            Duration::from_millis(1500),
            RetryOptions {
                max_attempts: 3,
                initial_wait: Duration::from_secs(3),
                max_wait: Duration::from_secs(30),
                jitter: true,
            },
        )?;
        Ok(RedditCollector {
            http,
            subreddits,
            query: query.into(),
        })
    }

    async fn fetch_subreddit(&self, ctx: &Context, subreddit: &str) -> Result<Vec<ScrapedDocument>> {
        let url = format!(
            "https://www.reddit.com/r/{subreddit}/search.json?q={}&restrict_sr=true&limit=100",
            urlencoding::encode(&self.query)
        );
        let body = self.http.get_text(ctx, &url).await?;
        let listing: RedditListing =
            serde_json::from_str(&body).map_err(|e| Error::TerminalIo(format!("parse reddit listing: {e}")))?;

        let mut seen = HashSet::new();
        let mut docs = Vec::new();
        for child in listing.data.children {
            let post = child.data;
            if !seen.insert(post.id.clone()) {
                continue;
            }
            let content = if post.selftext.trim().is_empty() {
                post.title.clone()
            } else {
                post.selftext.clone()
            };
            let published_at: Option<DateTime<Utc>> = Utc.timestamp_opt(post.created_utc as i64, 0).single();

            docs.push(ScrapedDocument {
                source: format!("reddit:{subreddit}"),
                source_id: post.id,
                title: post.title,
                content,
                author: Some(post.author),
                url: Some(format!("https://www.reddit.com{}", post.permalink)),
                published_at,
                scraped_at: Utc::now(),
                metadata: DocumentMetadata::default(),
            });
        }
        Ok(docs)
    }
}

#[async_trait]
impl Collector for RedditCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut all = Vec::new();
        for subreddit in &self.subreddits {
            ctx.check()?;
            match self.fetch_subreddit(ctx, subreddit).await {
                Ok(mut docs) => all.append(&mut docs),
                Err(e) => warn!(subreddit, error = %e, "skipping subreddit after fetch failure"),
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selftext_fallback_uses_title_when_empty() {
        let post = RedditPost {
            id: "abc".into(),
            title: "Clicking noise on cold start".into(),
            author: "u1".into(),
            selftext: String::new(),
            permalink: "/r/cars/comments/abc".into(),
            created_utc: 0.0,
        };
        let content = if post.selftext.trim().is_empty() {
            post.title.clone()
        } else {
            post.selftext.clone()
        };
        assert_eq!(content, "Clicking noise on cold start");
    }
}
