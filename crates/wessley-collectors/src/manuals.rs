//! OEM manuals collector (§4.4): `source = "manuals"`.
//!
//! Manuals are not fetched live; they are plain-text extracts an operator
//! has already dropped into a directory (one file per manual section).
//! This collector's job is normalisation, not scraping, so it skips the
//! HTTP harness entirely and reads from disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::warn;
use wessley_core::{Context, Error, Result};
use wessley_domain::{DocumentMetadata, ScrapedDocument};

pub struct ManualsCollector {
    directory: PathBuf,
}

impl ManualsCollector {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        ManualsCollector { directory: directory.into() }
    }

    async fn fetch_file(&self, path: &Path) -> Result<ScrapedDocument> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::TerminalIo(format!("read manual file {}: {e}", path.display())))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("manual")
            .to_string();
        let title = stem.replace(['_', '-'], " ");

        Ok(ScrapedDocument {
            source: "manuals".to_string(),
            source_id: stem,
            title,
            content,
            author: None,
            url: None,
            published_at: None,
            scraped_at: Utc::now(),
            metadata: DocumentMetadata::default(),
        })
    }
}

#[async_trait]
impl crate::Collector for ManualsCollector {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                return Err(Error::TerminalIo(format!(
                    "read manuals directory {}: {e}",
                    self.directory.display()
                )))
            }
        };

        let mut docs = Vec::new();
        loop {
            ctx.check()?;
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stopping manuals scan after directory read failure");
                    break;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match self.fetch_file(&path).await {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping manual after read failure"),
            }
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Collector;

    #[tokio::test]
    async fn reads_text_files_from_directory_into_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("honda_civic_brakes.txt"), "Torque the caliper bolts to 27 ft-lb.").unwrap();

        let collector = ManualsCollector::new(dir.path());
        let ctx = Context::background();
        let docs = collector.fetch_all(&ctx).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "manuals");
        assert_eq!(docs[0].source_id, "honda_civic_brakes");
        assert_eq!(docs[0].title, "honda civic brakes");
    }

    #[tokio::test]
    async fn missing_directory_is_a_terminal_error() {
        let collector = ManualsCollector::new("/no/such/directory/wessley-manuals-test");
        let ctx = Context::background();
        let result = collector.fetch_all(&ctx).await;
        assert!(matches!(result, Err(Error::TerminalIo(_))));
    }
}
