//! Source collectors (C4, §4.4).

pub mod forum;
mod harness;
pub mod ifixit;
pub mod manuals;
pub mod nhtsa;
pub mod reddit;
pub mod youtube;

pub use forum::ForumCollector;
pub use harness::CollectorHttp;
pub use ifixit::IFixitCollector;
pub use manuals::ManualsCollector;
pub use nhtsa::NhtsaCollector;
pub use reddit::RedditCollector;
pub use youtube::YouTubeCollector;

use async_trait::async_trait;
use wessley_core::{Context, Result};
use wessley_domain::ScrapedDocument;

/// A source collector: fetches and normalises documents from one external
/// system (§4.4). A failure scraping one sub-unit is logged and skipped;
/// only a catastrophic outer failure surfaces as `Err`.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn fetch_all(&self, ctx: &Context) -> Result<Vec<ScrapedDocument>>;
}
