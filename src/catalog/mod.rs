//! External video catalog access.

#[cfg(test)]
pub mod fake;
pub mod youtube;

use async_trait::async_trait;

use crate::credentials::ApiKey;
use crate::errors::AppError;
use crate::store::{SortStrategy, VideoCounters};

pub use youtube::YoutubeClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub next_page_token: Option<String>,
}

impl SearchPage {
    pub fn ids(&self) -> Vec<String> {
        self.hits.iter().map(|hit| hit.id.clone()).collect()
    }
}

/// Full metadata for one video as reported upstream. Fields the platform
/// omitted stay `None` and are judged by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoDetails {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<String>,
    pub duration: Option<String>,
    pub counters: VideoCounters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStatistics {
    pub id: String,
    pub counters: VideoCounters,
}

/// Read operations against the video platform. The credential is always explicit.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One page of search results. A response without an item list is an empty page.
    async fn search(
        &self,
        query: &str,
        strategy: SortStrategy,
        page_size: usize,
        page_token: Option<&str>,
        credential: &ApiKey,
    ) -> Result<SearchPage, AppError>;

    /// Snippet, statistics and content details for at most 50 ids.
    async fn fetch_details(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoDetails>, AppError>;

    /// Statistics only, for at most 50 ids.
    async fn fetch_statistics(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoStatistics>, AppError>;
}
