//! Scripted catalog used by pipeline and route tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CatalogApi, SearchHit, SearchPage, VideoDetails, VideoStatistics};
use crate::credentials::ApiKey;
use crate::errors::AppError;
use crate::store::{SortStrategy, VideoCounters};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search {
        query: String,
        strategy: SortStrategy,
        credential: String,
    },
    Details {
        ids: Vec<String>,
        credential: String,
    },
    Statistics {
        ids: Vec<String>,
        credential: String,
    },
}

#[derive(Default)]
pub struct FakeCatalog {
    searches: Mutex<HashMap<(String, SortStrategy), Vec<Vec<String>>>>,
    failing_searches: Mutex<HashSet<(String, SortStrategy)>>,
    details: Mutex<HashMap<String, VideoDetails>>,
    statistics: Mutex<HashMap<String, VideoCounters>>,
    failing_statistics: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
}

/// Details for a video with a parseable snippet.
pub fn video(id: &str, duration: &str, views: i64) -> VideoDetails {
    VideoDetails {
        id: id.to_string(),
        title: Some(format!("Sermon {id}")),
        description: Some(format!("Description of {id}")),
        thumbnail: Some(format!("https://i.ytimg.com/vi/{id}/default.jpg")),
        published_at: Some("2024-03-01T12:00:00Z".to_string()),
        duration: Some(duration.to_string()),
        counters: VideoCounters {
            view_count: views,
            like_count: views / 10,
            comment_count: views / 100,
        },
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call appends one page of results for (query, strategy).
    pub fn with_search(self, query: &str, strategy: SortStrategy, ids: &[&str]) -> Self {
        self.searches
            .lock()
            .unwrap()
            .entry((query.to_string(), strategy))
            .or_default()
            .push(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn with_failing_search(self, query: &str, strategy: SortStrategy) -> Self {
        self.failing_searches
            .lock()
            .unwrap()
            .insert((query.to_string(), strategy));
        self
    }

    pub fn with_video(self, details: VideoDetails) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(details.id.clone(), details);
        self
    }

    pub fn with_statistics(self, id: &str, counters: VideoCounters) -> Self {
        self.statistics
            .lock()
            .unwrap()
            .insert(id.to_string(), counters);
        self
    }

    pub fn with_failing_statistics(self, id: &str) -> Self {
        self.failing_statistics
            .lock()
            .unwrap()
            .insert(id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<(String, SortStrategy, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search {
                    query,
                    strategy,
                    credential,
                } => Some((query, strategy, credential)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search(
        &self,
        query: &str,
        strategy: SortStrategy,
        _page_size: usize,
        page_token: Option<&str>,
        credential: &ApiKey,
    ) -> Result<SearchPage, AppError> {
        self.calls.lock().unwrap().push(Call::Search {
            query: query.to_string(),
            strategy,
            credential: credential.name.clone(),
        });

        let key = (query.to_string(), strategy);
        if self.failing_searches.lock().unwrap().contains(&key) {
            return Err(AppError::ExternalService(anyhow::anyhow!(
                "simulated search outage"
            )));
        }

        let index = page_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let searches = self.searches.lock().unwrap();
        let pages = searches.get(&key).cloned().unwrap_or_default();

        Ok(SearchPage {
            hits: pages
                .get(index)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|id| SearchHit { id, title: None })
                .collect(),
            next_page_token: (index + 1 < pages.len()).then(|| format!("page-{}", index + 1)),
        })
    }

    async fn fetch_details(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoDetails>, AppError> {
        assert!(ids.len() <= 50, "details batch too large: {}", ids.len());
        self.calls.lock().unwrap().push(Call::Details {
            ids: ids.to_vec(),
            credential: credential.name.clone(),
        });

        let details = self.details.lock().unwrap();
        Ok(ids.iter().filter_map(|id| details.get(id).cloned()).collect())
    }

    async fn fetch_statistics(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoStatistics>, AppError> {
        assert!(ids.len() <= 50, "statistics batch too large: {}", ids.len());
        self.calls.lock().unwrap().push(Call::Statistics {
            ids: ids.to_vec(),
            credential: credential.name.clone(),
        });

        let failing = self.failing_statistics.lock().unwrap();
        if ids.iter().any(|id| failing.contains(id)) {
            return Err(AppError::ExternalService(anyhow::anyhow!(
                "simulated statistics outage"
            )));
        }

        let statistics = self.statistics.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| {
                statistics.get(id).map(|counters| VideoStatistics {
                    id: id.clone(),
                    counters: *counters,
                })
            })
            .collect())
    }
}
