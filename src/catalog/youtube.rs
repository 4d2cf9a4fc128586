//! YouTube Data API v3 client.
//!
//! `search.list` costs 100 quota units per call and `videos.list` costs 1, so
//! callers batch detail lookups per search page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use super::{CatalogApi, SearchHit, SearchPage, VideoDetails, VideoStatistics};
use crate::config::MAX_BATCH;
use crate::credentials::ApiKey;
use crate::errors::AppError;
use crate::store::{SortStrategy, VideoCounters};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    next_page_token: Option<String>,
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    items: Option<Vec<VideoItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    content_details: Option<ContentDetails>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    published_at: Option<String>,
    title: Option<String>,
    description: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

impl Statistics {
    fn counters(&self) -> VideoCounters {
        VideoCounters {
            view_count: parse_count(self.view_count.as_deref()),
            like_count: parse_count(self.like_count.as_deref()),
            comment_count: parse_count(self.comment_count.as_deref()),
        }
    }
}

/// Counters arrive as decimal strings and are omitted when hidden by the uploader.
fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0)
}

impl From<VideoItem> for VideoDetails {
    fn from(item: VideoItem) -> Self {
        let counters = item
            .statistics
            .as_ref()
            .map(Statistics::counters)
            .unwrap_or_default();
        let duration = item.content_details.and_then(|cd| cd.duration);

        match item.snippet {
            Some(snippet) => {
                let thumbnail = snippet.thumbnails.and_then(|t| {
                    t.default
                        .or(t.medium)
                        .or(t.high)
                        .map(|thumbnail| thumbnail.url)
                });
                VideoDetails {
                    id: item.id,
                    title: snippet.title,
                    description: snippet.description,
                    thumbnail,
                    published_at: snippet.published_at,
                    duration,
                    counters,
                }
            }
            None => VideoDetails {
                id: item.id,
                duration,
                counters,
                ..VideoDetails::default()
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct YoutubeClient {
    http_client: Client,
    base_url: Url,
}

impl YoutubeClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), resource)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        credential: &ApiKey,
    ) -> Result<T, AppError> {
        let response = self
            .http_client
            .get(self.endpoint(resource))
            .query(params)
            .query(&[("key", credential.expose())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                resource,
                credential = %credential.name,
                status = %status,
                "YouTube API error: {}",
                error_text
            );
            return Err(AppError::ExternalService(anyhow::anyhow!(
                "YouTube API {} returned {}: {}",
                resource,
                status,
                error_text
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse {} response: {:?}", resource, e.without_url());
            AppError::ExternalService(anyhow::anyhow!(
                "Could not parse the YouTube {} response",
                resource
            ))
        })
    }

    fn check_batch(ids: &[String]) -> Result<(), AppError> {
        if ids.len() > MAX_BATCH {
            return Err(AppError::Validation(format!(
                "At most {} ids per videos.list call, got {}",
                MAX_BATCH,
                ids.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for YoutubeClient {
    #[tracing::instrument(name = "YouTube search", skip(self, credential, page_token), fields(credential = %credential.name))]
    async fn search(
        &self,
        query: &str,
        strategy: SortStrategy,
        page_size: usize,
        page_token: Option<&str>,
        credential: &ApiKey,
    ) -> Result<SearchPage, AppError> {
        let max_results = page_size.clamp(1, MAX_BATCH).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("order", strategy.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: SearchListResponse = self.get_json("search", &params, credential).await?;
        let page = search_page_from(response);
        debug!(hits = page.hits.len(), "Search page received");
        Ok(page)
    }

    #[tracing::instrument(name = "YouTube video details", skip(self, ids, credential), fields(count = ids.len(), credential = %credential.name))]
    async fn fetch_details(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoDetails>, AppError> {
        Self::check_batch(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let params = [
            ("part", "snippet,statistics,contentDetails"),
            ("id", joined.as_str()),
        ];
        let response: VideoListResponse = self.get_json("videos", &params, credential).await?;

        Ok(response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(VideoDetails::from)
            .collect())
    }

    #[tracing::instrument(name = "YouTube video statistics", skip(self, ids, credential), fields(count = ids.len(), credential = %credential.name))]
    async fn fetch_statistics(
        &self,
        ids: &[String],
        credential: &ApiKey,
    ) -> Result<Vec<VideoStatistics>, AppError> {
        Self::check_batch(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let params = [("part", "statistics"), ("id", joined.as_str())];
        let response: VideoListResponse = self.get_json("videos", &params, credential).await?;

        Ok(response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| VideoStatistics {
                counters: item.statistics.unwrap_or_default().counters(),
                id: item.id,
            })
            .collect())
    }
}

fn search_page_from(response: SearchListResponse) -> SearchPage {
    let hits = response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let id = item.id.and_then(|id| id.video_id)?;
            Some(SearchHit {
                id,
                title: item.snippet.and_then(|s| s.title),
            })
        })
        .collect();

    SearchPage {
        hits,
        next_page_token: response.next_page_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_without_items_is_an_empty_page() {
        let response: SearchListResponse =
            serde_json::from_value(json!({ "kind": "youtube#searchListResponse" })).unwrap();
        assert_eq!(search_page_from(response), SearchPage::default());
    }

    #[test]
    fn search_skips_items_without_video_ids() {
        let response: SearchListResponse = serde_json::from_value(json!({
            "nextPageToken": "CAUQAA",
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "abc" }, "snippet": { "title": "Grace" } },
                { "id": { "kind": "youtube#channel", "channelId": "UC1" } }
            ]
        }))
        .unwrap();

        let page = search_page_from(response);
        assert_eq!(page.ids(), vec!["abc".to_string()]);
        assert_eq!(page.hits[0].title.as_deref(), Some("Grace"));
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn video_item_maps_counters_and_thumbnail() {
        let item: VideoItem = serde_json::from_value(json!({
            "id": "abc",
            "snippet": {
                "publishedAt": "2024-05-01T10:00:00Z",
                "title": "On Grace",
                "description": "A sermon",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/vi/abc/default.jpg", "width": 120 },
                    "high": { "url": "https://i.ytimg.com/vi/abc/hqdefault.jpg" }
                }
            },
            "contentDetails": { "duration": "PT41M7S" },
            "statistics": { "viewCount": "1200", "likeCount": "34" }
        }))
        .unwrap();

        let details = VideoDetails::from(item);
        assert_eq!(details.thumbnail.as_deref(), Some("https://i.ytimg.com/vi/abc/default.jpg"));
        assert_eq!(details.duration.as_deref(), Some("PT41M7S"));
        assert_eq!(
            details.counters,
            VideoCounters {
                view_count: 1200,
                like_count: 34,
                comment_count: 0
            }
        );
    }

    #[test]
    fn malformed_counts_become_zero() {
        assert_eq!(parse_count(Some("12")), 12);
        assert_eq!(parse_count(Some("n/a")), 0);
        assert_eq!(parse_count(Some("-4")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected_before_any_request() {
        let client = YoutubeClient::new(
            Url::parse("http://127.0.0.1:9/youtube/v3").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        let key = ApiKey::new("YOUTUBE_API_KEY", secrecy::SecretString::new("k".into()));
        let ids: Vec<String> = (0..51).map(|i| format!("id{i}")).collect();

        let err = client.fetch_details(&ids, &key).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(client.fetch_statistics(&[], &key).await.unwrap().is_empty());
    }
}
