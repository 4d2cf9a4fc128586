use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Search order used by a discovery pass. Part of the natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortStrategy {
    Relevance,
    Rating,
    ViewCount,
    Date,
}

impl SortStrategy {
    /// Fixed order in which an ingestion run walks the strategies.
    pub const ALL: [SortStrategy; 4] = [
        SortStrategy::Relevance,
        SortStrategy::Rating,
        SortStrategy::ViewCount,
        SortStrategy::Date,
    ];

    /// Value of the upstream `order` parameter, also the stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::Relevance => "relevance",
            SortStrategy::Rating => "rating",
            SortStrategy::ViewCount => "viewCount",
            SortStrategy::Date => "date",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Invalid sort strategy: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModerationStatus {
    Published,
    #[serde(rename = "Needs Review", alias = "NeedsReview")]
    NeedsReview,
    Unpublished,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Published => "Published",
            ModerationStatus::NeedsReview => "Needs Review",
            ModerationStatus::Unpublished => "Unpublished",
        }
    }
}

impl Default for ModerationStatus {
    fn default() -> Self {
        ModerationStatus::NeedsReview
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Published" => Ok(ModerationStatus::Published),
            "Needs Review" | "NeedsReview" => Ok(ModerationStatus::NeedsReview),
            "Unpublished" => Ok(ModerationStatus::Unpublished),
            _ => Err(AppError::Validation("Invalid status provided".to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub external_id: String,
    pub sort_strategy: SortStrategy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCounters {
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

/// A normalized video, ready to be written by the upserter.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedVideo {
    pub external_id: String,
    pub sort_strategy: SortStrategy,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    pub counters: VideoCounters,
    pub duration_seconds: u32,
    pub search_query: String,
    pub fetched_at: DateTime<Utc>,
}

impl IngestedVideo {
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            external_id: self.external_id.clone(),
            sort_strategy: self.sort_strategy,
        }
    }
}

/// A stored video row as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: Uuid,
    pub external_id: String,
    pub sort_strategy: SortStrategy,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub published_at: DateTime<Utc>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub duration_seconds: i32,
    pub search_query: String,
    pub last_fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub pending_deletion: bool,
    pub is_featured: bool,
    pub status: ModerationStatus,
}

impl VideoRecord {
    pub fn key(&self) -> NaturalKey {
        NaturalKey {
            external_id: self.external_id.clone(),
            sort_strategy: self.sort_strategy,
        }
    }

    pub fn counters(&self) -> VideoCounters {
        VideoCounters {
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
        }
    }
}

/// Column a listing is ordered by, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    LikeCount,
    ViewCount,
    PublishedAt,
    CommentCount,
    LastFetchedAt,
}

impl SortField {
    /// Public listing sort; unknown or absent values fall back to view count.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("likeCount") => SortField::LikeCount,
            Some("publishedAt") => SortField::PublishedAt,
            Some("commentCount") => SortField::CommentCount,
            _ => SortField::ViewCount,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::LikeCount => "like_count",
            SortField::ViewCount => "view_count",
            SortField::PublishedAt => "published_at",
            SortField::CommentCount => "comment_count",
            SortField::LastFetchedAt => "last_fetched_at",
        }
    }
}

pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn from_params(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total.max(0) + limit - 1) / limit
    }
}

/// Filter for catalog listings. Soft-deleted rows are always excluded.
#[derive(Debug, Clone)]
pub struct VideoQuery {
    pub status: ModerationStatus,
    /// Exact match on the ingestion query, or case-insensitive substring of title/description.
    pub search: Option<String>,
    pub strategy: Option<SortStrategy>,
    pub sort: SortField,
    pub page: Page,
}

#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<VideoRecord>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeScope {
    PendingDeletion,
    Everything,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryEntry {
    pub subcategory: String,
    pub api_key_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub page_id: String,
    pub title: String,
    pub description: String,
    pub search_query: String,
    pub default_sort: String,
    pub subcategories: Vec<String>,
}
