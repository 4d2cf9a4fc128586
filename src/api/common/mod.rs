//! Shared request and response shapes for the catalog routes.

pub mod middleware;
pub mod tracing;

use serde::{Deserialize, Serialize};

use crate::store::{Page, VideoPage, VideoRecord};

/// Raw paging parameters. Unparseable numbers fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PaginationParams {
    pub fn resolve(&self, default_limit: u32) -> Page {
        Page::from_params(
            parse_positive(self.page.as_deref()),
            parse_positive(self.limit.as_deref()),
            default_limit,
        )
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

impl PaginatedResponse<VideoRecord> {
    pub fn from_page(result: VideoPage, page: Page) -> Self {
        Self {
            pagination: PaginationInfo {
                total: result.total,
                page: page.page,
                limit: page.limit,
                total_pages: page.total_pages(result.total),
            },
            data: result.videos,
        }
    }
}
