use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::common::{PaginatedResponse, PaginationParams};
use crate::errors::AppError;
use crate::store::{ModerationStatus, SortField, SortStrategy, VideoQuery, VideoRecord};
use crate::InnerState;

pub const PUBLIC_PAGE_SIZE: u32 = 6;

#[derive(Debug, Default, Deserialize)]
pub struct PublicListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub sort: Option<String>,
    pub strategy: Option<String>,
}

/// Published videos whose ingestion query equals the path segment, or whose
/// title or description contains it.
#[tracing::instrument(name = "List published videos", skip(inner, params))]
pub async fn list_published(
    State(inner): State<InnerState>,
    Path(search_query): Path<String>,
    Query(params): Query<PublicListParams>,
) -> Result<Json<PaginatedResponse<VideoRecord>>, AppError> {
    let strategy = params
        .strategy
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<SortStrategy>)
        .transpose()?;
    let page = params.pagination.resolve(PUBLIC_PAGE_SIZE);

    let query = VideoQuery {
        status: ModerationStatus::Published,
        search: Some(search_query),
        strategy,
        sort: SortField::from_param(params.sort.as_deref()),
        page,
    };

    let result = inner.videos.list(&query).await?;
    tracing::debug!(total = result.total, returned = result.videos.len(), "Listed videos");

    Ok(Json(PaginatedResponse::from_page(result, page)))
}
