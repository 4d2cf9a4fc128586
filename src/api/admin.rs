//! Moderation and curation endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::common::{PaginatedResponse, PaginationParams};
use crate::errors::AppError;
use crate::store::{ModerationStatus, SortField, VideoQuery, VideoRecord};
use crate::InnerState;

pub const ADMIN_PAGE_SIZE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct AdminListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedUpdate {
    pub is_featured: bool,
}

fn video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Video not found".to_string()))
}

fn found(video: Option<VideoRecord>) -> Result<Json<VideoRecord>, AppError> {
    video
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

#[tracing::instrument(name = "List videos for moderation", skip(inner))]
pub async fn list_videos(
    State(inner): State<InnerState>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<PaginatedResponse<VideoRecord>>, AppError> {
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<ModerationStatus>()?,
        None => ModerationStatus::NeedsReview,
    };
    let page = params.pagination.resolve(ADMIN_PAGE_SIZE);

    let query = VideoQuery {
        status,
        search: None,
        strategy: None,
        sort: SortField::LastFetchedAt,
        page,
    };
    let result = inner.videos.list(&query).await?;

    Ok(Json(PaginatedResponse::from_page(result, page)))
}

/// The status is validated before the store is touched.
#[tracing::instrument(name = "Update video status", skip(inner, body))]
pub async fn update_status(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<VideoRecord>, AppError> {
    let status = body
        .status
        .as_deref()
        .ok_or_else(|| AppError::Validation("Invalid status provided".to_string()))?
        .parse::<ModerationStatus>()?;
    let id = video_id(&id)?;

    tracing::info!(%id, %status, "Updating video status");
    found(inner.videos.set_status(id, status).await?)
}

#[tracing::instrument(name = "Mark video for deletion", skip(inner))]
pub async fn mark_for_deletion(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecord>, AppError> {
    let id = video_id(&id)?;
    found(inner.videos.set_pending_deletion(id, true).await?)
}

#[tracing::instrument(name = "Restore video", skip(inner))]
pub async fn restore(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecord>, AppError> {
    let id = video_id(&id)?;
    found(inner.videos.set_pending_deletion(id, false).await?)
}

#[tracing::instrument(name = "Set featured flag", skip(inner, body))]
pub async fn set_featured(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
    Json(body): Json<FeaturedUpdate>,
) -> Result<Json<VideoRecord>, AppError> {
    let id = video_id(&id)?;
    found(inner.videos.set_featured(id, body.is_featured).await?)
}
