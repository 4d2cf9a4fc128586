use chrono::{DateTime, Utc};

use crate::catalog::VideoDetails;
use crate::duration::{parse_duration, passes_shorts_filter};
use crate::errors::AppError;
use crate::store::{IngestedVideo, SortStrategy};

/// Splits a detail batch into items long enough to keep and the count dropped as shorts.
pub fn drop_shorts(details: Vec<VideoDetails>, floor_secs: u32) -> (Vec<(VideoDetails, u32)>, usize) {
    let total = details.len();
    let kept: Vec<(VideoDetails, u32)> = details
        .into_iter()
        .map(|d| {
            let secs = d.duration.as_deref().map(parse_duration).unwrap_or(0);
            (d, secs)
        })
        .filter(|(_, secs)| passes_shorts_filter(*secs, floor_secs))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// Builds the stored shape of one upstream item.
pub fn normalize(
    details: VideoDetails,
    duration_seconds: u32,
    strategy: SortStrategy,
    search_query: &str,
    fetched_at: DateTime<Utc>,
) -> Result<IngestedVideo, AppError> {
    let title = details.title.ok_or_else(|| {
        AppError::Validation(format!("Video {} has no snippet title", details.id))
    })?;
    let published_raw = details.published_at.ok_or_else(|| {
        AppError::Validation(format!("Video {} has no publish date", details.id))
    })?;
    let published_at = DateTime::parse_from_rfc3339(&published_raw)
        .map_err(|e| {
            AppError::Validation(format!(
                "Video {} has invalid publish date {:?}: {}",
                details.id, published_raw, e
            ))
        })?
        .with_timezone(&Utc);

    Ok(IngestedVideo {
        external_id: details.id,
        sort_strategy: strategy,
        title,
        description: details.description.unwrap_or_default(),
        thumbnail: details.thumbnail.unwrap_or_default(),
        published_at,
        counters: details.counters,
        duration_seconds,
        search_query: search_query.to_string(),
        fetched_at,
    })
}
