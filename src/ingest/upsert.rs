use std::sync::Arc;

use crate::errors::AppError;
use crate::store::{IngestedVideo, VideoRecord, VideoStore};

/// Writes normalized videos keyed by (external id, sort strategy).
#[derive(Clone)]
pub struct RecordUpserter {
    store: Arc<dyn VideoStore>,
}

impl RecordUpserter {
    pub fn new(store: Arc<dyn VideoStore>) -> Self {
        Self { store }
    }

    /// Creates the row on first sighting, otherwise overwrites its volatile
    /// fields. Moderation, curation and soft-delete state are never changed here.
    #[tracing::instrument(
        name = "Upsert video",
        skip(self, video),
        fields(external_id = %video.external_id, strategy = %video.sort_strategy)
    )]
    pub async fn upsert(&self, video: &IngestedVideo) -> Result<VideoRecord, AppError> {
        if video.external_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Video record has an empty external id".to_string(),
            ));
        }
        let counters = &video.counters;
        if counters.view_count < 0 || counters.like_count < 0 || counters.comment_count < 0 {
            return Err(AppError::Validation(format!(
                "Video {} has negative counters",
                video.external_id
            )));
        }

        let stored = self.store.upsert_by_key(video).await?;
        tracing::debug!(id = %stored.id, title = %stored.title, "Updated/Added video");
        Ok(stored)
    }
}
