//! In-process store used by the pipeline and route tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DirectoryStore, IngestedVideo, ModerationStatus, NaturalKey, PageConfig, PurgeScope,
    SortField, SubcategoryEntry, VideoCounters, VideoPage, VideoQuery, VideoRecord, VideoStore,
};
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryStore {
    videos: RwLock<Vec<VideoRecord>>,
    subcategories: RwLock<Vec<SubcategoryEntry>>,
    pages: RwLock<HashMap<String, PageConfig>>,
    failing_external_ids: RwLock<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_subcategories(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (subcategory, api_key_name) in entries {
            store
                .upsert_subcategory(&SubcategoryEntry {
                    subcategory: subcategory.to_string(),
                    api_key_name: api_key_name.to_string(),
                })
                .await
                .unwrap();
        }
        store
    }

    /// Makes every write for this external id fail, to exercise skip-and-continue paths.
    pub async fn fail_writes_for(&self, external_id: &str) {
        self.failing_external_ids
            .write()
            .await
            .push(external_id.to_string());
    }

    pub async fn all(&self) -> Vec<VideoRecord> {
        self.videos.read().await.clone()
    }

    pub async fn insert_record(&self, record: VideoRecord) {
        self.videos.write().await.push(record);
    }

    async fn update_by_id<F>(&self, id: Uuid, apply: F) -> Result<Option<VideoRecord>, AppError>
    where
        F: FnOnce(&mut VideoRecord) + Send,
    {
        let mut videos = self.videos.write().await;
        Ok(videos.iter_mut().find(|v| v.id == id).map(|video| {
            apply(video);
            video.clone()
        }))
    }
}

fn matches_search(video: &VideoRecord, search: &str) -> bool {
    let needle = search.to_lowercase();
    video.search_query == search
        || video.title.to_lowercase().contains(&needle)
        || video.description.to_lowercase().contains(&needle)
}

fn sort_value(video: &VideoRecord, field: SortField) -> i64 {
    match field {
        SortField::LikeCount => video.like_count,
        SortField::ViewCount => video.view_count,
        SortField::CommentCount => video.comment_count,
        SortField::PublishedAt => video.published_at.timestamp_micros(),
        SortField::LastFetchedAt => video.last_fetched_at.timestamp_micros(),
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn get_by_key(&self, key: &NaturalKey) -> Result<Option<VideoRecord>, AppError> {
        let videos = self.videos.read().await;
        Ok(videos.iter().find(|v| &v.key() == key).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let videos = self.videos.read().await;
        Ok(videos.iter().find(|v| v.id == id).cloned())
    }

    async fn upsert_by_key(&self, video: &IngestedVideo) -> Result<VideoRecord, AppError> {
        if self
            .failing_external_ids
            .read()
            .await
            .contains(&video.external_id)
        {
            return Err(AppError::Database(anyhow::anyhow!(
                "simulated write failure for {}",
                video.external_id
            )));
        }

        let key = video.key();
        let mut videos = self.videos.write().await;
        if let Some(existing) = videos.iter_mut().find(|v| v.key() == key) {
            existing.title = video.title.clone();
            existing.description = video.description.clone();
            existing.thumbnail = video.thumbnail.clone();
            existing.view_count = video.counters.view_count;
            existing.like_count = video.counters.like_count;
            existing.comment_count = video.counters.comment_count;
            existing.duration_seconds = i32::try_from(video.duration_seconds).unwrap_or(i32::MAX);
            existing.search_query = video.search_query.clone();
            existing.last_fetched_at = video.fetched_at;
            return Ok(existing.clone());
        }

        let record = VideoRecord {
            id: Uuid::new_v4(),
            external_id: video.external_id.clone(),
            sort_strategy: video.sort_strategy,
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail: video.thumbnail.clone(),
            published_at: video.published_at,
            view_count: video.counters.view_count,
            like_count: video.counters.like_count,
            comment_count: video.counters.comment_count,
            duration_seconds: i32::try_from(video.duration_seconds).unwrap_or(i32::MAX),
            search_query: video.search_query.clone(),
            last_fetched_at: video.fetched_at,
            created_at: video.fetched_at,
            pending_deletion: false,
            is_featured: false,
            status: ModerationStatus::default(),
        };
        videos.push(record.clone());
        Ok(record)
    }

    async fn patch_counters(
        &self,
        external_id: &str,
        counters: &VideoCounters,
    ) -> Result<u64, AppError> {
        let mut videos = self.videos.write().await;
        let mut touched = 0;
        for video in videos.iter_mut().filter(|v| v.external_id == external_id) {
            video.view_count = counters.view_count;
            video.like_count = counters.like_count;
            video.comment_count = counters.comment_count;
            touched += 1;
        }
        Ok(touched)
    }

    async fn scan_external_ids(&self) -> Result<Vec<String>, AppError> {
        let videos = self.videos.read().await;
        let mut ids: Vec<String> = videos.iter().map(|v| v.external_id.clone()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn list(&self, query: &VideoQuery) -> Result<VideoPage, AppError> {
        let videos = self.videos.read().await;
        let mut matching: Vec<VideoRecord> = videos
            .iter()
            .filter(|v| !v.pending_deletion && v.status == query.status)
            .filter(|v| query.strategy.map_or(true, |s| v.sort_strategy == s))
            .filter(|v| {
                query
                    .search
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .map_or(true, |s| matches_search(v, s))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            sort_value(b, query.sort)
                .cmp(&sort_value(a, query.sort))
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let videos = matching
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit as usize)
            .collect();

        Ok(VideoPage { videos, total })
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_by_id(id, |v| v.status = status).await
    }

    async fn set_pending_deletion(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_by_id(id, |v| v.pending_deletion = pending).await
    }

    async fn set_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_by_id(id, |v| v.is_featured = featured).await
    }

    async fn purge(&self, scope: PurgeScope) -> Result<u64, AppError> {
        let mut videos = self.videos.write().await;
        let before = videos.len();
        match scope {
            PurgeScope::PendingDeletion => videos.retain(|v| !v.pending_deletion),
            PurgeScope::Everything => videos.clear(),
        }
        Ok((before - videos.len()) as u64)
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_subcategory(&self, label: &str) -> Result<Option<SubcategoryEntry>, AppError> {
        let entries = self.subcategories.read().await;
        Ok(entries.iter().find(|e| e.subcategory == label).cloned())
    }

    async fn list_subcategories(&self) -> Result<Vec<SubcategoryEntry>, AppError> {
        Ok(self.subcategories.read().await.clone())
    }

    async fn upsert_subcategory(&self, entry: &SubcategoryEntry) -> Result<(), AppError> {
        let mut entries = self.subcategories.write().await;
        match entries.iter_mut().find(|e| e.subcategory == entry.subcategory) {
            Some(existing) => existing.api_key_name = entry.api_key_name.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(())
    }

    async fn find_page(&self, page_id: &str) -> Result<Option<PageConfig>, AppError> {
        Ok(self.pages.read().await.get(page_id).cloned())
    }

    async fn upsert_page(&self, page: &PageConfig) -> Result<(), AppError> {
        self.pages
            .write()
            .await
            .insert(page.page_id.clone(), page.clone());
        Ok(())
    }
}
