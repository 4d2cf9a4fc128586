//! Persistence seams for the catalog.
//!
//! The pipeline and the HTTP layer only ever see these traits; `postgres`
//! provides the production implementation.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
pub use models::*;

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_by_key(&self, key: &NaturalKey) -> Result<Option<VideoRecord>, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Atomic create-or-update on (external_id, sort_strategy).
    ///
    /// Updates replace descriptive fields, counters, duration, search query and
    /// fetch time. Creation time, publish time, moderation status, curation and
    /// soft-delete flags are left as stored.
    async fn upsert_by_key(&self, video: &IngestedVideo) -> Result<VideoRecord, AppError>;

    /// Overwrites the counters of every row for this external id. Returns rows touched.
    async fn patch_counters(
        &self,
        external_id: &str,
        counters: &VideoCounters,
    ) -> Result<u64, AppError>;

    /// Distinct external ids of every stored row, soft-deleted ones included.
    async fn scan_external_ids(&self) -> Result<Vec<String>, AppError>;

    async fn list(&self, query: &VideoQuery) -> Result<VideoPage, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Option<VideoRecord>, AppError>;

    async fn set_pending_deletion(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<Option<VideoRecord>, AppError>;

    async fn set_featured(&self, id: Uuid, featured: bool)
        -> Result<Option<VideoRecord>, AppError>;

    /// Hard deletion. Returns rows removed.
    async fn purge(&self, scope: PurgeScope) -> Result<u64, AppError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_subcategory(&self, label: &str) -> Result<Option<SubcategoryEntry>, AppError>;

    async fn list_subcategories(&self) -> Result<Vec<SubcategoryEntry>, AppError>;

    async fn upsert_subcategory(&self, entry: &SubcategoryEntry) -> Result<(), AppError>;

    async fn find_page(&self, page_id: &str) -> Result<Option<PageConfig>, AppError>;

    async fn upsert_page(&self, page: &PageConfig) -> Result<(), AppError>;
}
