use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::catalog::CatalogApi;
use crate::config::MAX_BATCH;
use crate::directory::SubcategoryDirectory;
use crate::errors::AppError;
use crate::store::VideoStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub ids_scanned: usize,
    pub batches: usize,
    pub batches_skipped: usize,
    pub videos_patched: u64,
}

/// Refreshes view, like and comment counts of stored videos in place.
pub struct ReconciliationJob {
    store: Arc<dyn VideoStore>,
    catalog: Arc<dyn CatalogApi>,
    directory: Arc<SubcategoryDirectory>,
}

impl ReconciliationJob {
    pub fn new(
        store: Arc<dyn VideoStore>,
        catalog: Arc<dyn CatalogApi>,
        directory: Arc<SubcategoryDirectory>,
    ) -> Self {
        Self {
            store,
            catalog,
            directory,
        }
    }

    #[tracing::instrument(name = "Reconcile video statistics", skip(self))]
    pub async fn run_once(&self) -> Result<ReconciliationReport, AppError> {
        let mut report = ReconciliationReport::default();

        let ids = self.store.scan_external_ids().await?;
        if ids.is_empty() {
            info!("No videos found in database to update.");
            return Ok(report);
        }
        report.ids_scanned = ids.len();

        let credential = self
            .directory
            .default_credential()
            .map_err(|e| AppError::Unexpected(anyhow::anyhow!("Server misconfiguration: {e}")))?;

        for batch in ids.chunks(MAX_BATCH) {
            report.batches += 1;

            let statistics = match self.catalog.fetch_statistics(batch, &credential).await {
                Ok(statistics) if statistics.is_empty() => {
                    warn!("No video data found for batch of {} ids", batch.len());
                    report.batches_skipped += 1;
                    continue;
                }
                Ok(statistics) => statistics,
                Err(e) => {
                    error!("Error fetching video statistics for batch: {}", e);
                    report.batches_skipped += 1;
                    continue;
                }
            };

            for item in statistics {
                match self.store.patch_counters(&item.id, &item.counters).await {
                    Ok(rows) => {
                        report.videos_patched += rows;
                        metrics::counter!("reconcile_videos_patched_total").increment(rows);
                    }
                    Err(e) => error!(external_id = %item.id, "Failed to patch counters: {}", e),
                }
            }
        }

        info!(?report, "Video statistics updated successfully");
        Ok(report)
    }
}
