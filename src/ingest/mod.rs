//! Discovery pipeline: search the platform per target and sort strategy,
//! drop shorts, normalize, and upsert.

pub mod normalize;
pub mod upsert;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::catalog::{CatalogApi, SearchPage};
use crate::config::IngestSettings;
use crate::credentials::ApiKey;
use crate::directory::SubcategoryDirectory;
use crate::errors::AppError;
use crate::store::SortStrategy;

pub use upsert::RecordUpserter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionTarget {
    /// Raw query text, searched with the default credential.
    AdHoc(String),
    /// One directory entry, searched as "<label> <suffix>".
    Subcategory(String),
    AllSubcategories,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub targets_processed: usize,
    pub targets_skipped: usize,
    pub strategies_empty: usize,
    pub strategies_failed: usize,
    pub candidates: usize,
    pub filtered_short: usize,
    pub normalize_failures: usize,
    pub upserted: usize,
    pub write_failures: usize,
}

struct ResolvedTarget {
    label: String,
    query: String,
    credential: ApiKey,
}

pub struct IngestionOrchestrator {
    catalog: Arc<dyn CatalogApi>,
    directory: Arc<SubcategoryDirectory>,
    upserter: RecordUpserter,
    settings: IngestSettings,
}

impl IngestionOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        directory: Arc<SubcategoryDirectory>,
        upserter: RecordUpserter,
        settings: IngestSettings,
    ) -> Self {
        Self {
            catalog,
            directory,
            upserter,
            settings,
        }
    }

    fn subcategory_query(&self, label: &str) -> String {
        format!("{} {}", label, self.settings.query_suffix)
            .trim()
            .to_string()
    }

    /// Full sweep over the target. Only a failure to list the directory aborts;
    /// everything else is logged, counted and skipped.
    #[tracing::instrument(name = "Ingestion run", skip(self))]
    pub async fn run(&self, target: IngestionTarget) -> Result<IngestionReport, AppError> {
        let mut report = IngestionReport::default();

        match target {
            IngestionTarget::AdHoc(query) => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    return Err(AppError::Validation("Search query must not be empty".to_string()));
                }
                match self.directory.default_credential() {
                    Ok(credential) => {
                        let target = ResolvedTarget {
                            label: query.clone(),
                            query,
                            credential,
                        };
                        self.run_target(&target, &mut report).await;
                    }
                    Err(e) => {
                        warn!("Skipping ad-hoc query {:?}: {}", query, e);
                        report.targets_skipped += 1;
                    }
                }
            }
            IngestionTarget::Subcategory(label) => match self.directory.resolve(&label).await {
                Ok(credential) => {
                    let target = ResolvedTarget {
                        query: self.subcategory_query(&label),
                        label,
                        credential,
                    };
                    self.run_target(&target, &mut report).await;
                }
                Err(e) => {
                    warn!("Skipping subcategory {:?}: {}", label, e);
                    report.targets_skipped += 1;
                }
            },
            IngestionTarget::AllSubcategories => {
                let entries = self.directory.entries().await?;
                info!("Sweeping {} subcategories", entries.len());
                for entry in entries {
                    match self.directory.credential_for(&entry) {
                        Ok(credential) => {
                            let target = ResolvedTarget {
                                query: self.subcategory_query(&entry.subcategory),
                                label: entry.subcategory,
                                credential,
                            };
                            self.run_target(&target, &mut report).await;
                        }
                        Err(e) => {
                            warn!("Skipping subcategory {:?}: {}", entry.subcategory, e);
                            report.targets_skipped += 1;
                        }
                    }
                }
            }
        }

        info!(?report, "Ingestion run finished");
        Ok(report)
    }

    async fn run_target(&self, target: &ResolvedTarget, report: &mut IngestionReport) {
        info!(
            "Fetching YouTube videos for: {} (Using API Key: {})",
            target.query, target.credential.name
        );

        for strategy in SortStrategy::ALL {
            match self.run_strategy(target, strategy, report).await {
                Ok(0) => {
                    info!("No new videos found for sorting: {}", strategy);
                    report.strategies_empty += 1;
                }
                Ok(written) => {
                    info!("Database update complete for {}: {} videos", strategy, written);
                }
                Err(e) => {
                    error!(
                        label = %target.label,
                        strategy = %strategy,
                        "Skipping strategy after upstream failure: {}",
                        e
                    );
                    report.strategies_failed += 1;
                }
            }
        }

        report.targets_processed += 1;
    }

    /// Returns the number of candidates the search produced for this strategy.
    async fn run_strategy(
        &self,
        target: &ResolvedTarget,
        strategy: SortStrategy,
        report: &mut IngestionReport,
    ) -> Result<usize, AppError> {
        let mut page_token: Option<String> = None;
        let mut candidates = 0;

        for _ in 0..self.settings.pages_per_strategy {
            let page: SearchPage = self
                .catalog
                .search(
                    &target.query,
                    strategy,
                    self.settings.page_size,
                    page_token.as_deref(),
                    &target.credential,
                )
                .await?;

            if page.hits.is_empty() {
                break;
            }
            candidates += page.hits.len();
            report.candidates += page.hits.len();
            for hit in &page.hits {
                tracing::trace!(
                    id = %hit.id,
                    title = hit.title.as_deref().unwrap_or_default(),
                    %strategy,
                    "Search hit"
                );
            }

            self.ingest_page(target, strategy, &page, report).await?;

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(candidates)
    }

    async fn ingest_page(
        &self,
        target: &ResolvedTarget,
        strategy: SortStrategy,
        page: &SearchPage,
        report: &mut IngestionReport,
    ) -> Result<(), AppError> {
        let details = self
            .catalog
            .fetch_details(&page.ids(), &target.credential)
            .await?;

        let (kept, dropped) = normalize::drop_shorts(details, self.settings.min_duration_secs);
        report.filtered_short += dropped;
        metrics::counter!("ingest_videos_filtered_total").increment(dropped as u64);

        let fetched_at = Utc::now();
        for (details, duration_seconds) in kept {
            let id = details.id.clone();
            let video = match normalize::normalize(
                details,
                duration_seconds,
                strategy,
                &target.query,
                fetched_at,
            ) {
                Ok(video) => video,
                Err(e) => {
                    warn!("Skipping malformed video {}: {}", id, e);
                    report.normalize_failures += 1;
                    continue;
                }
            };

            match self.upserter.upsert(&video).await {
                Ok(_) => {
                    report.upserted += 1;
                    metrics::counter!("ingest_videos_upserted_total").increment(1);
                }
                Err(e) => {
                    error!("Error saving video {} ({}): {}", id, strategy, e);
                    report.write_failures += 1;
                    metrics::counter!("ingest_write_failures_total").increment(1);
                }
            }
        }

        Ok(())
    }
}
