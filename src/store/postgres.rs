use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    DirectoryStore, IngestedVideo, ModerationStatus, NaturalKey, PageConfig, PurgeScope,
    SubcategoryEntry, VideoCounters, VideoPage, VideoQuery, VideoRecord, VideoStore,
};
use crate::errors::AppError;

const QUERY_TIMEOUT: Duration = Duration::from_millis(10_000);

const VIDEO_COLUMNS: &str = "id, external_id, sort_strategy, title, description, thumbnail, \
    published_at, view_count, like_count, comment_count, duration_seconds, search_query, \
    last_fetched_at, created_at, pending_deletion, is_featured, status";

#[derive(Debug, FromRow)]
struct VideoRow {
    id: Uuid,
    external_id: String,
    sort_strategy: String,
    title: String,
    description: String,
    thumbnail: String,
    published_at: DateTime<Utc>,
    view_count: i64,
    like_count: i64,
    comment_count: i64,
    duration_seconds: i32,
    search_query: String,
    last_fetched_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    pending_deletion: bool,
    is_featured: bool,
    status: String,
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let sort_strategy = row.sort_strategy.parse().map_err(|_| {
            AppError::Database(anyhow::anyhow!(
                "Row {} has unknown sort strategy {:?}",
                row.id,
                row.sort_strategy
            ))
        })?;
        let status = row.status.parse().map_err(|_| {
            AppError::Database(anyhow::anyhow!(
                "Row {} has unknown status {:?}",
                row.id,
                row.status
            ))
        })?;

        Ok(VideoRecord {
            id: row.id,
            external_id: row.external_id,
            sort_strategy,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            published_at: row.published_at,
            view_count: row.view_count,
            like_count: row.like_count,
            comment_count: row.comment_count,
            duration_seconds: row.duration_seconds,
            search_query: row.search_query,
            last_fetched_at: row.last_fetched_at,
            created_at: row.created_at,
            pending_deletion: row.pending_deletion,
            is_featured: row.is_featured,
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct PageRow {
    page_id: String,
    title: String,
    description: String,
    search_query: String,
    default_sort: String,
    subcategories: Vec<String>,
}

impl From<PageRow> for PageConfig {
    fn from(row: PageRow) -> Self {
        PageConfig {
            page_id: row.page_id,
            title: row.title,
            description: row.description,
            search_query: row.search_query,
            default_sort: row.default_sort,
            subcategories: row.subcategories,
        }
    }
}

async fn timeout_query<T, F>(fut: F) -> Result<T, AppError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(Ok(res)) => Ok(res),
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(_) => Err(AppError::Database(anyhow::anyhow!(
            "Query timeout after {:?}",
            QUERY_TIMEOUT
        ))),
    }
}

/// Backslash-escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &VideoQuery) {
    qb.push(" WHERE pending_deletion = FALSE AND status = ");
    qb.push_bind(query.status.as_str());

    if let Some(strategy) = query.strategy {
        qb.push(" AND sort_strategy = ");
        qb.push_bind(strategy.as_str());
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (search_query = ");
        qb.push_bind(search.to_string());
        qb.push(" OR title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[tracing::instrument(name = "Connect to database", skip(database_url))]
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database connected and migrations applied");

        Ok(Self { pool })
    }

    async fn update_returning(
        &self,
        id: Uuid,
        assignment: &str,
        bind: VideoFlag,
    ) -> Result<Option<VideoRecord>, AppError> {
        let sql = format!(
            "UPDATE videos SET {} = $1 WHERE id = $2 RETURNING {}",
            assignment, VIDEO_COLUMNS
        );
        let query = sqlx::query_as::<_, VideoRow>(&sql);
        let query = match bind {
            VideoFlag::Text(value) => query.bind(value),
            VideoFlag::Bool(value) => query.bind(value),
        };

        let row = timeout_query(query.bind(id).fetch_optional(&self.pool)).await?;
        row.map(VideoRecord::try_from).transpose()
    }
}

enum VideoFlag {
    Text(&'static str),
    Bool(bool),
}

#[async_trait]
impl VideoStore for PgStore {
    async fn get_by_key(&self, key: &NaturalKey) -> Result<Option<VideoRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM videos WHERE external_id = $1 AND sort_strategy = $2",
            VIDEO_COLUMNS
        );
        let row = timeout_query(
            sqlx::query_as::<_, VideoRow>(&sql)
                .bind(&key.external_id)
                .bind(key.sort_strategy.as_str())
                .fetch_optional(&self.pool),
        )
        .await?;
        row.map(VideoRecord::try_from).transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let sql = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        let row = timeout_query(
            sqlx::query_as::<_, VideoRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;
        row.map(VideoRecord::try_from).transpose()
    }

    #[tracing::instrument(
        name = "Upsert video row",
        skip(self, video),
        fields(external_id = %video.external_id, strategy = %video.sort_strategy)
    )]
    async fn upsert_by_key(&self, video: &IngestedVideo) -> Result<VideoRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO videos (
                id, external_id, sort_strategy, title, description, thumbnail, published_at,
                view_count, like_count, comment_count, duration_seconds, search_query,
                last_fetched_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            ON CONFLICT (external_id, sort_strategy) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                thumbnail = EXCLUDED.thumbnail,
                view_count = EXCLUDED.view_count,
                like_count = EXCLUDED.like_count,
                comment_count = EXCLUDED.comment_count,
                duration_seconds = EXCLUDED.duration_seconds,
                search_query = EXCLUDED.search_query,
                last_fetched_at = EXCLUDED.last_fetched_at
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        let row = timeout_query(
            sqlx::query_as::<_, VideoRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(&video.external_id)
                .bind(video.sort_strategy.as_str())
                .bind(&video.title)
                .bind(&video.description)
                .bind(&video.thumbnail)
                .bind(video.published_at)
                .bind(video.counters.view_count)
                .bind(video.counters.like_count)
                .bind(video.counters.comment_count)
                .bind(i32::try_from(video.duration_seconds).unwrap_or(i32::MAX))
                .bind(&video.search_query)
                .bind(video.fetched_at)
                .fetch_one(&self.pool),
        )
        .await?;

        VideoRecord::try_from(row)
    }

    async fn patch_counters(
        &self,
        external_id: &str,
        counters: &VideoCounters,
    ) -> Result<u64, AppError> {
        let result = timeout_query(
            sqlx::query(
                r#"
                UPDATE videos
                SET view_count = $1, like_count = $2, comment_count = $3
                WHERE external_id = $4
                "#,
            )
            .bind(counters.view_count)
            .bind(counters.like_count)
            .bind(counters.comment_count)
            .bind(external_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn scan_external_ids(&self) -> Result<Vec<String>, AppError> {
        timeout_query(
            sqlx::query_scalar::<_, String>(
                "SELECT DISTINCT external_id FROM videos ORDER BY external_id",
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    #[tracing::instrument(name = "List videos", skip(self))]
    async fn list(&self, query: &VideoQuery) -> Result<VideoPage, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM videos");
        push_filters(&mut count_qb, query);
        let total = timeout_query(
            count_qb
                .build_query_scalar::<i64>()
                .fetch_one(&self.pool),
        )
        .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM videos", VIDEO_COLUMNS));
        push_filters(&mut qb, query);
        qb.push(format!(" ORDER BY {} DESC, id ASC", query.sort.column()));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(query.page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(query.page.offset() as i64);

        let rows = timeout_query(qb.build_query_as::<VideoRow>().fetch_all(&self.pool)).await?;
        let videos = rows
            .into_iter()
            .map(VideoRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(total, returned = videos.len(), "Listed videos");
        Ok(VideoPage { videos, total })
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_returning(id, "status", VideoFlag::Text(status.as_str()))
            .await
    }

    async fn set_pending_deletion(
        &self,
        id: Uuid,
        pending: bool,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_returning(id, "pending_deletion", VideoFlag::Bool(pending))
            .await
    }

    async fn set_featured(
        &self,
        id: Uuid,
        featured: bool,
    ) -> Result<Option<VideoRecord>, AppError> {
        self.update_returning(id, "is_featured", VideoFlag::Bool(featured))
            .await
    }

    #[tracing::instrument(name = "Purge videos", skip(self))]
    async fn purge(&self, scope: PurgeScope) -> Result<u64, AppError> {
        let sql = match scope {
            PurgeScope::PendingDeletion => "DELETE FROM videos WHERE pending_deletion = TRUE",
            PurgeScope::Everything => "DELETE FROM videos",
        };
        let result = timeout_query(sqlx::query(sql).execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn find_subcategory(&self, label: &str) -> Result<Option<SubcategoryEntry>, AppError> {
        let row = timeout_query(
            sqlx::query_as::<_, (String, String)>(
                "SELECT subcategory, api_key_name FROM subcategory_credentials WHERE subcategory = $1",
            )
            .bind(label)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|(subcategory, api_key_name)| SubcategoryEntry {
            subcategory,
            api_key_name,
        }))
    }

    async fn list_subcategories(&self) -> Result<Vec<SubcategoryEntry>, AppError> {
        let rows = timeout_query(
            sqlx::query_as::<_, (String, String)>(
                "SELECT subcategory, api_key_name FROM subcategory_credentials ORDER BY subcategory",
            )
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|(subcategory, api_key_name)| SubcategoryEntry {
                subcategory,
                api_key_name,
            })
            .collect())
    }

    async fn upsert_subcategory(&self, entry: &SubcategoryEntry) -> Result<(), AppError> {
        timeout_query(
            sqlx::query(
                r#"
                INSERT INTO subcategory_credentials (subcategory, api_key_name)
                VALUES ($1, $2)
                ON CONFLICT (subcategory) DO UPDATE SET api_key_name = EXCLUDED.api_key_name
                "#,
            )
            .bind(&entry.subcategory)
            .bind(&entry.api_key_name)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_page(&self, page_id: &str) -> Result<Option<PageConfig>, AppError> {
        let row = timeout_query(
            sqlx::query_as::<_, PageRow>(
                r#"
                SELECT page_id, title, description, search_query, default_sort, subcategories
                FROM pages WHERE page_id = $1
                "#,
            )
            .bind(page_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(PageConfig::from))
    }

    async fn upsert_page(&self, page: &PageConfig) -> Result<(), AppError> {
        timeout_query(
            sqlx::query(
                r#"
                INSERT INTO pages (page_id, title, description, search_query, default_sort, subcategories)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (page_id) DO UPDATE SET
                    title = EXCLUDED.title,
                    description = EXCLUDED.description,
                    search_query = EXCLUDED.search_query,
                    default_sort = EXCLUDED.default_sort,
                    subcategories = EXCLUDED.subcategories
                "#,
            )
            .bind(&page.page_id)
            .bind(&page.title)
            .bind(&page.description)
            .bind(&page.search_query)
            .bind(&page.default_sort)
            .bind(&page.subcategories)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
