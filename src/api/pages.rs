use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::store::PageConfig;
use crate::InnerState;

#[tracing::instrument(name = "Get page configuration", skip(inner))]
pub async fn get_page(
    State(inner): State<InnerState>,
    Path(page_id): Path<String>,
) -> Result<Json<PageConfig>, AppError> {
    inner
        .directory
        .find_page(&page_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))
}
