use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::{IngestionReport, IngestionTarget};
use crate::reconcile::ReconciliationReport;
use crate::InnerState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    pub query: Option<String>,
    pub subcategory: Option<String>,
}

impl IngestRequest {
    pub fn target(self) -> Result<IngestionTarget, AppError> {
        match (self.query, self.subcategory) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Provide either query or subcategory, not both".to_string(),
            )),
            (Some(query), None) => Ok(IngestionTarget::AdHoc(query)),
            (None, Some(label)) => Ok(IngestionTarget::Subcategory(label)),
            (None, None) => Ok(IngestionTarget::AllSubcategories),
        }
    }
}

/// An empty body selects every subcategory. Anything else must be a JSON
/// `IngestRequest`, so a malformed request never widens into a full sweep.
fn parse_request(headers: &HeaderMap, body: &Bytes) -> Result<IngestRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(IngestRequest::default());
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"));
    if !is_json {
        return Err(AppError::Validation(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid ingest request: {e}")))
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    pub report: IngestionReport,
}

impl From<IngestionReport> for IngestResponse {
    fn from(report: IngestionReport) -> Self {
        Self {
            message: "Videos successfully updated in database".to_string(),
            report,
        }
    }
}

/// Ad-hoc discovery for a raw query, kept on a GET route for older clients.
#[tracing::instrument(name = "Fetch videos for query", skip(inner))]
pub async fn fetch_videos(
    State(inner): State<InnerState>,
    Path(query): Path<String>,
) -> Result<Json<IngestResponse>, AppError> {
    let report = inner.ingestion.run(IngestionTarget::AdHoc(query)).await?;
    Ok(Json(report.into()))
}

#[tracing::instrument(name = "Run ingestion", skip(inner, headers, body))]
pub async fn run_ingestion(
    State(inner): State<InnerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    let request = parse_request(&headers, &body)?;
    let report = inner.ingestion.run(request.target()?).await?;
    Ok(Json(report.into()))
}

#[tracing::instrument(name = "Run reconciliation", skip(inner))]
pub async fn run_reconciliation(
    State(inner): State<InnerState>,
) -> Result<Json<ReconciliationReport>, AppError> {
    Ok(Json(inner.reconciliation.run_once().await?))
}
