//! HTTP surface: public catalog reads, page layouts and the admin console.

pub mod admin;
pub mod common;
pub mod ingest;
pub mod pages;
pub mod videos;

use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::api::common::middleware::require_admin;
use crate::InnerState;

#[tracing::instrument(name = "create_admin_router", skip(state))]
fn create_admin_router(state: InnerState) -> Router<InnerState> {
    Router::new()
        .route("/videos", get(admin::list_videos))
        .route(
            "/videos/:id",
            put(admin::update_status).delete(admin::mark_for_deletion),
        )
        .route("/videos/:id/restore", post(admin::restore))
        .route("/videos/:id/featured", put(admin::set_featured))
        .route("/ingest", post(ingest::run_ingestion))
        .route("/reconcile", post(ingest::run_reconciliation))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Creates the `/api` router with state applied.
#[tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router {
    tracing::info!("Creating API router");

    // Spends upstream quota, so it shares the admin guard.
    let fetch = Router::new()
        .route("/fetch-videos/:query", get(ingest::fetch_videos))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/videos/:search_query", get(videos::list_published))
        .route("/pages/:page_id", get(pages::get_page))
        .merge(fetch)
        .nest("/admin", create_admin_router(state.clone()));

    Router::new().nest("/api", api).with_state(state)
}
