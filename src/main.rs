mod api;
mod catalog;
mod config;
mod credentials;
mod directory;
mod duration;
mod errors;
mod ingest;
mod reconcile;
mod scheduler;
mod seed;
mod store;
mod system;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::get;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::common::tracing::{make_request_span, on_failure, on_request, on_response};
use crate::catalog::YoutubeClient;
use crate::config::Settings;
use crate::credentials::CredentialVault;
use crate::directory::SubcategoryDirectory;
use crate::ingest::{IngestionOrchestrator, IngestionTarget, RecordUpserter};
use crate::reconcile::ReconciliationJob;
use crate::scheduler::Scheduler;
use crate::store::postgres::PgStore;
use crate::store::{DirectoryStore, PurgeScope, VideoStore};

#[derive(Clone)]
pub struct InnerState {
    pub videos: Arc<dyn VideoStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub ingestion: Arc<IngestionOrchestrator>,
    pub reconciliation: Arc<ReconciliationJob>,
    pub admin_token: Option<Arc<SecretString>>,
}

#[derive(Parser)]
#[command(name = "sermon-catalog", version, about = "Sermon video catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the periodic statistics refresh (default).
    Serve,
    /// Discover videos and store them for review.
    Ingest(IngestArgs),
    /// Refresh view, like and comment counts once.
    Reconcile,
    /// Write the built-in page layouts and subcategory credential names.
    Seed,
    /// Hard-delete videos marked for deletion.
    Purge {
        /// Delete every stored video instead.
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct IngestArgs {
    /// Raw search text, run with the default credential.
    #[arg(long)]
    query: Option<String>,
    /// One subcategory from the directory.
    #[arg(long)]
    subcategory: Option<String>,
    /// Every subcategory in the directory.
    #[arg(long)]
    all: bool,
}

impl IngestArgs {
    fn target(self) -> IngestionTarget {
        match (self.query, self.subcategory) {
            (Some(query), _) => IngestionTarget::AdHoc(query),
            (None, Some(label)) => IngestionTarget::Subcategory(label),
            (None, None) => IngestionTarget::AllSubcategories,
        }
    }
}

async fn connect_store(settings: &Settings) -> anyhow::Result<Arc<PgStore>> {
    let url = settings.require_database_url()?;
    let store = PgStore::connect(url)
        .await
        .context("Failed to connect to the catalog database")?;
    Ok(Arc::new(store))
}

fn build_state(settings: &Settings, store: Arc<PgStore>) -> anyhow::Result<InnerState> {
    let vault = CredentialVault::from_vars(std::env::vars());
    if vault.is_empty() {
        tracing::warn!("No YOUTUBE_API_KEY* variables set, every ingestion target will be skipped");
    }
    let vault = Arc::new(vault);
    let directory = Arc::new(SubcategoryDirectory::new(
        store.clone(),
        vault,
        settings.default_credential_name.clone(),
    ));
    let catalog = Arc::new(YoutubeClient::new(
        settings.api_base.clone(),
        settings.http_timeout,
    )?);

    let ingestion = IngestionOrchestrator::new(
        catalog.clone(),
        directory.clone(),
        RecordUpserter::new(store.clone()),
        settings.ingest.clone(),
    );
    let reconciliation = ReconciliationJob::new(store.clone(), catalog, directory);

    Ok(InnerState {
        videos: store.clone(),
        directory: store,
        ingestion: Arc::new(ingestion),
        reconciliation: Arc::new(reconciliation),
        admin_token: settings
            .admin_token
            .as_ref()
            .map(|token| Arc::new(SecretString::new(token.expose_secret().clone()))),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let store = connect_store(&settings).await?;
    let state = build_state(&settings, store)?;

    let scheduler = Scheduler::new();
    let reconciliation = state.reconciliation.clone();
    let refresh = scheduler.schedule_every("reconcile", settings.reconcile_interval, move || {
        let job = reconciliation.clone();
        async move {
            if let Err(e) = job.run_once().await {
                tracing::error!("Scheduled reconciliation failed: {}", e);
            }
        }
    });
    if settings.reconcile_on_start {
        refresh.trigger();
    }

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| make_request_span(request))
        .on_request(|request: &Request<Body>, span: &Span| on_request(request, span))
        .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
            on_response(response, latency, span)
        })
        .on_failure(on_failure);

    let app = Router::new()
        .merge(system::create_system_router())
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .merge(api::create_api_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(CorsLayer::permissive()),
        )
        .layer(prometheus_layer);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Could not bind {address}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    scheduler.cancel(&refresh);
    scheduler.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sermon_catalog=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await?,
        Command::Ingest(args) => {
            let store = connect_store(&settings).await?;
            let state = build_state(&settings, store)?;
            let report = state.ingestion.run(args.target()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Reconcile => {
            let store = connect_store(&settings).await?;
            let state = build_state(&settings, store)?;
            let report = state.reconciliation.run_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Seed => {
            let store = connect_store(&settings).await?;
            let report = seed::seed_directory(store.as_ref()).await?;
            tracing::info!(?report, "Seed complete");
        }
        Command::Purge { all } => {
            let store = connect_store(&settings).await?;
            let scope = if all {
                PurgeScope::Everything
            } else {
                PurgeScope::PendingDeletion
            };
            let removed = store.purge(scope).await?;
            tracing::info!(removed, ?scope, "Purge complete");
        }
    }

    Ok(())
}
