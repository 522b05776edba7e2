use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    catalog,
    config::Config,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{MetadataProvider, Recommender, TitleResolver, TmdbProvider},
};

pub mod recommendations;
pub mod titles;

/// Shared application state
///
/// Holds the read-only catalog (through the recommender) for the whole
/// process lifetime. Handlers never mutate it, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(recommender: Recommender) -> Self {
        Self { recommender }
    }

    /// Loads the catalog and builds the metadata provider from configuration
    ///
    /// Fails when the catalog artifact is missing or invalid. A missing API key
    /// is not an error: posters are disabled and this is logged once here.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let catalog = catalog::load_catalog(&config.catalog_path).await?;

        let provider: Option<Arc<dyn MetadataProvider>> = match config.api_key() {
            Some(api_key) => {
                let tmdb = TmdbProvider::new(
                    api_key.to_string(),
                    config.tmdb_api_url.clone(),
                    config.tmdb_image_base_url.clone(),
                    config.request_timeout(),
                )?;
                Some(Arc::new(tmdb) as Arc<dyn MetadataProvider>)
            }
            None => {
                tracing::warn!("TMDB_API_KEY not configured, posters are disabled");
                None
            }
        };

        let recommender = Recommender::new(Arc::new(catalog), provider)
            .with_resolver(TitleResolver::new(config.fuzzy_match_threshold))
            .with_no_poster_url(config.no_poster_url.clone())
            .with_call_timeout(config.request_timeout());

        tracing::info!(
            movies = recommender.catalog().len(),
            threshold = recommender.resolver().threshold(),
            posters_enabled = recommender.posters_enabled(),
            "Application state ready"
        );

        Ok(Self::new(recommender))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/titles", get(titles::list))
        .route("/titles/search", get(titles::search))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let catalog = state.recommender.catalog();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "movies": catalog.len(),
            "posters_enabled": state.recommender.posters_enabled(),
            "catalog_loaded_at": catalog.loaded_at(),
        })),
    )
}
