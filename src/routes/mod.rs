//! API Routes
//!
//! - `/api/health` - liveness and credential status
//! - `/api/state` - the current dashboard snapshot
//! - `/api/datasets` - upload, demo load, clear and record browsing
//! - `/api/analysis/refresh` - re-run the analysis on the current dataset
//! - `/api/chat` - advisor conversation
//! - `/api/settings` - credential management

pub mod analysis;
pub mod chat;
pub mod datasets;
pub mod health;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analysis::AnalysisMode;
use crate::models::{AppState, DatasetSummary, StateResponse};
use crate::settings;
use crate::state::DashboardSnapshot;
use crate::types::AppResult;

pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(health::router())
        .merge(datasets::router())
        .merge(analysis::router())
        .merge(chat::router())
        .merge(settings::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

/// Absent or blank means the default mode.
pub(crate) fn parse_mode(raw: Option<&str>) -> AppResult<AnalysisMode> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(mode) => mode.parse(),
        None => Ok(AnalysisMode::default()),
    }
}

pub(crate) fn state_response(snapshot: &DashboardSnapshot) -> StateResponse {
    StateResponse {
        revision: snapshot.revision,
        dataset: snapshot.dataset.as_ref().map(|dataset| DatasetSummary {
            source_name: snapshot.source_name.clone(),
            record_count: dataset.len(),
            fields: dataset.fields(),
        }),
        analysis: snapshot.analysis.as_deref().cloned(),
        processing: snapshot.processing,
        ingestion_error: snapshot.ingestion_error.clone(),
        analysis_error: snapshot.analysis_error.clone(),
    }
}
