use axum::{extract::State, routing::get, Json, Router};

use super::state_response;
use crate::models::{AppState, HealthResponse, StateResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/state", get(current_state))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        provider: state.config.llm.provider.clone(),
        credential_configured: state.credentials.current().await.is_some(),
    })
}

async fn current_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(state_response(&state.gateway.state().snapshot()))
}
