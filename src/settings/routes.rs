//! Settings API Routes
//!
//! - GET /api/settings - credential status (masked hint only)
//! - POST /api/settings - replace or clear the stored key

use axum::{extract::State, routing::get, Json, Router};
use tracing::error;

use super::{SettingsResponse, UpdateSettingsRequest};
use crate::models::{AppState, Credential};
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).post(update_settings))
}

fn settings_response(state: &AppState, credential: Option<&Credential>) -> SettingsResponse {
    SettingsResponse {
        has_key: credential.is_some(),
        key_hint: credential.map(Credential::hint),
        provider: state.config.llm.provider.clone(),
        model: state.config.llm.model.clone(),
    }
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let credential = state.credentials.current().await;
    Json(settings_response(&state, credential.as_ref()))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SettingsResponse>> {
    let key = request.api_key.unwrap_or_default();
    let credential = state.credentials.set(&key).await.map_err(|e| {
        error!("Failed to save settings: {:#}", e);
        AppError::Internal(format!("failed to save settings: {e}"))
    })?;
    Ok(Json(settings_response(&state, credential.as_ref())))
}
