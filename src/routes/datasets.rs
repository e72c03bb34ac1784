use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use super::{parse_mode, state_response};
use crate::models::{AppState, RecordsQuery, RecordsResponse, RefreshRequest, StateResponse};
use crate::types::{AppError, AppResult};

/// Rows returned by the record browser when no limit is given.
const DEFAULT_RECORD_LIMIT: usize = 30;
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/datasets",
            post(upload_dataset)
                .delete(clear_dataset)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/datasets/demo", post(load_demo))
        .route("/api/datasets/records", get(list_records))
}

/// POST /api/datasets - multipart `file` plus optional `mode`
async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<StateResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut mode: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("malformed upload: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("failed to read upload: {e}")))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("mode") => {
                mode = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidRequest(format!("invalid mode field: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let (file_name, content) =
        upload.ok_or_else(|| AppError::InvalidRequest("missing `file` field".to_string()))?;
    let mode = parse_mode(mode.as_deref())?;
    info!(file = %file_name, bytes = content.len(), %mode, "Dataset upload received");

    state.gateway.ingest(&file_name, &content, mode).await?;
    Ok(Json(state_response(&state.gateway.state().snapshot())))
}

/// POST /api/datasets/demo
async fn load_demo(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<Json<StateResponse>> {
    let mode = parse_mode(body.as_ref().and_then(|Json(b)| b.mode.as_deref()))?;
    state.gateway.load_demo(mode).await?;
    Ok(Json(state_response(&state.gateway.state().snapshot())))
}

/// DELETE /api/datasets
async fn clear_dataset(State(state): State<AppState>) -> Json<StateResponse> {
    state.gateway.clear();
    Json(state_response(&state.gateway.state().snapshot()))
}

/// GET /api/datasets/records?search=&limit=
async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Json<RecordsResponse> {
    let snapshot = state.gateway.state().snapshot();
    let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);

    let response = match snapshot.dataset.as_deref() {
        Some(dataset) => {
            let matched = dataset.search(query.search.as_deref().unwrap_or(""));
            RecordsResponse {
                fields: dataset.fields(),
                total: dataset.len(),
                matched: matched.len(),
                records: matched.into_iter().take(limit).cloned().collect(),
            }
        }
        None => RecordsResponse {
            fields: Vec::new(),
            total: 0,
            matched: 0,
            records: Vec::new(),
        },
    };
    Json(response)
}
