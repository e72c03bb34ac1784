use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::{parse_mode, state_response};
use crate::models::{AppState, RefreshRequest, StateResponse};
use crate::types::AppResult;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analysis/refresh", post(refresh_analysis))
}

/// POST /api/analysis/refresh - always a fresh remote call
async fn refresh_analysis(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<Json<StateResponse>> {
    let mode = parse_mode(body.as_ref().and_then(|Json(b)| b.mode.as_deref()))?;
    info!(%mode, "Analysis refresh requested");
    state.gateway.refresh(mode).await?;
    Ok(Json(state_response(&state.gateway.state().snapshot())))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{json_request, send, test_app};
    use crate::gateway::tests::result;
    use crate::types::AppError;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_refresh_without_dataset_is_not_found() {
        let (app, _) = test_app(vec![], Some("gsk_key"));
        let (status, body) = send(&app, json_request("POST", "/api/analysis/refresh", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_refresh_replaces_result() {
        let (app, _) = test_app(vec![Ok(result(72)), Ok(result(80))], Some("gsk_key"));
        send(&app, json_request("POST", "/api/datasets/demo", json!({}))).await;

        let (status, body) = send(
            &app,
            json_request("POST", "/api/analysis/refresh", json!({"mode": "growth_engine"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["score"], 80);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_bad_gateway_and_keeps_result() {
        let (app, state) = test_app(
            vec![Ok(result(72)), Err(AppError::Analysis("not valid JSON".into()))],
            Some("gsk_key"),
        );
        send(&app, json_request("POST", "/api/datasets/demo", json!({}))).await;

        let (status, body) = send(&app, json_request("POST", "/api/analysis/refresh", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "analysis");
        assert_eq!(state.gateway.state().snapshot().analysis.unwrap().score, 72);
    }

    #[tokio::test]
    async fn test_unknown_mode_is_bad_request() {
        let (app, _) = test_app(vec![Ok(result(72))], Some("gsk_key"));
        send(&app, json_request("POST", "/api/datasets/demo", json!({}))).await;

        let (status, _) = send(
            &app,
            json_request("POST", "/api/analysis/refresh", json!({"mode": "horoscope"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
