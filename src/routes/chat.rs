use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use crate::chat::ChatSession;
use crate::models::{AppState, ChatMessage, ChatRequest, ChatResponse};
use crate::state::DashboardSnapshot;
use crate::types::AppResult;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", get(get_chat).post(post_chat).delete(reset_chat))
}

/// Bring the session in line with the given snapshot before touching it.
fn sync_session(snapshot: &DashboardSnapshot, session: &mut ChatSession) {
    if session.sync(snapshot.dataset.as_deref(), snapshot.revision) {
        info!(revision = snapshot.revision, "Chat re-mounted for new dataset");
    }
}

async fn get_chat(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let mut session = state.chat.lock().await;
    sync_session(&state.gateway.state().snapshot(), &mut session);
    Json(session.history().to_vec())
}

pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let mut session = state.chat.lock().await;
    // one snapshot for both the greeting and the excerpt
    let snapshot = state.gateway.state().snapshot();
    sync_session(&snapshot, &mut session);

    let credential = state.credentials.current().await;
    let reply = session
        .send(
            state.gateway.reasoning(),
            &request.message,
            snapshot.dataset.as_deref(),
            credential.as_ref(),
        )
        .await?
        .clone();

    Ok(Json(ChatResponse {
        reply,
        history: session.history().to_vec(),
    }))
}

async fn reset_chat(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    let snapshot = state.gateway.state().snapshot();
    let mut session = state.chat.lock().await;
    *session = ChatSession::mount(snapshot.dataset.as_deref(), snapshot.revision);
    Json(session.history().to_vec())
}
