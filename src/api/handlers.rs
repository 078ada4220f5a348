use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use uuid::Uuid;

use super::page::INDEX_HTML;
use super::types::{EndResponse, MessageRequest, MessageResponse, SessionView};
use super::ServerState;
use crate::conversation::Session;
use crate::ui::{self, Rendered};

type HandlerError = (StatusCode, String);

fn unknown_session(id: &Uuid) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Unknown session: {id}"))
}

/// Serves the chat page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Starts a session seeded from `chat_history.json`
///
/// # Returns
/// * `201` with the new session id and its seeded transcript
/// * `500` if the seed file exists but cannot be loaded
pub async fn create_session(
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<SessionView>), HandlerError> {
    let session = Session::start(state.provider.clone(), state.store.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let view = SessionView {
        id: session.id(),
        messages: session.transcript().messages().to_vec(),
    };
    state.sessions.open(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the transcript of a live session
pub async fn get_session(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, HandlerError> {
    let session = state.sessions.get(&id).await.ok_or_else(|| unknown_session(&id))?;
    let session = session.lock().await;
    if session.is_closed() {
        return Err(unknown_session(&id));
    }
    Ok(Json(SessionView {
        id,
        messages: session.transcript().messages().to_vec(),
    }))
}

/// Runs one turn on a live session
///
/// # Returns
/// * `200` with the reply and the updated transcript
/// * `400` for an empty or whitespace-only message
/// * `404` for an unknown or ended session
/// * `502` with the error banner when the model call fails
pub async fn send_message(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, HandlerError> {
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is empty".to_string()));
    }

    let session = state.sessions.get(&id).await.ok_or_else(|| unknown_session(&id))?;
    let mut session = session.lock().await;
    // Ended or expired between the lookup and the lock.
    if session.is_closed() {
        return Err(unknown_session(&id));
    }

    match ui::respond(&mut session, &req.content).await {
        Rendered::Reply(reply) => Ok(Json(MessageResponse {
            reply,
            messages: session.transcript().messages().to_vec(),
        })),
        Rendered::Error(banner) => Err((StatusCode::BAD_GATEWAY, banner)),
    }
}

/// Ends a session and writes its transcript to disk
pub async fn end_session(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EndResponse>, HandlerError> {
    match state.sessions.close(&id).await {
        Ok(Some(path)) => Ok(Json(EndResponse {
            saved_to: path.display().to_string(),
        })),
        Ok(None) => Err(unknown_session(&id)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
