use crate::models::{ChatMessage, ChatTurnResult, SessionSnapshot};
use crate::services::session_service;
use crate::state::AppState;
use tauri::State;
use uuid::Uuid;

/// Unknown roles (or no case loaded) leave the selection unchanged.
#[tauri::command]
pub async fn select_role(
    state: State<'_, AppState>,
    session_id: Uuid,
    role_id: Uuid,
) -> Result<SessionSnapshot, String> {
    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    session.select_role(role_id);
    Ok(session.snapshot())
}

#[tauri::command]
pub async fn get_role_history(
    state: State<'_, AppState>,
    session_id: Uuid,
    role_id: Uuid,
) -> Result<Vec<ChatMessage>, String> {
    let shared = state.sessions.get(session_id)?;
    let session = shared.lock().await;
    Ok(session.history(role_id).to_vec())
}

/// `None` when no role is selected.
#[tauri::command]
pub async fn send_chat_message(
    state: State<'_, AppState>,
    session_id: Uuid,
    message: String,
) -> Result<Option<ChatTurnResult>, String> {
    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    Ok(session_service::send_message(
        state.model.as_ref(),
        state.config.context_policy,
        &mut session,
        &message,
    )
    .await?)
}

#[tauri::command]
pub async fn reset_role_chat(
    state: State<'_, AppState>,
    session_id: Uuid,
    role_id: Uuid,
) -> Result<SessionSnapshot, String> {
    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    session.reset_role(role_id);
    Ok(session.snapshot())
}
