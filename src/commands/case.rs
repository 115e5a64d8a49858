use std::path::Path;

use crate::models::SessionSnapshot;
use crate::services::{file_service, session_service};
use crate::state::AppState;
use tauri::State;
use uuid::Uuid;

#[tauri::command]
pub fn create_session(state: State<'_, AppState>) -> Result<Uuid, String> {
    Ok(state.sessions.create()?)
}

#[tauri::command]
pub fn destroy_session(state: State<'_, AppState>, session_id: Uuid) -> Result<bool, String> {
    Ok(state.sessions.destroy(session_id)?)
}

#[tauri::command]
pub async fn get_session(
    state: State<'_, AppState>,
    session_id: Uuid,
) -> Result<SessionSnapshot, String> {
    let shared = state.sessions.get(session_id)?;
    let session = shared.lock().await;
    Ok(session.snapshot())
}

/// An uploaded file wins over pasted text.
#[tauri::command]
pub async fn load_case(
    state: State<'_, AppState>,
    session_id: Uuid,
    file_path: Option<String>,
    text: Option<String>,
) -> Result<SessionSnapshot, String> {
    let case_text = match file_path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => file_service::read_case_file(Path::new(path))?,
        None => text.unwrap_or_default(),
    };

    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    Ok(session_service::load_case(state.model.as_ref(), &mut session, &case_text).await?)
}

/// "Reset All & Load New Case"
#[tauri::command]
pub async fn reset_session(
    state: State<'_, AppState>,
    session_id: Uuid,
) -> Result<SessionSnapshot, String> {
    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    session.reset();
    tracing::info!("Reset session {}", session_id);
    Ok(session.snapshot())
}
