use crate::error::AppError;
use crate::models::ExportStatus;
use crate::services::session_service;
use crate::state::AppState;
use tauri::State;
use uuid::Uuid;

/// Render the role's transcript. An empty history comes back as a warning.
#[tauri::command]
pub async fn export_chat_pdf(
    state: State<'_, AppState>,
    session_id: Uuid,
    role_id: Uuid,
) -> Result<ExportStatus, String> {
    let shared = state.sessions.get(session_id)?;
    let mut session = shared.lock().await;
    // Printing drives a browser synchronously
    Ok(tokio::task::block_in_place(|| {
        session_service::export_role_chat(&mut session, role_id)
    })?)
}

/// Write the last rendered transcript to the path the user picked.
#[tauri::command]
pub async fn save_chat_export(
    state: State<'_, AppState>,
    session_id: Uuid,
    output_path: String,
) -> Result<(), String> {
    let shared = state.sessions.get(session_id)?;
    let session = shared.lock().await;
    let export = session
        .pending_export()
        .ok_or_else(|| AppError::not_found("no rendered export; export the chat first"))?;

    std::fs::write(&output_path, &export.bytes).map_err(AppError::from)?;
    tracing::info!("Saved {} to {}", export.filename, output_path);
    Ok(())
}
