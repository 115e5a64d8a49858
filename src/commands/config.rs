use crate::services::config_service::ConfigView;
use crate::state::AppState;
use tauri::State;

#[tauri::command]
pub fn get_config(state: State<'_, AppState>) -> ConfigView {
    ConfigView::from(&state.config)
}
