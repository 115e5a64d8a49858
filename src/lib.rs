mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use commands::*;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "case_roleplay=info,case_roleplay_lib=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();

    // The API key has no built-in default
    let state = match AppState::from_environment() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Startup aborted: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            // Config commands
            get_config,
            // Session commands
            create_session,
            destroy_session,
            get_session,
            load_case,
            reset_session,
            // Chat commands
            select_role,
            get_role_history,
            send_chat_message,
            reset_role_chat,
            // Export commands
            export_chat_pdf,
            save_chat_export,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
