use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CaseSession, ChatTurnResult, ExportStatus, SessionSnapshot};
use crate::services::ai_service;
use crate::services::config_service::ContextPolicy;
use crate::services::llm_client::ChatModel;
use crate::services::pdf_service;

pub const EMPTY_CASE_MESSAGE: &str = "Please upload a file or paste text first!";
pub const EMPTY_EXPORT_MESSAGE: &str = "No messages to export";

pub type SharedSession = Arc<Mutex<CaseSession>>;

/// Live sessions by id. Each action locks its session until it finishes,
/// model calls included, so one session never sees interleaved actions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> AppResult<Uuid> {
        let session = CaseSession::new();
        let id = session.id;
        self.write()?.insert(id, Arc::new(Mutex::new(session)));
        tracing::info!("Created session {}", id);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> AppResult<SharedSession> {
        self.sessions
            .read()
            .map_err(|_| AppError::Internal("session registry poisoned".to_string()))?
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("session {}", id)))
    }

    /// Returns whether the session existed.
    pub fn destroy(&self, id: Uuid) -> AppResult<bool> {
        let removed = self.write()?.remove(&id).is_some();
        if removed {
            tracing::info!("Destroyed session {}", id);
        }
        Ok(removed)
    }

    fn write(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, SharedSession>>> {
        self.sessions
            .write()
            .map_err(|_| AppError::Internal("session registry poisoned".to_string()))
    }
}

/// "Load & Extract Roles".
///
/// Rejects empty input without touching the session. Once roles have been
/// extracted the session is left as is until it is reset.
pub async fn load_case(
    model: &dyn ChatModel,
    session: &mut CaseSession,
    case_text: &str,
) -> AppResult<SessionSnapshot> {
    let case_text = case_text.trim();
    if case_text.is_empty() {
        return Err(AppError::validation(EMPTY_CASE_MESSAGE));
    }

    if session.roles_extracted() {
        tracing::info!("Session {} already has roles; reset to load a new case", session.id);
        return Ok(session.snapshot());
    }

    tracing::info!("Loading case ({} chars) into session {}", case_text.len(), session.id);

    let roles = ai_service::extract_roles(model, case_text).await;
    let summary = ai_service::summarize_case(model, case_text).await;

    let mut descriptions = HashMap::with_capacity(roles.len());
    for role in &roles {
        descriptions.insert(role.id, ai_service::describe_role(model, role, case_text).await);
    }

    session.install_case(case_text.to_string(), roles, summary, descriptions);
    Ok(session.snapshot())
}

/// Send a message to the selected role.
///
/// `Ok(None)` when nothing is selected (for example right after a reset).
pub async fn send_message(
    model: &dyn ChatModel,
    policy: ContextPolicy,
    session: &mut CaseSession,
    user_text: &str,
) -> AppResult<Option<ChatTurnResult>> {
    let Some(role) = session.selected_role().cloned() else {
        return Ok(None);
    };
    if user_text.trim().is_empty() {
        return Err(AppError::validation("Message is empty"));
    }

    let case_text = session.case_text().to_string();
    let history = session
        .history_mut(role.id)
        .ok_or_else(|| AppError::not_found(format!("role {}", role.id)))?;

    let reply =
        ai_service::roleplay_turn(model, policy, &role, &case_text, history, user_text).await?;

    Ok(Some(ChatTurnResult {
        reply,
        history: session.history(role.id).to_vec(),
    }))
}

/// Render the role's transcript and keep it on the session for saving.
pub fn export_role_chat(session: &mut CaseSession, role_id: Uuid) -> AppResult<ExportStatus> {
    let role = session
        .role(role_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("role {}", role_id)))?;

    match pdf_service::export_chat(&role.label(), session.history(role_id))? {
        Some(export) => {
            let status = ExportStatus::ready(&export);
            session.set_export(export);
            Ok(status)
        }
        None => {
            tracing::info!("Nothing to export for {}", role.label());
            session.clear_export();
            Ok(ExportStatus::warning(EMPTY_EXPORT_MESSAGE))
        }
    }
}
