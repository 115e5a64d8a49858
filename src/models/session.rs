use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::{ChatMessage, PdfExport, Role};

/// Everything one user has loaded and said during a session.
///
/// Roles are extracted at most once per case; loading another case requires
/// `reset`. Histories are append-only apart from per-role and full resets.
#[derive(Debug)]
pub struct CaseSession {
    pub id: Uuid,
    case_text: String,
    roles: Vec<Role>,
    selected_role: Option<Uuid>,
    chats: HashMap<Uuid, Vec<ChatMessage>>,
    descriptions: HashMap<Uuid, String>,
    case_summary: String,
    roles_extracted: bool,
    pending_export: Option<PdfExport>,
}

impl Default for CaseSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            case_text: String::new(),
            roles: Vec::new(),
            selected_role: None,
            chats: HashMap::new(),
            descriptions: HashMap::new(),
            case_summary: String::new(),
            roles_extracted: false,
            pending_export: None,
        }
    }

    pub fn roles_extracted(&self) -> bool {
        self.roles_extracted
    }

    pub fn case_text(&self) -> &str {
        &self.case_text
    }

    pub fn case_summary(&self) -> &str {
        &self.case_summary
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn role(&self, role_id: Uuid) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn description(&self, role_id: Uuid) -> Option<&str> {
        self.descriptions.get(&role_id).map(String::as_str)
    }

    pub fn selected_role(&self) -> Option<&Role> {
        self.selected_role.and_then(|id| self.role(id))
    }

    /// Empty for roles that haven't spoken yet or don't exist
    pub fn history(&self, role_id: Uuid) -> &[ChatMessage] {
        self.chats.get(&role_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn history_mut(&mut self, role_id: Uuid) -> Option<&mut Vec<ChatMessage>> {
        if self.role(role_id).is_none() {
            return None;
        }
        Some(self.chats.entry(role_id).or_default())
    }

    /// Populate the session from a finished extraction. Selects the first role.
    pub fn install_case(
        &mut self,
        case_text: String,
        roles: Vec<Role>,
        case_summary: String,
        descriptions: HashMap<Uuid, String>,
    ) {
        self.chats = roles.iter().map(|r| (r.id, Vec::new())).collect();
        self.selected_role = roles.first().map(|r| r.id);
        self.case_text = case_text;
        self.roles = roles;
        self.case_summary = case_summary;
        self.descriptions = descriptions;
        self.roles_extracted = true;
    }

    /// Returns false (and changes nothing) for an unknown role.
    pub fn select_role(&mut self, role_id: Uuid) -> bool {
        if self.role(role_id).is_none() {
            return false;
        }
        self.selected_role = Some(role_id);
        true
    }

    /// Clears one role's conversation and any rendered export. Other roles
    /// and the case are untouched.
    pub fn reset_role(&mut self, role_id: Uuid) -> bool {
        match self.history_mut(role_id) {
            Some(history) => {
                history.clear();
                self.pending_export = None;
                true
            }
            None => false,
        }
    }

    /// Back to an empty session, keeping the id
    pub fn reset(&mut self) {
        let id = self.id;
        *self = Self::new();
        self.id = id;
    }

    pub fn set_export(&mut self, export: PdfExport) {
        self.pending_export = Some(export);
    }

    pub fn clear_export(&mut self) {
        self.pending_export = None;
    }

    pub fn pending_export(&self) -> Option<&PdfExport> {
        self.pending_export.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let roles = self
            .roles
            .iter()
            .map(|r| RoleView {
                id: r.id,
                name: r.name.clone(),
                title: r.title.clone(),
                label: r.label(),
                description: self.description(r.id).map(str::to_string),
                message_count: self.history(r.id).len(),
                selected: self.selected_role == Some(r.id),
            })
            .collect();

        SessionSnapshot {
            id: self.id,
            case_loaded: self.roles_extracted && !self.case_text.is_empty(),
            case_summary: self.case_summary.clone(),
            roles,
            selected_role_id: self.selected_role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub case_loaded: bool,
    pub case_summary: String,
    pub roles: Vec<RoleView>,
    pub selected_role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub label: String,
    pub description: Option<String>,
    pub message_count: usize,
    pub selected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_session() -> (CaseSession, Role, Role) {
        let maya = Role::new("Maya", "Owner");
        let jordan = Role::new("Jordan", "Barista");
        let mut session = CaseSession::new();
        let descriptions = HashMap::from([
            (maya.id, "Runs the shop.".to_string()),
            (jordan.id, "Serves customers.".to_string()),
        ]);
        session.install_case(
            "Maya runs a small coffee shop.".to_string(),
            vec![maya.clone(), jordan.clone()],
            "A coffee shop case.".to_string(),
            descriptions,
        );
        (session, maya, jordan)
    }

    #[test]
    fn install_selects_first_role_and_creates_empty_histories() {
        let (session, maya, jordan) = loaded_session();
        assert!(session.roles_extracted());
        assert_eq!(session.selected_role().map(|r| r.id), Some(maya.id));
        assert!(session.history(maya.id).is_empty());
        assert!(session.history(jordan.id).is_empty());
        assert_eq!(session.description(jordan.id), Some("Serves customers."));
    }

    #[test]
    fn switching_roles_leaves_histories_alone() {
        let (mut session, maya, jordan) = loaded_session();
        session.history_mut(maya.id).unwrap().push(ChatMessage::user("hi"));

        assert!(session.select_role(jordan.id));
        assert!(session.select_role(maya.id));

        assert_eq!(session.history(maya.id).len(), 1);
        assert!(session.history(jordan.id).is_empty());
    }

    #[test]
    fn select_unknown_role_is_a_no_op() {
        let (mut session, maya, _) = loaded_session();
        assert!(!session.select_role(Uuid::new_v4()));
        assert_eq!(session.selected_role().map(|r| r.id), Some(maya.id));
    }

    #[test]
    fn reset_role_only_clears_that_role() {
        let (mut session, maya, jordan) = loaded_session();
        session.history_mut(maya.id).unwrap().push(ChatMessage::user("a"));
        session.history_mut(jordan.id).unwrap().push(ChatMessage::user("b"));

        assert!(session.reset_role(maya.id));

        assert!(session.history(maya.id).is_empty());
        assert_eq!(session.history(jordan.id).len(), 1);
        assert_eq!(session.case_text(), "Maya runs a small coffee shop.");
    }

    #[test]
    fn reset_role_drops_rendered_export() {
        let (mut session, maya, _) = loaded_session();
        session.history_mut(maya.id).unwrap().push(ChatMessage::user("hi"));
        session.set_export(PdfExport {
            filename: "chat_Maya_Owner.pdf".to_string(),
            bytes: vec![1, 2, 3],
        });

        assert!(session.reset_role(maya.id));

        assert!(session.pending_export().is_none());
    }

    #[test]
    fn same_label_roles_keep_separate_histories() {
        let a = Role::new("Alex", "Manager");
        let b = Role::new("Alex", "Manager");
        let mut session = CaseSession::new();
        session.install_case(
            "case".to_string(),
            vec![a.clone(), b.clone()],
            String::new(),
            HashMap::new(),
        );

        session.history_mut(a.id).unwrap().push(ChatMessage::user("only a"));

        assert_eq!(session.history(a.id).len(), 1);
        assert!(session.history(b.id).is_empty());
    }

    #[test]
    fn full_reset_clears_everything_but_keeps_id() {
        let (mut session, maya, _) = loaded_session();
        let id = session.id;
        session.history_mut(maya.id).unwrap().push(ChatMessage::user("hi"));
        session.set_export(PdfExport {
            filename: "x.pdf".to_string(),
            bytes: vec![1, 2, 3],
        });

        session.reset();

        assert_eq!(session.id, id);
        assert!(!session.roles_extracted());
        assert!(session.case_text().is_empty());
        assert!(session.roles().is_empty());
        assert!(session.selected_role().is_none());
        assert!(session.history(maya.id).is_empty());
        assert!(session.pending_export().is_none());
        assert!(!session.select_role(maya.id));
    }

    #[test]
    fn snapshot_reports_counts_and_selection() {
        let (mut session, maya, jordan) = loaded_session();
        session.history_mut(jordan.id).unwrap().push(ChatMessage::user("hello"));
        session.select_role(jordan.id);

        let snap = session.snapshot();
        assert!(snap.case_loaded);
        assert_eq!(snap.selected_role_id, Some(jordan.id));
        let jordan_view = snap.roles.iter().find(|r| r.id == jordan.id).unwrap();
        assert_eq!(jordan_view.label, "Jordan (Barista)");
        assert_eq!(jordan_view.message_count, 1);
        assert!(jordan_view.selected);
        let maya_view = snap.roles.iter().find(|r| r.id == maya.id).unwrap();
        assert!(!maya_view.selected);
    }
}
