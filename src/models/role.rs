use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FALLBACK_ROLE_NAME: &str = "General Role";

/// A person (or essential job function) from the case that can be role-played.
///
/// `id` is the lookup key for everything role-scoped. The label is display
/// text only, so two roles that format to the same label stay separate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub title: String,
}

impl Role {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            title: title.into(),
        }
    }

    /// Substitute used when the extraction reply can't be used.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_ROLE_NAME, FALLBACK_ROLE_NAME)
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_combines_name_and_title() {
        let role = Role::new("Maya", "Owner");
        assert_eq!(role.label(), "Maya (Owner)");
    }

    #[test]
    fn same_label_roles_get_distinct_ids() {
        let a = Role::new("Alex", "Manager");
        let b = Role::new("Alex", "Manager");
        assert_eq!(a.label(), b.label());
        assert_ne!(a.id, b.id);
    }
}
