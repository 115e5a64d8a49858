use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{ChatMessage, Role};
use crate::services::config_service::ContextPolicy;
use crate::services::llm_client::{self, ChatModel, LlmClient};

// ============================================================================
// PROMPTS
// ============================================================================

const ROLE_EXTRACTION_PROMPT: &str = r#"You are an expert case-study analyzer.

Extract ONLY the meaningful human roles in the case study.

VALID ROLES TO RETURN:
1. Named individuals (e.g., Maya, Jordan)
2. Essential operational human roles explicitly mentioned (e.g., Barista)

DO NOT RETURN:
- Customer / customers
- Mobile order customers
- POS operators
- Cashier (unless explicitly named as a character)
- Inventory managers (unless named)
- Quality check staff
- Any system/device role
- Any implied generic role

RETURN STRICT JSON ONLY:

{
  "roles": [
    {"name": "Person Name or Role", "title": "Their Title"}
  ]
}

RULES:
- If a name & title appear:
      "Maya, the owner" -> {"name": "Maya", "title": "Owner"}
- If only a role appears and it's valid (Barista):
      {"name": "Barista", "title": "Barista"}

DO NOT include customers or other generic roles."#;

const CASE_SUMMARY_PROMPT: &str = r#"You are analyzing a case study to provide a brief overview.

Provide a 2-3 sentence summary that captures:
1. The main situation or context
2. The primary challenge or issue
3. What needs to be addressed

Keep it concise and neutral. Return ONLY the summary text, no extra formatting."#;

pub const CASE_SUMMARY_FALLBACK: &str =
    "A business case study scenario requiring analysis and decision-making.";

fn role_description_prompt(role: &Role) -> String {
    format!(
        r#"You are analyzing a case study to provide a brief description of a specific role.

Role: {label}

Based on the case study, provide a 2-3 sentence description of this role that includes:
1. Their main responsibilities or position
2. Their key challenges or concerns in the case
3. Their relevance to the scenario

Keep it concise and factual. Return ONLY the description text, no extra formatting."#,
        label = role.label()
    )
}

pub fn role_description_fallback(role: &Role) -> String {
    format!("{} is a key stakeholder in this case study.", role.name)
}

/// System instruction for a roleplay conversation: who the model is, how it
/// introduces itself, and the full case it must stay grounded in.
pub fn build_roleplay_prompt(role: &Role, case_text: &str) -> String {
    format!(
        r#"You are **{label}**.

INTRODUCTION RULE:
If the user greets you or asks who you are, you MUST:
- Introduce yourself (name + title)
- Describe your responsibilities based on the case study
- Explain your concerns, priorities, and involvement

Use only facts from the case study.

CASE STUDY:
{case_text}"#,
        label = role.label(),
        case_text = case_text
    )
}

// ============================================================================
// FALLBACK POLICY
// ============================================================================

/// Substitute a static value for a failed call, logging what was swallowed.
fn or_fallback<T>(result: AppResult<T>, call_site: &str, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("[{}] using fallback: {}", call_site, e);
            fallback()
        }
    }
}

// ============================================================================
// ROLE EXTRACTION
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExtractedRoles {
    roles: Vec<ExtractedRole>,
}

#[derive(Debug, Deserialize)]
struct ExtractedRole {
    name: String,
    title: String,
}

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```(?:json)?\s*([\s\S]*?)\s*```$").expect("code fence pattern is valid")
});

/// Decode `{"roles": [{"name", "title"}, ...]}`. A single enclosing Markdown
/// code fence is tolerated; anything else off-shape (including an empty list)
/// is rejected.
fn parse_roles_reply(raw: &str) -> Option<Vec<Role>> {
    let trimmed = raw.trim();
    let json = CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let parsed: ExtractedRoles = serde_json::from_str(json).ok()?;
    if parsed.roles.is_empty() {
        return None;
    }

    Some(
        parsed
            .roles
            .into_iter()
            .map(|r| Role::new(r.name, r.title))
            .collect(),
    )
}

/// Ask the model who is in the case. Never empty: any failure, whether the
/// call itself or the shape of the reply, yields the single fallback role.
pub async fn extract_roles(model: &dyn ChatModel, case_text: &str) -> Vec<Role> {
    let messages = vec![
        LlmClient::system_message(ROLE_EXTRACTION_PROMPT),
        LlmClient::user_message(case_text),
    ];

    let reply = or_fallback(
        model.chat_completion(messages).await.map(Some),
        "extract_roles",
        || None,
    );

    match reply.as_deref().and_then(parse_roles_reply) {
        Some(roles) => {
            tracing::info!("Extracted {} roles", roles.len());
            roles
        }
        None => {
            if reply.is_some() {
                tracing::warn!(
                    "[extract_roles] reply was not the expected JSON, using fallback role"
                );
            }
            vec![Role::fallback()]
        }
    }
}

// ============================================================================
// DESCRIPTIONS
// ============================================================================

pub async fn describe_role(model: &dyn ChatModel, role: &Role, case_text: &str) -> String {
    let messages = vec![
        LlmClient::system_message(&role_description_prompt(role)),
        LlmClient::user_message(case_text),
    ];

    or_fallback(
        model
            .chat_completion(messages)
            .await
            .map(|r| r.trim().to_string()),
        "describe_role",
        || role_description_fallback(role),
    )
}

pub async fn summarize_case(model: &dyn ChatModel, case_text: &str) -> String {
    let messages = vec![
        LlmClient::system_message(CASE_SUMMARY_PROMPT),
        LlmClient::user_message(case_text),
    ];

    or_fallback(
        model
            .chat_completion(messages)
            .await
            .map(|r| r.trim().to_string()),
        "summarize_case",
        || CASE_SUMMARY_FALLBACK.to_string(),
    )
}

// ============================================================================
// ROLEPLAY
// ============================================================================

fn to_wire(message: &ChatMessage) -> llm_client::ChatMessage {
    llm_client::ChatMessage {
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
    }
}

/// One conversational turn with `role`.
///
/// The user message is recorded before the call. On success the reply is
/// appended (history grows by two); on failure the user message stays,
/// flagged `failed`, and the error is returned (history grows by one).
pub async fn roleplay_turn(
    model: &dyn ChatModel,
    policy: ContextPolicy,
    role: &Role,
    case_text: &str,
    history: &mut Vec<ChatMessage>,
    user_text: &str,
) -> AppResult<String> {
    history.push(ChatMessage::user(user_text));

    let mut messages = vec![LlmClient::system_message(&build_roleplay_prompt(role, case_text))];
    messages.extend(policy.apply(history.as_slice()).iter().map(to_wire));

    match model.chat_completion(messages).await {
        Ok(reply) => {
            history.push(ChatMessage::assistant(&reply));
            Ok(reply)
        }
        Err(e) => {
            tracing::warn!("Chat with {} failed: {}", role.label(), e);
            if let Some(last) = history.last_mut() {
                last.failed = true;
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Sender, FALLBACK_ROLE_NAME};
    use crate::services::testing::ScriptedModel;

    const COFFEE_CASE: &str =
        "Maya runs a small coffee shop. A barista named Jordan serves customers.";

    fn is_single_fallback(roles: &[Role]) -> bool {
        roles.len() == 1
            && roles[0].name == FALLBACK_ROLE_NAME
            && roles[0].title == FALLBACK_ROLE_NAME
    }

    #[tokio::test]
    async fn extracts_named_roles_without_customers() {
        let model = ScriptedModel::new().reply(
            r#"{"roles": [{"name": "Maya", "title": "Owner"}, {"name": "Jordan", "title": "Barista"}]}"#,
        );

        let roles = extract_roles(&model, COFFEE_CASE).await;

        let labels: Vec<String> = roles.iter().map(Role::label).collect();
        assert_eq!(labels, vec!["Maya (Owner)", "Jordan (Barista)"]);
        assert!(!roles.iter().any(|r| r.name.to_lowercase().contains("customer")));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, "system");
        assert!(requests[0][0].content.contains("DO NOT RETURN"));
        assert_eq!(requests[0][1].content, COFFEE_CASE);
    }

    #[tokio::test]
    async fn malformed_reply_gives_fallback_role() {
        let model = ScriptedModel::new().reply("Sure! The roles are Maya and Jordan.");
        assert!(is_single_fallback(&extract_roles(&model, COFFEE_CASE).await));
    }

    #[tokio::test]
    async fn wrong_shape_gives_fallback_role() {
        let model = ScriptedModel::new().reply(r#"{"people": ["Maya"]}"#);
        assert!(is_single_fallback(&extract_roles(&model, COFFEE_CASE).await));

        let model = ScriptedModel::new().reply(r#"{"roles": [{"name": "Maya"}]}"#);
        assert!(is_single_fallback(&extract_roles(&model, COFFEE_CASE).await));
    }

    #[tokio::test]
    async fn empty_role_list_gives_fallback_role() {
        let model = ScriptedModel::new().reply(r#"{"roles": []}"#);
        assert!(is_single_fallback(&extract_roles(&model, COFFEE_CASE).await));
    }

    #[tokio::test]
    async fn failed_call_gives_fallback_role() {
        let model = ScriptedModel::new().fail(500);
        assert!(is_single_fallback(&extract_roles(&model, COFFEE_CASE).await));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let roles = parse_roles_reply(
            "```json\n{\"roles\": [{\"name\": \"Maya\", \"title\": \"Owner\"}]}\n```",
        )
        .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].label(), "Maya (Owner)");
    }

    #[tokio::test]
    async fn description_is_trimmed_and_falls_back() {
        let maya = Role::new("Maya", "Owner");

        let model = ScriptedModel::new().reply("  Maya owns the shop.  \n");
        assert_eq!(describe_role(&model, &maya, COFFEE_CASE).await, "Maya owns the shop.");
        assert!(model.requests()[0][0].content.contains("Role: Maya (Owner)"));

        let model = ScriptedModel::new().fail(500);
        assert_eq!(
            describe_role(&model, &maya, COFFEE_CASE).await,
            "Maya is a key stakeholder in this case study."
        );
    }

    #[tokio::test]
    async fn summary_falls_back() {
        let model = ScriptedModel::new().fail(502);
        assert_eq!(summarize_case(&model, COFFEE_CASE).await, CASE_SUMMARY_FALLBACK);
    }

    #[test]
    fn roleplay_prompt_embeds_identity_and_case() {
        let prompt = build_roleplay_prompt(&Role::new("Jordan", "Barista"), COFFEE_CASE);
        assert!(prompt.contains("You are **Jordan (Barista)**"));
        assert!(prompt.contains("INTRODUCTION RULE"));
        assert!(prompt.ends_with(COFFEE_CASE));
    }

    #[tokio::test]
    async fn two_turns_append_four_messages() {
        let jordan = Role::new("Jordan", "Barista");
        let model = ScriptedModel::new().reply("Hi, I'm Jordan.").reply("We get busy at 8.");
        let mut history = Vec::new();

        roleplay_turn(&model, ContextPolicy::Full, &jordan, COFFEE_CASE, &mut history, "Hello")
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        let first_turn: Vec<(Sender, String)> =
            history.iter().map(|m| (m.role, m.content.clone())).collect();

        let reply = roleplay_turn(
            &model,
            ContextPolicy::Full,
            &jordan,
            COFFEE_CASE,
            &mut history,
            "When is rush hour?",
        )
        .await
        .unwrap();
        assert_eq!(reply, "We get busy at 8.");
        assert_eq!(history.len(), 4);

        let after: Vec<(Sender, String)> =
            history[..2].iter().map(|m| (m.role, m.content.clone())).collect();
        assert_eq!(first_turn, after);

        // Second request carries the system prompt plus the whole history so far
        let second = &model.requests()[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, "system");
        assert_eq!(second[1].content, "Hello");
        assert_eq!(second[2].role, "assistant");
        assert_eq!(second[3].content, "When is rush hour?");
    }

    #[tokio::test]
    async fn failed_turn_keeps_flagged_user_message() {
        let jordan = Role::new("Jordan", "Barista");
        let model = ScriptedModel::new().fail(500);
        let mut history = Vec::new();

        let err =
            roleplay_turn(&model, ContextPolicy::Full, &jordan, COFFEE_CASE, &mut history, "Hello")
                .await
                .unwrap_err();

        assert!(matches!(err, AppError::Llm { status: 500, .. }));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Sender::User);
        assert!(history[0].failed);
    }

    #[tokio::test]
    async fn sliding_window_limits_what_is_sent() {
        let jordan = Role::new("Jordan", "Barista");
        let model = ScriptedModel::new().reply("one").reply("two");
        let mut history = Vec::new();
        let policy = ContextPolicy::SlidingWindow(2);

        roleplay_turn(&model, policy, &jordan, COFFEE_CASE, &mut history, "first").await.unwrap();
        roleplay_turn(&model, policy, &jordan, COFFEE_CASE, &mut history, "second").await.unwrap();

        // Stored history is complete, the request is not
        assert_eq!(history.len(), 4);
        let second = &model.requests()[1];
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].content, "one");
        assert_eq!(second[2].content, "second");
    }
}
