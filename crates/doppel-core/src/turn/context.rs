//! Gateway context assembly for a conversational turn.
//!
//! The window is the last [`CONTEXT_WINDOW`] log messages; system-role
//! messages (analysis notes and similar) never reach the model. When a
//! profile exists, its context block is prepended to exactly one turn:
//! the first windowed message, or the outgoing message itself when the
//! window is empty.

use doppel_types::gateway::{ChatTurn, TurnRole};
use doppel_types::profile::Profile;
use doppel_types::session::{ChatMessage, MessageRole};

/// Maximum log messages sent as context per turn.
pub const CONTEXT_WINDOW: usize = 20;

/// Assembled gateway input for one turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub history: Vec<ChatTurn>,
    pub message: ChatTurn,
}

/// Convert a log message to a gateway turn.
pub fn to_turn(message: &ChatMessage) -> ChatTurn {
    let role = match message.role {
        MessageRole::User => TurnRole::User,
        _ => TurnRole::Model,
    };
    ChatTurn {
        role,
        text: message.text.clone(),
        attachment: message.attachment.clone(),
    }
}

/// Build the context for a turn from the log, the outgoing message, and
/// the profile (if non-empty).
pub fn assemble(log: &[ChatMessage], outgoing: ChatTurn, profile: Option<&Profile>) -> TurnContext {
    let mut history: Vec<ChatTurn> = log
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .rev()
        .take(CONTEXT_WINDOW)
        .map(to_turn)
        .collect();
    history.reverse();

    let mut message = outgoing;
    if let Some(block) = profile.and_then(Profile::context_block) {
        match history.first_mut() {
            Some(first) => first.text = format!("{block}\n\n{}", first.text),
            None => message.text = format!("{block}\n\n{}", message.text),
        }
    }

    TurnContext { history, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("msg {i}"))
                } else {
                    ChatMessage::model(format!("msg {i}"))
                }
            })
            .collect()
    }

    fn profile_with_values() -> Profile {
        let mut profile = Profile::default();
        profile.values.push("honesty".to_string());
        profile
    }

    #[test]
    fn test_window_keeps_most_recent_messages_in_order() {
        let log = log_of(30);
        let ctx = assemble(&log, ChatTurn::user("next"), None);
        assert_eq!(ctx.history.len(), CONTEXT_WINDOW);
        assert_eq!(ctx.history[0].text, "msg 10");
        assert_eq!(ctx.history.last().unwrap().text, "msg 29");
        assert_eq!(ctx.message.text, "next");
    }

    #[test]
    fn test_system_messages_are_excluded() {
        let mut log = log_of(4);
        log.insert(2, ChatMessage::system("Profile updated."));
        let ctx = assemble(&log, ChatTurn::user("next"), None);
        assert_eq!(ctx.history.len(), 4);
        assert!(ctx.history.iter().all(|t| !t.text.contains("Profile updated")));
    }

    #[test]
    fn test_profile_block_prepended_to_first_windowed_message_only() {
        let log = log_of(6);
        let profile = profile_with_values();
        let ctx = assemble(&log, ChatTurn::user("next"), Some(&profile));

        assert!(ctx.history[0].text.contains("personality profile"));
        assert!(ctx.history[0].text.ends_with("msg 0"));
        let mentions = ctx
            .history
            .iter()
            .filter(|t| t.text.contains("personality profile"))
            .count();
        assert_eq!(mentions, 1);
        assert!(!ctx.message.text.contains("personality profile"));
    }

    #[test]
    fn test_profile_block_lands_on_outgoing_when_log_empty() {
        let profile = profile_with_values();
        let ctx = assemble(&[], ChatTurn::user("first words"), Some(&profile));
        assert!(ctx.history.is_empty());
        assert!(ctx.message.text.contains("personality profile"));
        assert!(ctx.message.text.ends_with("first words"));
    }

    #[test]
    fn test_empty_profile_injects_nothing() {
        let log = log_of(2);
        let profile = Profile::default();
        let ctx = assemble(&log, ChatTurn::user("next"), Some(&profile));
        assert_eq!(ctx.history[0].text, "msg 0");
        assert_eq!(ctx.message.text, "next");
    }

    #[test]
    fn test_roles_map_user_and_model() {
        let log = log_of(2);
        let ctx = assemble(&log, ChatTurn::user("next"), None);
        assert_eq!(ctx.history[0].role, TurnRole::User);
        assert_eq!(ctx.history[1].role, TurnRole::Model);
    }
}
