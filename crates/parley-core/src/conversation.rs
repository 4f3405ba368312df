//! Conversation turns and the view boundary
//!
//! Turns are owned by whatever renders them. [`ChatView`] is the seam between
//! the widget controller and that rendering layer; [`Conversation`] is a
//! ready-made turn list that views can embed.

use crate::speech::RecognitionState;
use chrono::{DateTime, Utc};
use parley_common::{Role, TurnId};
use serde::{Deserialize, Serialize};

/// One message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub role: Role,
    /// Text as currently shown; bot turns grow while streaming
    pub displayed_text: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    /// A bot turn starts empty, which views show as a typing indicator
    pub fn bot() -> Self {
        Self::new(Role::Bot, String::new())
    }

    fn new(role: Role, displayed_text: String) -> Self {
        Self {
            id: TurnId::new(),
            role,
            displayed_text,
            created_at: Utc::now(),
        }
    }

    pub fn is_typing(&self) -> bool {
        self.role == Role::Bot && self.displayed_text.is_empty()
    }
}

/// Ordered list of turns. Turns are never removed.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Replace a turn's text; returns false for unknown ids
    pub fn set_text(&mut self, id: TurnId, text: &str) -> bool {
        match self.turns.iter_mut().find(|t| t.id == id) {
            Some(turn) => {
                turn.displayed_text.clear();
                turn.displayed_text.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id == id)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Bot turns, oldest first
    pub fn bot_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().filter(|t| t.role == Role::Bot)
    }

    pub fn last_bot_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::Bot)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Rendering layer as seen by the widget controller
pub trait ChatView: Send {
    /// A new turn was created
    fn append_turn(&mut self, turn: &ConversationTurn);

    /// A bot turn's text changed; `text` is the full new text
    fn update_turn(&mut self, id: TurnId, text: &str);

    /// Current text of a turn, if the view still has it
    fn turn_text(&self, id: TurnId) -> Option<String>;

    /// Enable or disable the input field, send control and mic control together
    fn set_input_enabled(&mut self, enabled: bool);

    /// Replace the contents of the input field
    fn set_input_text(&mut self, text: &str);

    /// The speak control of a finished bot turn becomes available
    fn show_speak_control(&mut self, id: TurnId);

    /// Show or hide the microphone affordance
    fn set_mic_visible(&mut self, visible: bool);

    /// Reflect the recognition state on the microphone affordance
    fn set_mic_state(&mut self, state: &RecognitionState);

    /// Blocking notice to the user
    fn alert(&mut self, message: &str);

    fn focus_input(&mut self) {}

    fn scroll_to_bottom(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_turn_starts_typing() {
        let turn = ConversationTurn::bot();
        assert!(turn.is_typing());
        assert!(!ConversationTurn::user("hi").is_typing());
    }

    #[test]
    fn test_conversation_updates_in_place() {
        let mut conversation = Conversation::new();
        let user = ConversationTurn::user("question");
        let bot = ConversationTurn::bot();
        let bot_id = bot.id;
        conversation.push(user);
        conversation.push(bot);

        assert!(conversation.set_text(bot_id, "partial"));
        assert!(conversation.set_text(bot_id, "partial answer"));
        assert_eq!(conversation.get(bot_id).unwrap().displayed_text, "partial answer");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last_bot_turn().unwrap().id, bot_id);
        assert!(!conversation.set_text(TurnId::new(), "nope"));
    }

    #[test]
    fn test_bot_turns_in_order() {
        let mut conversation = Conversation::new();
        let first = ConversationTurn::bot();
        let second = ConversationTurn::bot();
        let ids = (first.id, second.id);
        conversation.push(ConversationTurn::user("a"));
        conversation.push(first);
        conversation.push(ConversationTurn::user("b"));
        conversation.push(second);

        let bots: Vec<TurnId> = conversation.bot_turns().map(|t| t.id).collect();
        assert_eq!(bots, vec![ids.0, ids.1]);
    }
}
