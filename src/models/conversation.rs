use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hello! I'm a SQL assistant. Ask me anything about your database.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl Role {
    /// Speaker label used when rendering history into prompts
    pub fn label(&self) -> &'static str {
        match self {
            Role::Human => "Human",
            Role::Assistant => "AI",
        }
    }
}

/// One message in a conversation. Fields are private so a turn cannot be
/// edited after it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Role::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Append-only chat history, seeded with the assistant greeting
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_seeded_with_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        let first = &conversation.turns()[0];
        assert_eq!(first.role(), Role::Assistant);
        assert_eq!(first.text(), GREETING);
    }

    #[test]
    fn test_push_keeps_order() {
        let mut conversation = Conversation::new();
        conversation.push(Turn::human("How many albums?"));
        conversation.push(Turn::assistant("347"));

        let roles: Vec<Role> = conversation.turns().iter().map(Turn::role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::Human, Role::Assistant]);
        assert_eq!(conversation.last().unwrap().text(), "347");
    }

    #[test]
    fn test_turn_serializes_role_in_lowercase() {
        let json = serde_json::to_value(Turn::human("hi")).unwrap();
        assert_eq!(json["role"], "human");
        assert_eq!(json["text"], "hi");
    }
}
