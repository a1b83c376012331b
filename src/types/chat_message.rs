use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a message in the log.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person at the keyboard.
    User,
    /// Text produced by the backend, or synthesized by the client on its behalf.
    Ai,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Ai => write!(f, "ai"),
        }
    }
}

/// One entry in the message log.
///
/// Fields are private: a message cannot be edited once it has been created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Creates a message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an ai message.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }

    /// The author of this message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text of this message.
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(
            to_value(ChatMessage::user("hello")).unwrap(),
            json!({"role": "user", "content": "hello"})
        );
        assert_eq!(
            to_value(ChatMessage::ai("hi")).unwrap(),
            json!({"role": "ai", "content": "hi"})
        );
    }

    #[test]
    fn accessors() {
        let message = ChatMessage::ai("hi");
        assert_eq!(message.role(), Role::Ai);
        assert_eq!(message.content(), "hi");
        assert_eq!(message.role().to_string(), "ai");
    }
}
