use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// The greeting every new log starts with.
pub const GREETING: &str = "Hello, I'm Vera, an AI Research Agent. How can I assist you today?";

/// Ordered, append-only conversation log.
///
/// There is no way to remove or edit an entry; reads never mutate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    /// Creates a log holding only the greeting.
    pub fn seeded() -> Self {
        Self {
            entries: vec![ChatMessage::ai(GREETING)],
        }
    }

    /// Appends a message and returns a reference to the stored entry.
    pub fn append(&mut self, message: ChatMessage) -> &ChatMessage {
        self.entries.push(message);
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Entries appended at or after `index`.
    ///
    /// An index past the end yields an empty slice.
    pub fn since(&self, index: usize) -> &[ChatMessage] {
        self.entries.get(index..).unwrap_or(&[])
    }

    /// The newest entry.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a seeded log.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the entries in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.entries.iter()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn seeded_with_greeting() {
        let log = MessageLog::seeded();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].role(), Role::Ai);
        assert_eq!(log.entries()[0].content(), GREETING);
    }

    #[test]
    fn append_preserves_order() {
        let mut log = MessageLog::seeded();
        log.append(ChatMessage::user("one"));
        let last = log.append(ChatMessage::ai("two"));
        assert_eq!(last.content(), "two");

        let contents: Vec<_> = log.iter().map(ChatMessage::content).collect();
        assert_eq!(contents, vec![GREETING, "one", "two"]);
    }

    #[test]
    fn since_returns_tail() {
        let mut log = MessageLog::seeded();
        let mark = log.len();
        log.append(ChatMessage::user("one"));
        log.append(ChatMessage::ai("two"));
        assert_eq!(log.since(mark).len(), 2);
        assert_eq!(log.since(mark)[0].content(), "one");
        assert!(log.since(99).is_empty());
    }
}
