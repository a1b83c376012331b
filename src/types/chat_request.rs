use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Body of `POST /chat` and `POST /chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The text the user submitted.
    pub message: String,

    /// Correlates every turn of one conversation on the backend.
    pub thread_id: SessionId,
}

impl ChatRequest {
    /// Creates a new chat request.
    pub fn new(message: impl Into<String>, thread_id: SessionId) -> Self {
        Self {
            message: message.into(),
            thread_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn wire_format() {
        let thread_id: SessionId = "0b7e2d9c-3f1a-4c2e-9d4b-5a6f7e8d9c0b".parse().unwrap();
        let request = ChatRequest::new("hello", thread_id);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "message": "hello",
                "thread_id": "0b7e2d9c-3f1a-4c2e-9d4b-5a6f7e8d9c0b"
            })
        );
    }
}
