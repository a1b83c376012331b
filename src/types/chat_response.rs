use serde::{Deserialize, Serialize};

/// Successful reply from `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    /// The agent's answer.
    pub response: String,

    /// Thread the backend filed the turn under. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ChatResponse {
    /// Creates a response carrying only the answer text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            thread_id: None,
        }
    }
}

/// Payload of one `data:` line on `POST /chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamToken {
    /// A fragment of the answer.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn response_without_thread_id() {
        let response: ChatResponse = from_value(json!({"response": "hi"})).unwrap();
        assert_eq!(response, ChatResponse::new("hi"));
    }

    #[test]
    fn response_with_thread_id() {
        let response: ChatResponse =
            from_value(json!({"response": "hi", "thread_id": "abc"})).unwrap();
        assert_eq!(response.response, "hi");
        assert_eq!(response.thread_id.as_deref(), Some("abc"));
    }

    #[test]
    fn response_requires_answer() {
        assert!(from_value::<ChatResponse>(json!({"thread_id": "abc"})).is_err());
    }
}
